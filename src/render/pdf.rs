use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Line,
    Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point,
    Polygon, Px, Rgb,
};
use serde::Serialize;
use std::io::{BufWriter, Cursor};

use crate::assets::LoadedImage;
use crate::compose::compose;
use crate::context::{BoxStyle, FontRole, Surface, TextRun};
use crate::error::GenerateError;
use crate::overlap::{DrawnElement, OverlapDiagnostic, Rect};
use crate::schema::{Color, FormSchema};
use crate::stylesheet::ResolvedStylesheet;

const PT_TO_MM: f32 = 0.352_777_78;
const CIRCLE_SEGMENTS: usize = 24;

#[derive(Debug, Serialize)]
pub struct PdfOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub field_count: usize,
    pub page_count: usize,
    pub drawn_elements: Vec<DrawnElement>,
    pub overlaps: Vec<OverlapDiagnostic>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

pub fn generate_pdf(
    schema: &FormSchema,
    style: &ResolvedStylesheet,
) -> Result<PdfOutput, GenerateError> {
    let title = if schema.form.title.trim().is_empty() {
        "Form"
    } else {
        schema.form.title.as_str()
    };
    let surface = PdfSurface::new(title, style)?;
    let composition = compose(surface, schema, style)?;

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(Cursor::new(&mut bytes));
        composition
            .surface
            .doc
            .save(&mut writer)
            .map_err(|e| GenerateError::Serialize(format!("{:?}", e)))?;
    }

    Ok(PdfOutput {
        bytes,
        field_count: composition.field_count,
        page_count: composition.page_count,
        drawn_elements: composition.drawn_elements,
        overlaps: composition.overlaps,
    })
}

// ============================================================================
// FONTS
// ============================================================================

struct Fonts {
    body: IndirectFontRef,
    body_bold: IndirectFontRef,
    heading: IndirectFontRef,
    heading_bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, style: &ResolvedStylesheet) -> Result<Self, GenerateError> {
        let (body, body_bold) = builtin_pair(&style.fonts.body);
        let (heading, heading_bold) = builtin_pair(&style.fonts.heading);
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| GenerateError::Document(format!("font registration failed: {:?}", e)))
        };
        Ok(Fonts {
            body: add(body)?,
            body_bold: add(body_bold)?,
            heading: add(heading)?,
            heading_bold: add(heading_bold)?,
        })
    }

    fn get(&self, role: FontRole, bold: bool) -> &IndirectFontRef {
        match (role, bold) {
            (FontRole::Body, false) => &self.body,
            (FontRole::Body, true) => &self.body_bold,
            (FontRole::Heading, false) => &self.heading,
            (FontRole::Heading, true) => &self.heading_bold,
        }
    }
}

/// Closest builtin (regular, bold) pair for a family name.
fn builtin_pair(family: &str) -> (BuiltinFont, BuiltinFont) {
    let family = family.to_ascii_lowercase();
    if family.contains("times") || (family.contains("serif") && !family.contains("sans")) {
        (BuiltinFont::TimesRoman, BuiltinFont::TimesBold)
    } else if family.contains("courier") || family.contains("mono") {
        (BuiltinFont::Courier, BuiltinFont::CourierBold)
    } else {
        (BuiltinFont::Helvetica, BuiltinFont::HelveticaBold)
    }
}

// ============================================================================
// SURFACE
// ============================================================================

pub struct PdfSurface {
    doc: PdfDocumentReference,
    fonts: Fonts,
    /// The page `PdfDocument::new` creates, handed out by the first
    /// `add_page`.
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
}

impl PdfSurface {
    pub fn new(title: &str, style: &ResolvedStylesheet) -> Result<Self, GenerateError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(style.page_width() * PT_TO_MM),
            Mm(style.page_height() * PT_TO_MM),
            "Layer 1",
        );
        let fonts = Fonts::load(&doc, style)?;
        Ok(PdfSurface { doc, fonts, first_page: Some((page, layer)) })
    }

    fn layer(&self, page: &(PdfPageIndex, PdfLayerIndex)) -> PdfLayerReference {
        self.doc.get_page(page.0).get_layer(page.1)
    }
}

impl Surface for PdfSurface {
    type Page = (PdfPageIndex, PdfLayerIndex);

    fn add_page(&mut self, width: f32, height: f32) -> Result<Self::Page, GenerateError> {
        if let Some(first) = self.first_page.take() {
            return Ok(first);
        }
        Ok(self.doc.add_page(Mm(width * PT_TO_MM), Mm(height * PT_TO_MM), "Layer 1"))
    }

    fn text(&mut self, page: &Self::Page, run: &TextRun) {
        let layer = self.layer(page);
        set_fill_color(&layer, &run.color);
        let font = self.fonts.get(run.role, run.bold);
        layer.use_text(winansi_safe(&run.text), run.size, mm(run.x), mm(run.y), font);
    }

    fn rect(&mut self, page: &Self::Page, rect: Rect, style: &BoxStyle) {
        let points = vec![
            (point(rect.x, rect.y), false),
            (point(rect.right(), rect.y), false),
            (point(rect.right(), rect.top()), false),
            (point(rect.x, rect.top()), false),
        ];
        draw_shape(&self.layer(page), points, style);
    }

    fn circle(&mut self, page: &Self::Page, cx: f32, cy: f32, r: f32, style: &BoxStyle) {
        let points = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
                (point(cx + r * angle.cos(), cy + r * angle.sin()), false)
            })
            .collect();
        draw_shape(&self.layer(page), points, style);
    }

    fn line(
        &mut self,
        page: &Self::Page,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        thickness: f32,
    ) {
        let layer = self.layer(page);
        set_stroke_color(&layer, &color);
        layer.set_outline_thickness(thickness);
        layer.add_line(Line {
            points: vec![(point(from.0, from.1), false), (point(to.0, to.1), false)],
            is_closed: false,
        });
    }

    fn image(&mut self, page: &Self::Page, image: &LoadedImage, rect: Rect) {
        let rgb = image.decoded.to_rgb8();
        let (img_w, img_h) = (rgb.width() as f32, rgb.height() as f32);
        if img_w == 0.0 || img_h == 0.0 {
            return;
        }

        // contain: scale to fit the box, centered
        let scale = (rect.width / img_w).min(rect.height / img_h);
        let (w, h) = (img_w * scale, img_h * scale);
        let x = rect.x + (rect.width - w) / 2.0;
        let y = rect.y + (rect.height - h) / 2.0;

        let xobject = ImageXObject {
            width: Px(rgb.width() as usize),
            height: Px(rgb.height() as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        };

        // 72 dpi makes one pixel one point before scaling.
        Image::from(xobject).add_to_layer(
            self.layer(page),
            ImageTransform {
                translate_x: Some(mm(x)),
                translate_y: Some(mm(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

fn point(x: f32, y: f32) -> Point {
    Point::new(mm(x), mm(y))
}

fn draw_shape(layer: &PdfLayerReference, points: Vec<(Point, bool)>, style: &BoxStyle) {
    if let Some(stroke) = &style.stroke {
        set_stroke_color(layer, stroke);
        layer.set_outline_thickness(style.stroke_width);
    }
    match (&style.fill, &style.stroke) {
        (Some(fill), stroke) => {
            set_fill_color(layer, fill);
            layer.add_polygon(Polygon {
                rings: vec![points],
                mode: if stroke.is_some() { PaintMode::FillStroke } else { PaintMode::Fill },
                winding_order: WindingOrder::NonZero,
            });
        }
        (None, Some(_)) => layer.add_line(Line { points, is_closed: true }),
        (None, None) => {}
    }
}

fn set_fill_color(layer: &PdfLayerReference, color: &Color) {
    let (r, g, b) = color.to_unit();
    layer.set_fill_color(printpdf::Color::Rgb(Rgb::new(r, g, b, None)));
}

fn set_stroke_color(layer: &PdfLayerReference, color: &Color) {
    let (r, g, b) = color.to_unit();
    layer.set_outline_color(printpdf::Color::Rgb(Rgb::new(r, g, b, None)));
}

/// Builtin fonts only cover WinAnsi; anything outside Latin-1 becomes `?`.
fn winansi_safe(text: &str) -> String {
    text.chars().map(|c| if (c as u32) < 0x100 { c } else { '?' }).collect()
}
