//! Absolutely positioned HTML rendering.
//!
//! Pages become fixed-size `<section>`s; every primitive becomes a child
//! positioned from the top-left corner, so canvas y is flipped on the way out.

use base64::Engine;
use serde::Serialize;
use std::fmt::Write as _;

use crate::assets::LoadedImage;
use crate::compose::compose;
use crate::context::{BoxStyle, ControlBox, FontRole, Surface, TextRun, ASCENT_RATIO};
use crate::error::GenerateError;
use crate::fields::FieldKind;
use crate::overlap::{DrawnElement, OverlapDiagnostic, Rect};
use crate::schema::{Color, FormSchema};
use crate::stylesheet::ResolvedStylesheet;

#[derive(Debug, Clone, Serialize)]
pub struct HtmlOutput {
    pub markup: String,
    pub styles: String,
    pub field_count: usize,
    pub page_count: usize,
    pub drawn_elements: Vec<DrawnElement>,
    pub overlaps: Vec<OverlapDiagnostic>,
}

impl HtmlOutput {
    /// A standalone HTML file with the styles inlined.
    pub fn to_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n<style>\n{}</style>\n</head>\n\
             <body>\n{}</body>\n</html>\n",
            escape(title),
            self.styles,
            self.markup
        )
    }
}

pub fn generate_html(
    schema: &FormSchema,
    style: &ResolvedStylesheet,
) -> Result<HtmlOutput, GenerateError> {
    let composition = compose(HtmlSurface::new(style), schema, style)?;
    let surface = composition.surface;

    Ok(HtmlOutput {
        markup: surface.markup(),
        styles: surface.styles(),
        field_count: composition.field_count,
        page_count: composition.page_count,
        drawn_elements: composition.drawn_elements,
        overlaps: composition.overlaps,
    })
}

// ============================================================================
// SURFACE
// ============================================================================

struct HtmlPage {
    width: f32,
    height: f32,
    nodes: Vec<String>,
}

pub struct HtmlSurface {
    pages: Vec<HtmlPage>,
    body_font: String,
    heading_font: String,
}

impl HtmlSurface {
    pub fn new(style: &ResolvedStylesheet) -> Self {
        HtmlSurface {
            pages: Vec::new(),
            body_font: style.fonts.body.clone(),
            heading_font: style.fonts.heading.clone(),
        }
    }

    fn push(&mut self, page: usize, node: String) {
        if let Some(p) = self.pages.get_mut(page) {
            p.nodes.push(node);
        }
    }

    fn height(&self, page: usize) -> f32 {
        self.pages.get(page).map(|p| p.height).unwrap_or(0.0)
    }

    /// CSS `top` for a canvas y that marks the top edge of something.
    fn top(&self, page: usize, y_top: f32) -> f32 {
        self.height(page) - y_top
    }

    fn boxed(&self, page: usize, rect: Rect) -> String {
        format!(
            "left:{:.2}pt;top:{:.2}pt;width:{:.2}pt;height:{:.2}pt;",
            rect.x,
            self.top(page, rect.top()),
            rect.width,
            rect.height
        )
    }

    pub fn markup(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            let _ = writeln!(
                out,
                "<section class=\"ink-page\" data-page=\"{}\" \
                 style=\"width:{:.2}pt;height:{:.2}pt;\">",
                i + 1,
                page.width,
                page.height
            );
            for node in &page.nodes {
                out.push_str(node);
                out.push('\n');
            }
            out.push_str("</section>\n");
        }
        out
    }

    pub fn styles(&self) -> String {
        format!(
            ".ink-page {{ position: relative; overflow: hidden; margin: 0 auto 24pt; \
             background: #FFFFFF; box-shadow: 0 0 4pt rgba(0,0,0,0.2); font-family: {body}; }}\n\
             .ink-page > * {{ position: absolute; box-sizing: border-box; margin: 0; }}\n\
             .ink-text {{ white-space: pre; line-height: 1; }}\n\
             .ink-heading {{ font-family: {heading}; }}\n\
             .ink-line {{ transform-origin: 0 50%; }}\n\
             .ink-control {{ font-family: {body}; font-size: 10pt; padding: 0 4pt; \
             border: 0.75pt solid #999999; }}\n\
             @media print {{ .ink-page {{ box-shadow: none; margin: 0; \
             page-break-after: always; }} }}\n",
            body = css_font(&self.body_font),
            heading = css_font(&self.heading_font),
        )
    }
}

impl Surface for HtmlSurface {
    type Page = usize;

    fn add_page(&mut self, width: f32, height: f32) -> Result<usize, GenerateError> {
        self.pages.push(HtmlPage { width, height, nodes: Vec::new() });
        Ok(self.pages.len() - 1)
    }

    fn text(&mut self, page: &usize, run: &TextRun) {
        let class = match run.role {
            FontRole::Body => "ink-text",
            FontRole::Heading => "ink-text ink-heading",
        };
        let node = format!(
            "<div class=\"{}\" style=\"left:{:.2}pt;top:{:.2}pt;\
             font-size:{:.2}pt;font-weight:{};color:{};\">{}</div>",
            class,
            run.x,
            self.top(*page, run.y + run.size * ASCENT_RATIO),
            run.size,
            if run.bold { "bold" } else { "normal" },
            run.color.to_hex(),
            escape(&run.text)
        );
        self.push(*page, node);
    }

    fn rect(&mut self, page: &usize, rect: Rect, style: &BoxStyle) {
        let node = format!("<div style=\"{}{}\"></div>", self.boxed(*page, rect), box_css(style));
        self.push(*page, node);
    }

    fn circle(&mut self, page: &usize, cx: f32, cy: f32, r: f32, style: &BoxStyle) {
        let rect = Rect::new(cx - r, cy - r, r * 2.0, r * 2.0);
        let node = format!(
            "<div style=\"{}{}border-radius:50%;\"></div>",
            self.boxed(*page, rect),
            box_css(style)
        );
        self.push(*page, node);
    }

    fn line(
        &mut self,
        page: &usize,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        thickness: f32,
    ) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        // canvas y grows up, CSS rotation is clockwise
        let angle = (-dy).atan2(dx).to_degrees();
        let node = format!(
            "<div class=\"ink-line\" style=\"left:{:.2}pt;top:{:.2}pt;\
             width:{:.2}pt;height:{:.2}pt;background:{};transform:rotate({:.2}deg);\"></div>",
            from.0,
            self.top(*page, from.1) - thickness / 2.0,
            length,
            thickness,
            color.to_hex(),
            angle
        );
        self.push(*page, node);
    }

    fn image(&mut self, page: &usize, image: &LoadedImage, rect: Rect) {
        let node = format!(
            "<img src=\"data:{};base64,{}\" style=\"{}object-fit:contain;\" alt=\"\">",
            image.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&image.data),
            self.boxed(*page, rect)
        );
        self.push(*page, node);
    }

    fn form_control(&mut self, page: &usize, control: &ControlBox<'_>) -> bool {
        let field = control.field;
        let at = self.boxed(*page, control.rect);
        let name = escape(&field.id);
        let required = if field.required { " required" } else { "" };
        let placeholder = field
            .placeholder
            .as_deref()
            .map(|p| format!(" placeholder=\"{}\"", escape(p)))
            .unwrap_or_default();
        let value = field
            .default_value
            .as_deref()
            .map(|v| format!(" value=\"{}\"", escape(v)))
            .unwrap_or_default();

        let node = match field.kind {
            FieldKind::Text | FieldKind::Date => {
                let kind = if field.kind == FieldKind::Date { "date" } else { "text" };
                format!(
                    "<input class=\"ink-control\" type=\"{}\" id=\"{}\" name=\"{}\" \
                     style=\"{}\"{}{}{}>",
                    kind, name, name, at, placeholder, value, required
                )
            }
            FieldKind::Textarea => format!(
                "<textarea class=\"ink-control\" id=\"{}\" name=\"{}\" \
                 style=\"{}\"{}{}>{}</textarea>",
                name,
                name,
                at,
                placeholder,
                required,
                escape(field.default_value.as_deref().unwrap_or(""))
            ),
            FieldKind::Dropdown => {
                let mut options = String::new();
                for option in &field.options {
                    let is_default = field.default_value.as_deref() == Some(option.as_str());
                    let selected = if is_default { " selected" } else { "" };
                    let _ = write!(options, "<option{}>{}</option>", selected, escape(option));
                }
                format!(
                    "<select class=\"ink-control\" id=\"{}\" name=\"{}\" \
                     style=\"{}\"{}>{}</select>",
                    name, name, at, required, options
                )
            }
            FieldKind::Checkbox => {
                let checked = matches!(
                    field.default_value.as_deref(),
                    Some("true") | Some("yes") | Some("checked")
                );
                format!(
                    "<input type=\"checkbox\" id=\"{}\" name=\"{}\" style=\"{}\"{}{}>",
                    name,
                    name,
                    at,
                    if checked { " checked" } else { "" },
                    required
                )
            }
            FieldKind::Radio => {
                let Some(option) = control.option else {
                    return false;
                };
                let checked = field.default_value.as_deref() == Some(option);
                format!(
                    "<input type=\"radio\" name=\"{}\" value=\"{}\" style=\"{}\"{}{}>",
                    name,
                    escape(option),
                    at,
                    if checked { " checked" } else { "" },
                    required
                )
            }
            FieldKind::Signature => return false,
        };
        self.push(*page, node);
        true
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn box_css(style: &BoxStyle) -> String {
    let mut css = String::new();
    if let Some(fill) = &style.fill {
        let _ = write!(css, "background:{};", fill.to_hex());
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(css, "border:{:.2}pt solid {};", style.stroke_width, stroke.to_hex());
    }
    css
}

fn css_font(family: &str) -> String {
    let generic = match family.to_ascii_lowercase() {
        f if f.contains("courier") || f.contains("mono") => "monospace",
        f if f.contains("times") || (f.contains("serif") && !f.contains("sans")) => "serif",
        _ => "sans-serif",
    };
    format!("'{}', {}", family.replace('\'', ""), generic)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
