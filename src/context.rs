//! The mutable flow state for one generation run.
//!
//! A `LayoutContext` owns the backend surface, the physical page handles, the
//! cursor, and the geometry recorded for overlap diagnostics. It is created
//! per call and threaded through every drawing step by `&mut`.

use log::debug;

use crate::assets::LoadedImage;
use crate::error::GenerateError;
use crate::fields::NormalizedFormField;
use crate::footer::{ResolvedFooter, ResolvedHeader};
use crate::overlap::{DrawnElement, Rect};
use crate::pagination::PageMap;
use crate::schema::Color;
use crate::stylesheet::ResolvedStylesheet;
use crate::text::estimate_width;

/// Header text baseline sits this far above the top margin.
pub const HEADER_OFFSET: f32 = 20.0;
/// Footer text baseline sits this far below the bottom margin.
pub const FOOTER_OFFSET: f32 = 20.0;
/// Footer separator sits this far below the bottom margin.
pub const SEPARATOR_OFFSET: f32 = 8.0;
/// Social links row sits this far below the bottom margin.
pub const SOCIAL_OFFSET: f32 = 32.0;

/// Share of the font size above the baseline.
pub const ASCENT_RATIO: f32 = 0.8;

// ============================================================================
// SURFACE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontRole {
    #[default]
    Body,
    Heading,
}

/// One line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
    pub role: FontRole,
    pub color: Color,
}

impl TextRun {
    /// Box occupied by the run: ascent above the baseline, the remainder below.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y - self.size * (1.0 - ASCENT_RATIO),
            estimate_width(&self.text, self.size),
            self.size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

impl BoxStyle {
    pub fn stroked(color: Color, width: f32) -> Self {
        BoxStyle { fill: None, stroke: Some(color), stroke_width: width }
    }

    pub fn filled(color: Color) -> Self {
        BoxStyle { fill: Some(color), stroke: None, stroke_width: 0.0 }
    }
}

/// A control box handed to surfaces that can render native form controls.
#[derive(Debug, Clone, Copy)]
pub struct ControlBox<'f> {
    pub field: &'f NormalizedFormField,
    pub rect: Rect,
    /// For radio groups: the option this box stands for.
    pub option: Option<&'f str>,
}

/// Backend drawing primitives. Coordinates are points from the bottom-left
/// corner of the page.
pub trait Surface {
    type Page: Clone;

    fn add_page(&mut self, width: f32, height: f32) -> Result<Self::Page, GenerateError>;

    fn text(&mut self, page: &Self::Page, run: &TextRun);

    fn rect(&mut self, page: &Self::Page, rect: Rect, style: &BoxStyle);

    fn circle(&mut self, page: &Self::Page, cx: f32, cy: f32, r: f32, style: &BoxStyle);

    fn line(
        &mut self,
        page: &Self::Page,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        thickness: f32,
    );

    fn image(&mut self, page: &Self::Page, image: &LoadedImage, rect: Rect);

    /// Render a native control in place of the drawn box. Returns `false`
    /// when the surface has no native equivalent.
    fn form_control(&mut self, _page: &Self::Page, _control: &ControlBox<'_>) -> bool {
        false
    }
}

// ============================================================================
// CURSOR + CONTEXT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Physical page index.
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

pub struct LayoutContext<'a, S: Surface> {
    surface: S,
    style: &'a ResolvedStylesheet,
    page_map: PageMap,
    pages: Vec<S::Page>,
    cursor: Cursor,
    elements: Vec<DrawnElement>,
    /// Where header/footer records go in `elements`.
    decoration_slot: usize,
    baseline: Option<f32>,
}

impl<'a, S: Surface> LayoutContext<'a, S> {
    /// Allocate every physical page up front and park the cursor at the top
    /// margin of page 0.
    pub fn new(
        mut surface: S,
        style: &'a ResolvedStylesheet,
        page_map: PageMap,
    ) -> Result<Self, GenerateError> {
        let mut pages = Vec::with_capacity(page_map.physical_count());
        for _ in 0..page_map.physical_count() {
            pages.push(surface.add_page(style.page_width(), style.page_height())?);
        }

        Ok(LayoutContext {
            surface,
            style,
            page_map,
            pages,
            cursor: Cursor { page: 0, x: style.margins.left, y: style.content_top() },
            elements: Vec::new(),
            decoration_slot: 0,
            baseline: None,
        })
    }

    pub fn style(&self) -> &'a ResolvedStylesheet {
        self.style
    }

    pub fn page_map(&self) -> PageMap {
        self.page_map
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn elements(&self) -> &[DrawnElement] {
        &self.elements
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    /// Page handle for a physical index, clamped to the last page.
    pub fn page(&self, index: usize) -> &S::Page {
        &self.pages[index.min(self.pages.len() - 1)]
    }

    fn on_cover(&self) -> bool {
        self.page_map.has_cover() && self.cursor.page == 0
    }

    /// Put the cursor at the top margin of `index`.
    pub fn move_to_page(&mut self, index: usize) {
        self.cursor = Cursor {
            page: index.min(self.pages.len() - 1),
            x: self.style.margins.left,
            y: self.style.content_top(),
        };
    }

    /// Move to the next physical page, appending one when the cursor is on
    /// the last page.
    pub fn advance_page(&mut self) -> Result<(), GenerateError> {
        let next = self.cursor.page + 1;
        if next >= self.pages.len() {
            let page = self.surface.add_page(self.style.page_width(), self.style.page_height())?;
            self.pages.push(page);
            debug!("Appended physical page {}", next);
        }
        self.move_to_page(next);
        Ok(())
    }

    /// Advance to a fresh page when `height` no longer fits above the bottom
    /// margin. The cover page never flows onto the next page.
    pub fn ensure_space(&mut self, height: f32) -> Result<(), GenerateError> {
        let at_top = self.cursor.y >= self.style.content_top();
        if self.cursor.y - height >= self.style.margins.bottom || at_top {
            return Ok(());
        }
        if self.on_cover() {
            debug!("Cover page content overflows the bottom margin");
            return Ok(());
        }
        self.advance_page()
    }

    /// Move the cursor down by `dy`.
    pub fn advance(&mut self, dy: f32) {
        self.cursor.y -= dy;
    }

    /// Record the current cursor y as the content baseline.
    pub fn mark_baseline(&mut self) -> f32 {
        let y = self.cursor.y;
        if self.cursor.page != self.page_map.first_content_page() {
            debug!(
                "Content ended on physical page {}, baseline {} still applies to logical page 1",
                self.cursor.page, y
            );
        }
        self.baseline = Some(y);
        y
    }

    pub fn record(&mut self, page: usize, rect: Rect, label: &str) {
        self.elements.push(DrawnElement {
            page,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            label: label.to_string(),
        });
    }

    // --- Paint only (callers record the block they belong to) ---

    pub fn paint_text(&mut self, page: usize, run: &TextRun) {
        let handle = self.page(page).clone();
        self.surface.text(&handle, run);
    }

    pub fn paint_rect(&mut self, page: usize, rect: Rect, style: &BoxStyle) {
        let handle = self.page(page).clone();
        self.surface.rect(&handle, rect, style);
    }

    pub fn paint_circle(&mut self, page: usize, cx: f32, cy: f32, r: f32, style: &BoxStyle) {
        let handle = self.page(page).clone();
        self.surface.circle(&handle, cx, cy, r, style);
    }

    pub fn paint_line(
        &mut self,
        page: usize,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        thickness: f32,
    ) {
        let handle = self.page(page).clone();
        self.surface.line(&handle, from, to, color, thickness);
    }

    pub fn paint_control(&mut self, page: usize, control: &ControlBox<'_>) -> bool {
        let handle = self.page(page).clone();
        self.surface.form_control(&handle, control)
    }

    // --- Paint and record ---

    pub fn draw_text(&mut self, page: usize, run: &TextRun, label: &str) {
        self.paint_text(page, run);
        self.record(page, run.bounds(), label);
    }

    pub fn draw_image(&mut self, page: usize, image: &LoadedImage, rect: Rect, label: &str) {
        let handle = self.page(page).clone();
        self.surface.image(&handle, image, rect);
        self.record(page, rect, label);
    }

    // --- Page decorations ---

    /// Header/footer records drawn later are listed from this point, after
    /// everything recorded so far.
    pub fn mark_decoration_slot(&mut self) {
        self.decoration_slot = self.elements.len();
    }

    /// Draw header and footer on every decorated page. Painting happens now,
    /// once the final page count is known; the records are moved back to the
    /// marked slot so `elements` reads cover, decorations, content, fields.
    pub fn draw_decorations(&mut self, header: &ResolvedHeader, footer: &ResolvedFooter) {
        let start = self.elements.len();
        self.draw_header(header);
        self.draw_footer(footer);
        let added = self.elements.len() - start;
        let slot = self.decoration_slot.min(start);
        self.elements[slot..].rotate_right(added);
    }

    /// Draw the header on every decorated page.
    pub fn draw_header(&mut self, header: &ResolvedHeader) {
        if !header.enabled {
            return;
        }
        let y = self.style.page_height() - self.style.margins.top + HEADER_OFFSET;
        let total = self.page_map.display_total(self.pages.len());

        for page in self.decorated_pages() {
            let number = self.page_map.display_number(page).unwrap_or(0);
            let (left, center, right) = header.for_page(number, total);
            self.draw_band(page, y, [left, center, right], "header");
        }
    }

    /// Draw the footer, its separator, and social links on every decorated
    /// page.
    pub fn draw_footer(&mut self, footer: &ResolvedFooter) {
        if !footer.enabled {
            return;
        }
        let style = self.style;
        let y = style.margins.bottom - FOOTER_OFFSET;
        let total = self.page_map.display_total(self.pages.len());
        let social = footer
            .social_links
            .iter()
            .map(|link| link.display())
            .collect::<Vec<_>>()
            .join("  |  ");

        for page in self.decorated_pages() {
            if footer.separator.enabled {
                let sep_y = style.margins.bottom - SEPARATOR_OFFSET;
                let x1 = style.margins.left;
                let x2 = style.page_width() - style.margins.right;
                let thickness = footer.separator.thickness;
                self.paint_line(page, (x1, sep_y), (x2, sep_y), footer.separator.color, thickness);
                self.record(
                    page,
                    Rect::new(x1, sep_y - thickness / 2.0, x2 - x1, thickness),
                    "footer-separator",
                );
            }

            let number = self.page_map.display_number(page).unwrap_or(0);
            let (left, center, right) = footer.for_page(number, total);
            self.draw_band(page, y, [left, center, right], "footer");

            if !social.is_empty() {
                let size = style.font_sizes.small;
                let run = TextRun {
                    x: (style.page_width() - estimate_width(&social, size)) / 2.0,
                    y: style.margins.bottom - SOCIAL_OFFSET,
                    text: social.clone(),
                    size,
                    bold: false,
                    role: FontRole::Body,
                    color: style.colors.muted,
                };
                self.draw_text(page, &run, "footer-social");
            }
        }
    }

    fn decorated_pages(&self) -> Vec<usize> {
        (0..self.pages.len()).filter(|p| self.page_map.is_decorated(*p)).collect()
    }

    /// Left/center/right aligned band of small text at baseline `y`.
    fn draw_band(&mut self, page: usize, y: f32, [left, center, right]: [String; 3], prefix: &str) {
        let style = self.style;
        let size = style.font_sizes.small;
        let page_width = style.page_width();

        let slots = [
            (left, "left"),
            (center, "center"),
            (right, "right"),
        ];
        for (text, slot) in slots {
            if text.is_empty() {
                continue;
            }
            let width = estimate_width(&text, size);
            let x = match slot {
                "left" => style.margins.left,
                "center" => (page_width - width) / 2.0,
                _ => page_width - style.margins.right - width,
            };
            let run = TextRun {
                text,
                x,
                y,
                size,
                bold: false,
                role: FontRole::Body,
                color: style.colors.muted,
            };
            self.draw_text(page, &run, &format!("{}-{}", prefix, slot));
        }
    }

    /// Hand back the surface, the page handles, and the recorded geometry.
    pub fn finish(self) -> (S, Vec<S::Page>, Vec<DrawnElement>) {
        (self.surface, self.pages, self.elements)
    }
}
