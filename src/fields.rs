//! Field normalization and the leaf drawers for canvas surfaces.
//!
//! `position.y` is the top edge of a field's input box; the label sits just
//! above it (checkboxes carry it to the right instead).

use log::{debug, warn};
use serde::Serialize;

use crate::context::{BoxStyle, ControlBox, FontRole, LayoutContext, Surface, TextRun};
use crate::overlap::Rect;
use crate::placement::{Placed, Placement};
use crate::schema::FormField;
use crate::text::{estimate_width, wrap_text};

/// Gap between a label's baseline and the top of its box.
pub const LABEL_GAP: f32 = 4.0;
const CHECKBOX_SIZE: f32 = 12.0;
const RADIO_ROW: f32 = 16.0;
const RADIO_RADIUS: f32 = 5.0;
const INNER_PAD: f32 = 4.0;

// ============================================================================
// FIELD KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Checkbox,
    Radio,
    Dropdown,
    Signature,
    Date,
}

impl FieldKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "text" | "email" | "number" | "phone" | "tel" => Some(FieldKind::Text),
            "textarea" | "multiline" => Some(FieldKind::Textarea),
            "checkbox" => Some(FieldKind::Checkbox),
            "radio" => Some(FieldKind::Radio),
            "dropdown" | "select" => Some(FieldKind::Dropdown),
            "signature" => Some(FieldKind::Signature),
            "date" => Some(FieldKind::Date),
            _ => None,
        }
    }

    /// Default (width, height) of the input box.
    fn default_size(&self, options: usize) -> (f32, f32) {
        match self {
            FieldKind::Text => (200.0, 20.0),
            FieldKind::Textarea => (300.0, 60.0),
            FieldKind::Checkbox => (CHECKBOX_SIZE, CHECKBOX_SIZE),
            FieldKind::Radio => (150.0, RADIO_ROW * options.max(1) as f32),
            FieldKind::Dropdown => (150.0, 20.0),
            FieldKind::Signature => (200.0, 30.0),
            FieldKind::Date => (100.0, 20.0),
        }
    }
}

// ============================================================================
// NORMALIZED FIELD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFormField {
    pub id: String,
    pub kind: FieldKind,
    pub label: String,
    /// 1-based logical page.
    pub page: u32,
    pub x: f32,
    pub placement: Placement,
    pub width: f32,
    pub height: f32,
    pub options: Vec<String>,
    pub required: bool,
    pub placeholder: Option<String>,
    pub default_value: Option<String>,
}

impl Placed for NormalizedFormField {
    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }
}

impl NormalizedFormField {
    pub fn from_schema(field: &FormField, index: usize) -> Option<Self> {
        let Some(kind) = FieldKind::parse(&field.kind) else {
            warn!("Skipping field '{}': unknown field type '{}'", field.label, field.kind);
            return None;
        };

        let (default_w, default_h) = kind.default_size(field.options.len());
        let height = match kind {
            FieldKind::Checkbox | FieldKind::Radio => default_h,
            _ => field.height.filter(|h| *h > 0.0).unwrap_or(default_h),
        };
        let id = if field.id.trim().is_empty() {
            format!("field_{}", index + 1)
        } else {
            field.id.clone()
        };

        Some(NormalizedFormField {
            id,
            kind,
            label: field.label.clone(),
            page: field.page.max(1),
            x: field.position.x,
            placement: Placement::for_page(field.page, field.position.y),
            width: field.width.filter(|w| *w > 0.0).unwrap_or(default_w),
            height,
            options: field.options.clone(),
            required: field.required,
            placeholder: field.placeholder.clone(),
            default_value: field.default_value.clone(),
        })
    }

    /// Label text with a required marker.
    pub fn display_label(&self) -> String {
        if self.required && !self.label.is_empty() {
            format!("{} *", self.label)
        } else {
            self.label.clone()
        }
    }

    /// Top edge of the input box. Relative placements read as 0 until
    /// adjusted against the baseline.
    pub fn top(&self) -> f32 {
        self.placement.resolve(0.0)
    }

    /// The input box itself.
    pub fn box_rect(&self) -> Rect {
        Rect::new(self.x, self.top() - self.height, self.width, self.height)
    }

    /// Everything the field occupies, label included.
    pub fn extent(&self, label_size: f32) -> Rect {
        let label = self.display_label();
        let label_w = estimate_width(&label, label_size);
        let b = self.box_rect();
        match self.kind {
            FieldKind::Checkbox => {
                let width = if label.is_empty() { b.width } else { b.width + 6.0 + label_w };
                Rect::new(b.x, b.y, width, b.height)
            }
            FieldKind::Radio => {
                let longest = self
                    .options
                    .iter()
                    .map(|o| estimate_width(o, label_size))
                    .fold(0.0, f32::max);
                let width = b.width.max(RADIO_RADIUS * 2.0 + 4.0 + longest).max(label_w);
                let label_h = if label.is_empty() { 0.0 } else { LABEL_GAP + label_size };
                Rect::new(b.x, b.y, width, b.height + label_h)
            }
            _ => {
                let label_h = if label.is_empty() { 0.0 } else { LABEL_GAP + label_size };
                Rect::new(b.x, b.y, b.width.max(label_w), b.height + label_h)
            }
        }
    }
}

/// Normalize schema fields, dropping (and logging) unknown types.
pub fn normalize_fields(fields: &[FormField]) -> Vec<NormalizedFormField> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(i, f)| NormalizedFormField::from_schema(f, i))
        .collect()
}

/// Fields grouped by logical page and ordered top-to-bottom, then
/// left-to-right, for flow backends.
pub fn reading_order(fields: &[NormalizedFormField]) -> Vec<&NormalizedFormField> {
    let mut ordered: Vec<&NormalizedFormField> = fields.iter().collect();
    ordered.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(b.top().total_cmp(&a.top()))
            .then(a.x.total_cmp(&b.x))
    });
    ordered
}

// ============================================================================
// LEAF DRAWERS
// ============================================================================

/// Draw one positioned field onto the physical page its logical page maps to.
pub fn draw_field<S: Surface>(ctx: &mut LayoutContext<'_, S>, field: &NormalizedFormField) {
    if field.placement.is_relative() {
        debug!("Field '{}' drawn before baseline adjustment", field.id);
    }
    let page = ctx.page_map().physical_index(field.page, ctx.page_count());
    let style = ctx.style();
    let label_size = style.font_sizes.label;
    let border = BoxStyle::stroked(style.colors.border, 0.75);
    let b = field.box_rect();
    let label = field.display_label();

    let label_run = |text: String, x: f32, y: f32| TextRun {
        text,
        x,
        y,
        size: label_size,
        bold: false,
        role: FontRole::Body,
        color: style.colors.text,
    };
    let hint_run = |text: String, x: f32, y: f32, muted: bool| TextRun {
        text,
        x,
        y,
        size: style.font_sizes.body,
        bold: false,
        role: FontRole::Body,
        color: if muted { style.colors.muted } else { style.colors.text },
    };

    if field.kind != FieldKind::Checkbox && !label.is_empty() {
        ctx.paint_text(page, &label_run(label.clone(), b.x, b.top() + LABEL_GAP));
    }

    let control = ControlBox { field, rect: b, option: None };

    match field.kind {
        FieldKind::Text | FieldKind::Date | FieldKind::Dropdown => {
            if !ctx.paint_control(page, &control) {
                ctx.paint_rect(page, b, &border);
                let body = style.font_sizes.body;
                let baseline = b.y + (b.height - body) / 2.0 + body * 0.2;
                let fallback = match field.kind {
                    FieldKind::Date => Some("YYYY-MM-DD".to_string()),
                    FieldKind::Dropdown => field.options.first().cloned(),
                    _ => field.placeholder.clone(),
                };
                let hint = field.default_value.clone().or(fallback);
                if let Some(hint) = hint {
                    let muted = field.default_value.is_none();
                    ctx.paint_text(page, &hint_run(hint, b.x + INNER_PAD, baseline, muted));
                }
                if field.kind == FieldKind::Dropdown {
                    // chevron
                    let cx = b.right() - 10.0;
                    let cy = b.y + b.height / 2.0;
                    let ink = style.colors.border;
                    ctx.paint_line(page, (cx - 4.0, cy + 2.0), (cx, cy - 2.0), ink, 0.75);
                    ctx.paint_line(page, (cx, cy - 2.0), (cx + 4.0, cy + 2.0), ink, 0.75);
                }
            }
        }
        FieldKind::Textarea => {
            if !ctx.paint_control(page, &control) {
                ctx.paint_rect(page, b, &border);
                let text = field.default_value.clone().or_else(|| field.placeholder.clone());
                if let Some(text) = text {
                    let size = style.font_sizes.body;
                    let line_h = style.line_height_for(size);
                    let muted = field.default_value.is_none();
                    let mut y = b.top() - INNER_PAD - size * 0.8;
                    for line in wrap_text(&text, b.width - 2.0 * INNER_PAD, size) {
                        if y < b.y {
                            break;
                        }
                        ctx.paint_text(page, &hint_run(line, b.x + INNER_PAD, y, muted));
                        y -= line_h;
                    }
                }
            }
        }
        FieldKind::Checkbox => {
            if !ctx.paint_control(page, &control) {
                ctx.paint_rect(page, b, &border);
                let value = field.default_value.as_deref();
                if matches!(value, Some("true") | Some("yes") | Some("checked")) {
                    let (x, y, ink) = (b.x, b.y, style.colors.text);
                    ctx.paint_line(page, (x + 2.0, y + 6.0), (x + 5.0, y + 2.0), ink, 1.0);
                    ctx.paint_line(page, (x + 5.0, y + 2.0), (x + 10.0, y + 10.0), ink, 1.0);
                }
            }
            if !label.is_empty() {
                ctx.paint_text(page, &label_run(label.clone(), b.right() + 6.0, b.y + 2.0));
            }
        }
        FieldKind::Radio => {
            for (i, option) in field.options.iter().enumerate() {
                let row_top = b.top() - i as f32 * RADIO_ROW;
                let cy = row_top - RADIO_ROW / 2.0;
                let cx = b.x + RADIO_RADIUS;
                let diameter = RADIO_RADIUS * 2.0;
                let rect = Rect::new(b.x, cy - RADIO_RADIUS, diameter, diameter);
                let control = ControlBox { field, rect, option: Some(option.as_str()) };
                if !ctx.paint_control(page, &control) {
                    ctx.paint_circle(page, cx, cy, RADIO_RADIUS, &border);
                    if field.default_value.as_deref() == Some(option.as_str()) {
                        ctx.paint_circle(page, cx, cy, 2.5, &BoxStyle::filled(style.colors.text));
                    }
                }
                let (text_x, text_y) = (cx + RADIO_RADIUS + 4.0, cy - label_size * 0.3);
                ctx.paint_text(page, &label_run(option.clone(), text_x, text_y));
            }
        }
        FieldKind::Signature => {
            ctx.paint_line(page, (b.x, b.y), (b.right(), b.y), style.colors.text, 0.75);
            ctx.paint_text(page, &hint_run("X".to_string(), b.x + 2.0, b.y + 4.0, true));
        }
    }

    ctx.record(page, field.extent(label_size), &format!("field:{}", field.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context;
    use crate::placement::adjust_field_positions;
    use crate::schema::Point;
    use crate::stylesheet::ResolvedStylesheet;

    fn field(kind: &str, page: u32, x: f32, y: f32) -> FormField {
        FormField {
            kind: kind.to_string(),
            label: format!("{} field", kind),
            page,
            position: Point { x, y },
            ..Default::default()
        }
    }

    #[test]
    fn unknown_types_are_skipped() {
        let fields = vec![
            field("text", 1, 50.0, -20.0),
            field("hologram", 1, 50.0, -60.0),
            field("select", 2, 50.0, 500.0),
        ];
        let normalized = normalize_fields(&fields);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].kind, FieldKind::Text);
        assert_eq!(normalized[1].kind, FieldKind::Dropdown);
        assert_eq!(normalized[0].id, "field_1");
        assert_eq!(normalized[1].id, "field_3");
    }

    #[test]
    fn placement_tagged_at_ingestion() {
        let normalized =
            normalize_fields(&[field("text", 1, 50.0, -50.0), field("text", 2, 50.0, 640.0)]);
        assert_eq!(normalized[0].placement, Placement::Relative(-50.0));
        assert_eq!(normalized[1].placement, Placement::Absolute(640.0));
    }

    #[test]
    fn geometry_uses_defaults_and_overrides() {
        let mut raw = field("textarea", 2, 60.0, 500.0);
        raw.width = Some(250.0);
        let f = NormalizedFormField::from_schema(&raw, 0).unwrap();
        assert_eq!(f.box_rect(), Rect::new(60.0, 440.0, 250.0, 60.0));

        let mut radio = field("radio", 2, 60.0, 500.0);
        radio.options = vec!["A".into(), "B".into(), "C".into()];
        radio.height = Some(5.0);
        let f = NormalizedFormField::from_schema(&radio, 0).unwrap();
        assert_eq!(f.height, 48.0);
    }

    #[test]
    fn reading_order_is_page_then_top_down() {
        let normalized = normalize_fields(&[
            field("text", 2, 50.0, 600.0),
            field("text", 2, 300.0, 700.0),
            field("text", 2, 50.0, 700.0),
            field("date", 3, 50.0, 700.0),
        ]);
        let order: Vec<(u32, f32, f32)> = reading_order(&normalized)
            .iter()
            .map(|f| (f.page, f.x, f.top()))
            .collect();
        assert_eq!(
            order,
            vec![(2, 50.0, 700.0), (2, 300.0, 700.0), (2, 50.0, 600.0), (3, 50.0, 700.0)]
        );
    }

    #[test]
    fn drawn_fields_land_on_mapped_pages() {
        let style = ResolvedStylesheet::default();
        let mut ctx = context(&style, 2, true);
        let mut fields = normalize_fields(&[
            field("text", 1, 50.0, -50.0),
            field("checkbox", 2, 50.0, 600.0),
            field("signature", 99, 50.0, 200.0),
        ]);
        adjust_field_positions(&mut fields, 700.0);
        for f in &fields {
            draw_field(&mut ctx, f);
        }

        let elements = ctx.elements();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].page, 1);
        assert_eq!(elements[0].y, 630.0);
        assert_eq!(elements[1].page, 2);
        assert_eq!(elements[2].page, 2);
    }
}
