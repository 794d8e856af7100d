//! Fixed-order composition for canvas surfaces.
//!
//! cover → header/footer → title → content → baseline → field adjustment →
//! fields → overlap detection. Header and footer are painted once content has
//! settled the page count, but their records keep their place after the
//! cover.

use log::{debug, info};

use crate::content::{draw_blocks, draw_cover, draw_title};
use crate::context::{LayoutContext, Surface};
use crate::error::GenerateError;
use crate::fields::{draw_field, normalize_fields};
use crate::footer::{resolve_footer_config, resolve_header_config};
use crate::overlap::{detect_overlaps, DrawnElement, OverlapDiagnostic};
use crate::pagination::PageMap;
use crate::placement::adjust_field_positions;
use crate::schema::FormSchema;
use crate::stylesheet::ResolvedStylesheet;

/// A finished surface plus everything learned while drawing on it.
pub struct Composition<S: Surface> {
    pub surface: S,
    pub pages: Vec<S::Page>,
    pub drawn_elements: Vec<DrawnElement>,
    pub overlaps: Vec<OverlapDiagnostic>,
    pub field_count: usize,
    pub page_count: usize,
    pub baseline: f32,
}

pub fn compose<S: Surface>(
    surface: S,
    schema: &FormSchema,
    style: &ResolvedStylesheet,
) -> Result<Composition<S>, GenerateError> {
    let page_map = PageMap::new(schema.declared_page_count(), schema.has_cover_page());
    debug!(
        "Composing '{}': {} declared page(s), cover: {}",
        schema.form.title,
        page_map.declared(),
        page_map.has_cover()
    );

    let mut ctx = LayoutContext::new(surface, style, page_map)?;

    if let Some(cover) = &schema.cover_page {
        draw_cover(&mut ctx, cover, &schema.form)?;
    }
    ctx.mark_decoration_slot();

    ctx.move_to_page(page_map.first_content_page());
    draw_title(&mut ctx, &schema.form)?;
    draw_blocks(&mut ctx, &schema.content)?;
    let baseline = ctx.mark_baseline();

    let mut fields = normalize_fields(&schema.fields);
    adjust_field_positions(&mut fields, baseline);
    for field in &fields {
        draw_field(&mut ctx, field);
    }

    ctx.draw_decorations(
        &resolve_header_config(schema.header.as_ref(), &schema.form),
        &resolve_footer_config(schema.footer.as_ref(), &schema.form),
    );

    let page_count = ctx.page_count();
    let (surface, pages, drawn_elements) = ctx.finish();
    let overlaps = detect_overlaps(&drawn_elements);

    info!(
        "Composed '{}': {} page(s), {} field(s), {} element(s), {} overlap(s)",
        schema.form.title,
        page_count,
        fields.len(),
        drawn_elements.len(),
        overlaps.len()
    );

    Ok(Composition {
        surface,
        pages,
        drawn_elements,
        overlaps,
        field_count: fields.len(),
        page_count,
        baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::RecordingSurface;

    fn schema(json: serde_json::Value) -> FormSchema {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn fields_follow_the_baseline() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake" },
            "fields": [
                { "id": "name", "type": "text", "label": "Name", "position": { "x": 50, "y": -40 } }
            ]
        }));
        let style = ResolvedStylesheet::default();
        let out = compose(RecordingSurface::default(), &s, &style).unwrap();

        let field = out.drawn_elements.iter().find(|e| e.label == "field:name").unwrap();
        assert!((field.y + 20.0 - (out.baseline - 40.0)).abs() < 1e-3);
        assert_eq!(out.field_count, 1);
        assert!(out.overlaps.is_empty());
    }

    #[test]
    fn cover_adds_a_leading_page() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "pages": 2 },
            "coverPage": { "title": "Welcome" },
            "fields": [
                {
                    "id": "late", "type": "checkbox", "label": "Agree", "page": 2,
                    "position": { "x": 60, "y": 500 }
                }
            ]
        }));
        let style = ResolvedStylesheet::default();
        let out = compose(RecordingSurface::default(), &s, &style).unwrap();

        assert_eq!(out.page_count, 3);
        let field = out.drawn_elements.iter().find(|e| e.label == "field:late").unwrap();
        assert_eq!(field.page, 2);
        assert!(out
            .drawn_elements
            .iter()
            .filter(|e| e.page == 0)
            .all(|e| e.label.starts_with("cover")));
    }

    #[test]
    fn elements_are_listed_in_drawing_order() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "version": "1.0" },
            "coverPage": { "title": "Welcome" },
            "fields": [
                { "id": "name", "type": "text", "label": "Name", "position": { "x": 50, "y": -40 } }
            ]
        }));
        let style = ResolvedStylesheet::default();
        let out = compose(RecordingSurface::default(), &s, &style).unwrap();

        let labels: Vec<&str> = out.drawn_elements.iter().map(|e| e.label.as_str()).collect();
        let position = |label: &str| labels.iter().position(|l| *l == label).unwrap();
        assert!(position("cover-title") < position("header-left"));
        assert!(position("footer-center") < position("title"));
        assert!(position("title") < position("field:name"));
    }

    #[test]
    fn decorations_are_reported_before_content_they_collide_with() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "pages": 2 },
            "header": { "left": "Header" },
            "fields": [
                {
                    "id": "high", "type": "text", "label": "High", "page": 2,
                    "position": { "x": 50, "y": 775 }
                }
            ]
        }));
        let style = ResolvedStylesheet::default();
        let out = compose(RecordingSurface::default(), &s, &style).unwrap();

        assert_eq!(out.overlaps.len(), 1);
        assert_eq!(out.overlaps[0].first, "header-left");
        assert_eq!(out.overlaps[0].second, "field:high");
    }

    #[test]
    fn colliding_fields_are_reported() {
        let s = schema(serde_json::json!({
            "form": { "title": "Clash", "pages": 2 },
            "fields": [
                {
                    "id": "a", "type": "text", "label": "A", "page": 2,
                    "position": { "x": 50, "y": 600 }
                },
                {
                    "id": "b", "type": "text", "label": "B", "page": 2,
                    "position": { "x": 60, "y": 595 }
                },
                {
                    "id": "c", "type": "wormhole", "label": "?", "page": 2,
                    "position": { "x": 0, "y": 0 }
                }
            ]
        }));
        let style = ResolvedStylesheet::default();
        let out = compose(RecordingSurface::default(), &s, &style).unwrap();

        assert_eq!(out.field_count, 2);
        assert_eq!(out.overlaps.len(), 1);
        assert_eq!(out.overlaps[0].page, 1);
    }
}
