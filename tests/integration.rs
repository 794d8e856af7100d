//! Integration tests for the inkform pipeline.
//!
//! These tests go from schema JSON to each backend and check:
//! - physical page counts with and without a cover page
//! - field placement against the content baseline
//! - out-of-range pages clamp to the last page
//! - overlap diagnostics
//! - HTML page containers and DOCX block ordering

use inkform_core::render::docx::{FlowBlock, Run};
use inkform_core::{
    generate_docx, generate_html, generate_pdf, resolve_stylesheet, FormSchema, ResolvedStylesheet,
    StylesheetSource,
};

// ─── Helpers ────────────────────────────────────────────────────

fn parse(json: serde_json::Value) -> FormSchema {
    serde_json::from_value(json).expect("schema should parse")
}

fn onboarding(with_cover: bool) -> FormSchema {
    let mut json = serde_json::json!({
        "form": {
            "title": "Employee Onboarding",
            "description": "Complete all sections before your first day.",
            "version": "3.1",
            "pages": 2
        },
        "footer": { "showPageNumbers": true, "showVersion": true },
        "content": [
            { "type": "heading", "text": "Personal details" },
            {
                "type": "paragraph",
                "text": "We use this information for payroll and emergency contact only."
            }
        ],
        "fields": [
            {
                "id": "name", "type": "text", "label": "Full name", "required": true,
                "position": { "x": 50, "y": -30 }
            },
            {
                "id": "start", "type": "date", "label": "Start date",
                "position": { "x": 300, "y": -30 }
            },
            {
                "id": "team", "type": "dropdown", "label": "Team", "options": ["Ops", "Eng"],
                "position": { "x": 50, "y": -90 }
            },
            {
                "id": "agree", "type": "checkbox", "label": "I agree", "page": 2,
                "position": { "x": 50, "y": 600 }
            },
            {
                "id": "sign", "type": "signature", "label": "Signature", "page": 2,
                "position": { "x": 50, "y": 500 }
            }
        ]
    });
    if with_cover {
        json["coverPage"] = serde_json::json!({
            "subtitle": "New hire packet",
            "organization": "Acme",
            "legalText": "Internal use only."
        });
    }
    parse(json)
}

fn style() -> ResolvedStylesheet {
    ResolvedStylesheet::default()
}

// ─── PDF ────────────────────────────────────────────────────────

#[test]
fn test_pdf_has_header_and_declared_pages() {
    let out = generate_pdf(&onboarding(false), &style()).unwrap();
    assert!(out.bytes.starts_with(b"%PDF-"));
    assert_eq!(out.page_count, 2);
    assert_eq!(out.field_count, 5);
}

#[test]
fn test_cover_page_adds_one_physical_page() {
    let out = generate_pdf(&onboarding(true), &style()).unwrap();
    assert_eq!(out.page_count, 3);

    let agree = out.drawn_elements.iter().find(|e| e.label == "field:agree").unwrap();
    assert_eq!(agree.page, 2);
    let name = out.drawn_elements.iter().find(|e| e.label == "field:name").unwrap();
    assert_eq!(name.page, 1);

    // no decorations on the cover
    assert!(out
        .drawn_elements
        .iter()
        .filter(|e| e.page == 0)
        .all(|e| e.label.starts_with("cover")));
}

#[test]
fn test_clean_form_has_no_overlaps() {
    let out = generate_pdf(&onboarding(true), &style()).unwrap();
    assert!(out.overlaps.is_empty(), "{:?}", out.overlaps);
}

#[test]
fn test_page_99_clamps_to_last_page() {
    let schema = parse(serde_json::json!({
        "form": { "title": "Clamp", "pages": 2 },
        "fields": [
            {
                "id": "far", "type": "text", "label": "Far", "page": 99,
                "position": { "x": 50, "y": 500 }
            }
        ]
    }));
    let out = generate_pdf(&schema, &style()).unwrap();
    assert_eq!(out.page_count, 2);
    let far = out.drawn_elements.iter().find(|e| e.label == "field:far").unwrap();
    assert_eq!(far.page, 1);
}

#[test]
fn test_fields_sit_below_content() {
    let out = generate_pdf(&onboarding(false), &style()).unwrap();
    let paragraph = out.drawn_elements.iter().find(|e| e.label == "paragraph").unwrap();
    let name = out.drawn_elements.iter().find(|e| e.label == "field:name").unwrap();
    assert_eq!(paragraph.page, name.page);
    assert!(name.y + name.height <= paragraph.y);
}

#[test]
fn test_overlapping_fields_are_reported() {
    let schema = parse(serde_json::json!({
        "form": { "title": "Overlap" },
        "fields": [
            { "id": "a", "type": "textarea", "label": "A", "position": { "x": 50, "y": -20 } },
            { "id": "b", "type": "text", "label": "B", "position": { "x": 100, "y": -40 } }
        ]
    }));
    let out = generate_pdf(&schema, &style()).unwrap();
    assert_eq!(out.overlaps.len(), 1);
    assert_eq!(out.overlaps[0].first, "field:a");
    assert_eq!(out.overlaps[0].second, "field:b");
}

#[test]
fn test_long_content_appends_pages() {
    let text = "Lorem ipsum dolor sit amet consectetur. ".repeat(400);
    let schema = parse(serde_json::json!({
        "form": { "title": "Long" },
        "content": [{ "type": "paragraph", "text": text }]
    }));
    let out = generate_pdf(&schema, &style()).unwrap();
    assert!(out.page_count > 1);
}

#[test]
fn test_inline_stylesheet_changes_page_size() {
    let source = StylesheetSource::Inline(serde_json::json!({ "pageSize": "a4" }));
    let sheet = resolve_stylesheet(&source);
    let out = generate_html(&onboarding(false), &sheet).unwrap();
    assert!(out.markup.contains("width:595.28pt;height:841.89pt;"));
}

// ─── HTML ───────────────────────────────────────────────────────

#[test]
fn test_html_sections_and_footer_numbers() {
    let out = generate_html(&onboarding(true), &style()).unwrap();
    assert_eq!(out.page_count, 3);
    assert_eq!(out.markup.matches("class=\"ink-page\"").count(), 3);
    assert!(out.markup.contains("Page 1 of 2"));
    assert!(out.markup.contains("Page 2 of 2"));
    assert!(out.markup.contains("Version 3.1"));
    assert!(out.styles.contains(".ink-page"));
}

// ─── DOCX ───────────────────────────────────────────────────────

#[test]
fn test_docx_orders_blocks_and_breaks_pages() {
    let doc = generate_docx(&onboarding(true), &style()).unwrap();

    assert!(doc.properties.title_page);
    assert_eq!(doc.properties.page_number_start, 0);
    assert_eq!(doc.properties.unnumbered_pages, 1);
    // cover + one logical page step
    assert_eq!(doc.page_breaks(), 2);

    let ids: Vec<&str> = doc
        .blocks
        .iter()
        .filter_map(|b| match b {
            FlowBlock::Field(f) => Some(f.id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["name", "start", "team", "agree", "sign"]);

    let footer_runs: Vec<&Run> = doc.properties.footer.iter().flat_map(|p| p.runs.iter()).collect();
    assert!(footer_runs.contains(&&Run::PageNumber));
    assert!(footer_runs.contains(&&Run::TotalPages));
}

#[test]
fn test_docx_without_cover_starts_numbering_at_one() {
    let doc = generate_docx(&onboarding(false), &style()).unwrap();
    assert!(!doc.properties.title_page);
    assert_eq!(doc.properties.page_number_start, 1);
    assert_eq!(doc.properties.unnumbered_pages, 0);
    assert_eq!(doc.page_breaks(), 1);
}
