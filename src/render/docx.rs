//! Flowable word-processor output.
//!
//! There is no canvas here: the document is a section description plus an
//! ordered block sequence for a DOCX writer to insert. Page numbers in the
//! header and footer are left as field runs for the word processor to fill.

use base64::Engine;
use log::{info, warn};
use serde::Serialize;

use crate::assets::load_image;
use crate::error::GenerateError;
use crate::fields::{normalize_fields, reading_order, FieldKind, NormalizedFormField};
use crate::footer::{
    resolve_footer_config, resolve_header_config, template_segments, Separator, TemplateSegment,
};
use crate::pagination::PageMap;
use crate::placement::adjust_field_positions;
use crate::schema::{ContentBlock, CoverPage, FormMetadata, FormSchema};
use crate::stylesheet::ResolvedStylesheet;

const TWIPS_PER_PT: f32 = 20.0;
const LOGO_BOX: (f32, f32) = (96.0, 96.0);
const COVER_IMAGE_BOX: (f32, f32) = (300.0, 180.0);

fn twips(pt: f32) -> u32 {
    (pt.max(0.0) * TWIPS_PER_PT).round() as u32
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FlowDocument {
    pub properties: SectionProperties,
    pub blocks: Vec<FlowBlock>,
}

impl FlowDocument {
    pub fn field_count(&self) -> usize {
        self.blocks.iter().filter(|b| matches!(b, FlowBlock::Field(_))).count()
    }

    pub fn page_breaks(&self) -> usize {
        self.blocks.iter().filter(|b| matches!(b, FlowBlock::PageBreak)).count()
    }

    pub fn to_json(&self) -> Result<String, GenerateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TwipMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionProperties {
    pub page_width: u32,
    pub page_height: u32,
    pub margins: TwipMargins,
    /// First page carries no header or footer.
    pub title_page: bool,
    pub page_number_start: u32,
    /// Leading pages left out of `Run::TotalPages`: 1 for the cover, else 0.
    pub unnumbered_pages: u32,
    pub header: Vec<FlowParagraph>,
    pub footer: Vec<FlowParagraph>,
    pub footer_separator: Option<Separator>,
    pub watermark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowBlock {
    Paragraph(FlowParagraph),
    Table(FlowTable),
    Image(FlowImage),
    Field(FlowField),
    Spacer { height: u32 },
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    Title,
    Subtitle,
    Heading(u8),
    Body,
    ListItem { ordered: bool, index: usize },
    Divider,
    Caption,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowParagraph {
    pub style: ParagraphStyle,
    pub align: Alignment,
    pub runs: Vec<Run>,
}

impl FlowParagraph {
    fn text(style: ParagraphStyle, align: Alignment, text: &str) -> Self {
        FlowParagraph { style, align, runs: vec![Run::text(text)] }
    }

    /// Plain text of the paragraph, with field runs shown as tokens.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|run| match run {
                Run::Text { text, .. } => text.as_str(),
                Run::PageNumber => "{{page}}",
                Run::TotalPages => "{{pages}}",
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Run {
    Text { text: String, bold: bool },
    /// Current page number field.
    PageNumber,
    /// Total page count field, less `SectionProperties::unnumbered_pages`
    /// (a `NUMPAGES - n` formula), so the cover is not counted.
    TotalPages,
}

/// Single-run paragraph block.
fn paragraph(style: ParagraphStyle, align: Alignment, text: &str) -> FlowBlock {
    FlowBlock::Paragraph(FlowParagraph::text(style, align, text))
}

impl Run {
    fn text(text: &str) -> Self {
        Run::Text { text: text.to_string(), bold: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Equal column widths, in twips.
    pub column_widths: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowImage {
    pub mime_type: String,
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub align: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowField {
    pub id: String,
    pub kind: FieldKind,
    pub label: String,
    /// Logical page the field belongs to.
    pub page: u32,
    pub width: u32,
    pub placeholder: Option<String>,
    pub default_value: Option<String>,
    pub options: Vec<String>,
}

impl From<&NormalizedFormField> for FlowField {
    fn from(field: &NormalizedFormField) -> Self {
        FlowField {
            id: field.id.clone(),
            kind: field.kind,
            label: field.display_label(),
            page: field.page,
            width: twips(field.width),
            placeholder: field.placeholder.clone(),
            default_value: field.default_value.clone(),
            options: field.options.clone(),
        }
    }
}

// ============================================================================
// GENERATION
// ============================================================================

pub fn generate_docx(
    schema: &FormSchema,
    style: &ResolvedStylesheet,
) -> Result<FlowDocument, GenerateError> {
    let page_map = PageMap::new(schema.declared_page_count(), schema.has_cover_page());
    let mut blocks = Vec::new();

    if let Some(cover) = &schema.cover_page {
        cover_blocks(&mut blocks, cover, &schema.form, style);
        blocks.push(FlowBlock::PageBreak);
    }

    title_blocks(&mut blocks, &schema.form);
    for block in &schema.content {
        content_block(&mut blocks, block, style);
    }

    let mut fields = normalize_fields(&schema.fields);
    // only relative order matters without a canvas
    adjust_field_positions(&mut fields, style.content_top());
    field_blocks(&mut blocks, &fields, page_map.declared());

    let properties = section_properties(schema, style, page_map);
    let document = FlowDocument { properties, blocks };

    info!(
        "Built flow document '{}': {} block(s), {} field(s), {} page break(s)",
        schema.form.title,
        document.blocks.len(),
        document.field_count(),
        document.page_breaks()
    );
    Ok(document)
}

fn section_properties(
    schema: &FormSchema,
    style: &ResolvedStylesheet,
    page_map: PageMap,
) -> SectionProperties {
    let header = resolve_header_config(schema.header.as_ref(), &schema.form);
    let footer = resolve_footer_config(schema.footer.as_ref(), &schema.form);

    let mut header_paragraphs = Vec::new();
    if header.enabled {
        slot_paragraphs(&mut header_paragraphs, [&header.left, &header.center, &header.right]);
    }

    let mut footer_paragraphs = Vec::new();
    if footer.enabled {
        slot_paragraphs(&mut footer_paragraphs, [&footer.left, &footer.center, &footer.right]);
        if !footer.social_links.is_empty() {
            let social = footer
                .social_links
                .iter()
                .map(|l| l.display())
                .collect::<Vec<_>>()
                .join("  |  ");
            footer_paragraphs.push(FlowParagraph::text(
                ParagraphStyle::Caption,
                Alignment::Center,
                &social,
            ));
        }
    }

    let m = style.margins;
    SectionProperties {
        page_width: twips(style.page_width()),
        page_height: twips(style.page_height()),
        margins: TwipMargins {
            top: twips(m.top),
            right: twips(m.right),
            bottom: twips(m.bottom),
            left: twips(m.left),
        },
        title_page: page_map.has_cover(),
        page_number_start: if page_map.has_cover() { 0 } else { 1 },
        unnumbered_pages: u32::from(page_map.has_cover()),
        header: header_paragraphs,
        footer: footer_paragraphs,
        footer_separator: (footer.enabled && footer.separator.enabled)
            .then(|| footer.separator.clone()),
        watermark: schema
            .cover_page
            .as_ref()
            .and_then(|c| c.watermark.clone())
            .filter(|w| !w.trim().is_empty()),
    }
}

/// One paragraph per non-empty slot, with page tokens as field runs.
fn slot_paragraphs(out: &mut Vec<FlowParagraph>, slots: [&String; 3]) {
    let aligns = [Alignment::Left, Alignment::Center, Alignment::Right];
    for (template, align) in slots.into_iter().zip(aligns) {
        if template.is_empty() {
            continue;
        }
        let runs = template_segments(template)
            .into_iter()
            .map(|segment| match segment {
                TemplateSegment::Text(text) => Run::Text { text, bold: false },
                TemplateSegment::Page => Run::PageNumber,
                TemplateSegment::Pages => Run::TotalPages,
            })
            .collect();
        out.push(FlowParagraph { style: ParagraphStyle::Caption, align, runs });
    }
}

fn cover_blocks(
    out: &mut Vec<FlowBlock>,
    cover: &CoverPage,
    form: &FormMetadata,
    style: &ResolvedStylesheet,
) {
    if let Some(logo) = cover.logo.as_deref() {
        push_image(out, logo, LOGO_BOX, "cover logo");
    }

    let title = cover.title.as_deref().unwrap_or(&form.title);
    if !title.trim().is_empty() {
        out.push(paragraph(ParagraphStyle::Title, Alignment::Center, title));
    }
    if let Some(subtitle) = cover.subtitle.as_deref().or(form.subtitle.as_deref()) {
        out.push(paragraph(ParagraphStyle::Subtitle, Alignment::Center, subtitle));
    }

    if let Some(image) = cover.image.as_deref() {
        push_image(out, image, COVER_IMAGE_BOX, "cover image");
    }

    let meta = [
        ("Prepared by", cover.prepared_by.as_deref().or(form.author.as_deref())),
        ("Organization", cover.organization.as_deref().or(form.organization.as_deref())),
        ("Version", cover.version.as_deref().or(form.version())),
        ("Date", cover.date.as_deref()),
    ];
    for (key, value) in meta {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            out.push(FlowBlock::Paragraph(FlowParagraph {
                style: ParagraphStyle::Body,
                align: Alignment::Center,
                runs: vec![
                    Run::Text { text: format!("{}: ", key), bold: true },
                    Run::text(value),
                ],
            }));
        }
    }

    if !cover.revision_history.is_empty() {
        out.push(paragraph(ParagraphStyle::Heading(2), Alignment::Left, "Revision History"));
        let headers: Vec<String> = ["Version", "Date", "Author", "Description"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = cover
            .revision_history
            .iter()
            .map(|r| {
                vec![r.version.clone(), r.date.clone(), r.author.clone(), r.description.clone()]
            })
            .collect();
        out.push(FlowBlock::Table(table(headers, rows, style)));
    }

    if let Some(legal) = cover.legal_text.as_deref().filter(|l| !l.trim().is_empty()) {
        out.push(paragraph(ParagraphStyle::Legal, Alignment::Left, legal));
    }
}

fn push_image(out: &mut Vec<FlowBlock>, reference: &str, (w, h): (f32, f32), what: &str) {
    match load_image(reference) {
        Ok(image) => out.push(FlowBlock::Image(FlowImage {
            mime_type: image.mime_type().to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&image.data),
            width: twips(w),
            height: twips(h),
            align: Alignment::Center,
        })),
        Err(e) => warn!("Omitting {}: {}", what, e),
    }
}

fn title_blocks(out: &mut Vec<FlowBlock>, form: &FormMetadata) {
    if !form.title.trim().is_empty() {
        out.push(paragraph(ParagraphStyle::Title, Alignment::Left, &form.title));
    }
    if let Some(subtitle) = form.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push(paragraph(ParagraphStyle::Subtitle, Alignment::Left, subtitle));
    }
    if let Some(description) = form.description.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push(paragraph(ParagraphStyle::Body, Alignment::Left, description));
    }
}

fn content_block(out: &mut Vec<FlowBlock>, block: &ContentBlock, style: &ResolvedStylesheet) {
    match block {
        ContentBlock::Heading { text, level } => {
            let style = ParagraphStyle::Heading((*level).clamp(1, 6));
            out.push(paragraph(style, Alignment::Left, text));
        }
        ContentBlock::Paragraph { text } => {
            out.push(paragraph(ParagraphStyle::Body, Alignment::Left, text))
        }
        ContentBlock::List { items, ordered } => {
            for (index, item) in items.iter().enumerate() {
                let style = ParagraphStyle::ListItem { ordered: *ordered, index: index + 1 };
                out.push(paragraph(style, Alignment::Left, item));
            }
        }
        ContentBlock::Table { headers, rows } => {
            out.push(FlowBlock::Table(table(headers.clone(), rows.clone(), style)));
        }
        ContentBlock::Divider => out.push(FlowBlock::Paragraph(FlowParagraph {
            style: ParagraphStyle::Divider,
            align: Alignment::Left,
            runs: Vec::new(),
        })),
        ContentBlock::Spacer { height } => out.push(FlowBlock::Spacer { height: twips(*height) }),
    }
}

fn table(headers: Vec<String>, rows: Vec<Vec<String>>, style: &ResolvedStylesheet) -> FlowTable {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let width = if columns == 0 { 0 } else { twips(style.content_width() / columns as f32) };
    FlowTable { headers, rows, column_widths: vec![width; columns] }
}

/// Fields in reading order, one page break per logical page step. Pages past
/// the declared count fold onto the last page.
fn field_blocks(out: &mut Vec<FlowBlock>, fields: &[NormalizedFormField], declared: usize) {
    let last = declared.max(1) as u32;
    let mut current = 1;
    for field in reading_order(fields) {
        let page = field.page.clamp(1, last);
        while current < page {
            out.push(FlowBlock::PageBreak);
            current += 1;
        }
        out.push(FlowBlock::Field(FlowField { page, ..FlowField::from(field) }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(json: serde_json::Value) -> FormSchema {
        serde_json::from_value(json).unwrap()
    }

    fn field_ids(doc: &FlowDocument) -> Vec<&str> {
        doc.blocks
            .iter()
            .filter_map(|b| match b {
                FlowBlock::Field(f) => Some(f.id.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn section_uses_twips_and_cover_numbering() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "version": "2.0" },
            "coverPage": { "title": "Welcome", "watermark": "DRAFT" }
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();
        let p = &doc.properties;
        assert_eq!((p.page_width, p.page_height), (12240, 15840));
        assert_eq!(p.margins.left, 1000);
        assert!(p.title_page);
        assert_eq!(p.page_number_start, 0);
        assert_eq!(p.unnumbered_pages, 1);
        assert_eq!(p.watermark.as_deref(), Some("DRAFT"));
        assert_eq!(p.footer[0].plain_text(), "Version 2.0");
        assert_eq!(p.footer[0].align, Alignment::Center);
    }

    #[test]
    fn total_pages_counts_every_page_without_a_cover() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "pages": 2 },
            "footer": { "right": "{{page}} / {{pages}}" }
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();
        assert_eq!(doc.properties.unnumbered_pages, 0);
        assert!(doc.properties.footer[0].runs.contains(&Run::TotalPages));

        let json = doc.to_json().unwrap();
        assert!(json.contains("\"unnumbered_pages\": 0"));
    }

    #[test]
    fn page_tokens_become_field_runs() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake" },
            "footer": { "showPageNumbers": true }
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();
        let right = &doc.properties.footer[0];
        assert_eq!(right.align, Alignment::Right);
        assert_eq!(
            right.runs,
            vec![Run::text("Page "), Run::PageNumber, Run::text(" of "), Run::TotalPages]
        );
    }

    #[test]
    fn blocks_follow_reading_order() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "description": "Fill this in.", "pages": 3 },
            "coverPage": { "title": "Welcome" },
            "content": [{ "type": "heading", "text": "Details" }],
            "fields": [
                { "id": "p3", "type": "text", "page": 3, "position": { "x": 50, "y": 500 } },
                { "id": "right", "type": "text", "position": { "x": 300, "y": -20 } },
                { "id": "lower", "type": "text", "position": { "x": 50, "y": -80 } },
                { "id": "left", "type": "text", "position": { "x": 50, "y": -20 } }
            ]
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();

        assert_eq!(field_ids(&doc), vec!["left", "right", "lower", "p3"]);
        // cover break + two logical page steps
        assert_eq!(doc.page_breaks(), 3);

        let first_break = doc.blocks.iter().position(|b| *b == FlowBlock::PageBreak).unwrap();
        match &doc.blocks[first_break + 1] {
            FlowBlock::Paragraph(p) => assert_eq!(p.plain_text(), "Intake"),
            other => panic!("expected title after cover, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_pages_fold_onto_the_last_page() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake", "pages": 2 },
            "fields": [
                { "id": "far", "type": "date", "page": 99, "position": { "x": 50, "y": 500 } }
            ]
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();
        assert_eq!(doc.page_breaks(), 1);
        match doc.blocks.last() {
            Some(FlowBlock::Field(f)) => assert_eq!(f.page, 2),
            other => panic!("expected field, got {:?}", other),
        }
    }

    #[test]
    fn serializes_to_json() {
        let s = schema(serde_json::json!({
            "form": { "title": "Intake" },
            "content": [{ "type": "table", "headers": ["A", "B"], "rows": [["1", "2"]] }]
        }));
        let doc = generate_docx(&s, &ResolvedStylesheet::default()).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"type\": \"table\""));
        assert!(json.contains("\"column_widths\": [\n"));
    }
}
