//! Flowing content: cover page, title block, and content blocks.
//!
//! Everything here advances the cursor by what it draws and records one
//! element per block (per page, when a block breaks across pages).

use log::warn;

use crate::assets::load_image;
use crate::context::{BoxStyle, FontRole, LayoutContext, Surface, TextRun, ASCENT_RATIO};
use crate::error::GenerateError;
use crate::overlap::Rect;
use crate::schema::{Color, ContentBlock, CoverPage, FormMetadata};
use crate::text::{estimate_width, wrap_text};

const LIST_INDENT: f32 = 14.0;
const CELL_PAD: f32 = 4.0;
const LOGO_BOX: (f32, f32) = (96.0, 96.0);
const COVER_IMAGE_BOX: (f32, f32) = (300.0, 180.0);
const WATERMARK_SIZE: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
}

/// How a run of wrapped lines is set.
#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub size: f32,
    pub bold: bool,
    pub role: FontRole,
    pub color: Color,
    pub align: Align,
    pub indent: f32,
}

// ============================================================================
// LINE FLOW
// ============================================================================

/// Draw pre-wrapped lines at the cursor, breaking pages as needed. Records
/// one element per page the lines touch and returns the number of lines.
pub fn draw_lines<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    lines: &[String],
    style: LineStyle,
    label: &str,
) -> Result<usize, GenerateError> {
    if lines.is_empty() {
        return Ok(0);
    }
    let sheet = ctx.style();
    let line_h = sheet.line_height_for(style.size);
    let left = sheet.margins.left + style.indent;
    let avail = sheet.content_width() - style.indent;

    // (page, top, bottom, widest) of the run of lines on the current page
    let mut segment: Option<(usize, f32, f32, f32)> = None;

    for line in lines {
        ctx.ensure_space(line_h)?;
        let cursor = ctx.cursor();
        if let Some((page, top, bottom, widest)) = segment {
            if page != cursor.page {
                close_segment(ctx, page, top, bottom, widest, style, label);
                segment = None;
            }
        }
        let (_, _, bottom, widest) = segment.get_or_insert((cursor.page, cursor.y, cursor.y, 0.0));

        let width = estimate_width(line, style.size);
        let x = match style.align {
            Align::Left => left,
            Align::Center => left + (avail - width).max(0.0) / 2.0,
        };
        *widest = widest.max(width);
        *bottom = cursor.y - line_h;

        let run = TextRun {
            text: line.clone(),
            x,
            y: cursor.y - style.size * ASCENT_RATIO,
            size: style.size,
            bold: style.bold,
            role: style.role,
            color: style.color,
        };
        ctx.paint_text(cursor.page, &run);
        ctx.advance(line_h);
    }

    if let Some((page, top, bottom, widest)) = segment {
        close_segment(ctx, page, top, bottom, widest, style, label);
    }
    Ok(lines.len())
}

fn close_segment<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    page: usize,
    top: f32,
    bottom: f32,
    widest: f32,
    style: LineStyle,
    label: &str,
) {
    let sheet = ctx.style();
    let left = sheet.margins.left + style.indent;
    let avail = sheet.content_width() - style.indent;
    let x = match style.align {
        Align::Left => left,
        Align::Center => left + (avail - widest).max(0.0) / 2.0,
    };
    ctx.record(page, Rect::new(x, bottom, widest, top - bottom), label);
}

fn body_style<S: Surface>(ctx: &LayoutContext<'_, S>) -> LineStyle {
    let sheet = ctx.style();
    LineStyle {
        size: sheet.font_sizes.body,
        bold: false,
        role: FontRole::Body,
        color: sheet.colors.text,
        align: Align::Left,
        indent: 0.0,
    }
}

// ============================================================================
// TITLE
// ============================================================================

/// Title, subtitle and description at the top of the first content page.
pub fn draw_title<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    form: &FormMetadata,
) -> Result<(), GenerateError> {
    let sheet = ctx.style();
    let width = sheet.content_width();

    if !form.title.trim().is_empty() {
        let style = LineStyle {
            size: sheet.font_sizes.title,
            bold: true,
            role: FontRole::Heading,
            color: sheet.colors.primary,
            ..body_style(ctx)
        };
        draw_lines(ctx, &wrap_text(&form.title, width, style.size), style, "title")?;
        ctx.advance(sheet.block_spacing);
    }

    if let Some(subtitle) = form.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        let style = LineStyle {
            size: sheet.font_sizes.heading,
            role: FontRole::Heading,
            color: sheet.colors.muted,
            ..body_style(ctx)
        };
        draw_lines(ctx, &wrap_text(subtitle, width, style.size), style, "subtitle")?;
        ctx.advance(sheet.block_spacing);
    }

    if let Some(description) = form.description.as_deref().filter(|s| !s.trim().is_empty()) {
        let style = body_style(ctx);
        draw_lines(ctx, &wrap_text(description, width, style.size), style, "description")?;
        ctx.advance(sheet.block_spacing);
    }

    Ok(())
}

// ============================================================================
// CONTENT BLOCKS
// ============================================================================

pub fn draw_blocks<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    blocks: &[ContentBlock],
) -> Result<(), GenerateError> {
    for block in blocks {
        draw_block(ctx, block)?;
    }
    Ok(())
}

fn draw_block<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    block: &ContentBlock,
) -> Result<(), GenerateError> {
    let sheet = ctx.style();
    let width = sheet.content_width();

    match block {
        ContentBlock::Heading { text, level } => {
            let size = heading_size(sheet.font_sizes.heading, sheet.font_sizes.body, *level);
            let style = LineStyle {
                size,
                bold: true,
                role: FontRole::Heading,
                color: sheet.colors.primary,
                ..body_style(ctx)
            };
            draw_lines(ctx, &wrap_text(text, width, size), style, "heading")?;
        }
        ContentBlock::Paragraph { text } => {
            let style = body_style(ctx);
            draw_lines(ctx, &wrap_text(text, width, style.size), style, "paragraph")?;
        }
        ContentBlock::List { items, ordered } => {
            let style = LineStyle { indent: LIST_INDENT, ..body_style(ctx) };
            for (i, item) in items.iter().enumerate() {
                let marker = if *ordered { format!("{}.", i + 1) } else { "-".to_string() };
                let mut lines = wrap_text(item, width - LIST_INDENT, style.size);
                if lines.is_empty() {
                    continue;
                }
                lines[0] = format!("{} {}", marker, lines[0]);
                draw_lines(ctx, &lines, style, "list-item")?;
            }
        }
        ContentBlock::Table { headers, rows } => {
            draw_table(ctx, headers, rows, "table")?;
        }
        ContentBlock::Divider => {
            ctx.ensure_space(sheet.block_spacing)?;
            let cursor = ctx.cursor();
            let y = cursor.y - sheet.block_spacing / 2.0;
            let (x1, x2) = (sheet.margins.left, sheet.margins.left + width);
            ctx.paint_line(cursor.page, (x1, y), (x2, y), sheet.colors.border, 0.5);
            ctx.record(cursor.page, Rect::new(x1, y - 0.25, width, 0.5), "divider");
            ctx.advance(sheet.block_spacing);
        }
        ContentBlock::Spacer { height } => {
            ctx.advance(height.max(0.0));
            return Ok(());
        }
    }

    ctx.advance(sheet.block_spacing);
    Ok(())
}

fn heading_size(heading: f32, body: f32, level: u8) -> f32 {
    (heading - (level.max(1) - 1) as f32 * 1.5).max(body)
}

/// Equal-width grid with a shaded header row. Rows never split; each page a
/// table touches gets its own recorded element.
pub fn draw_table<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    headers: &[String],
    rows: &[Vec<String>],
    label: &str,
) -> Result<(), GenerateError> {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return Ok(());
    }
    let sheet = ctx.style();
    let size = sheet.font_sizes.body;
    let line_h = sheet.line_height_for(size);
    let width = sheet.content_width();
    let col_w = width / columns as f32;
    let x0 = sheet.margins.left;
    let grid = BoxStyle::stroked(sheet.colors.border, 0.5);
    let shade = Color::rgb(0xEE, 0xEE, 0xEE);

    let header_row = (!headers.is_empty()).then_some((headers, true));
    let body_rows = rows.iter().map(|r| (r.as_slice(), false));

    // (page, top, bottom) of the rows on the current page
    let mut segment: Option<(usize, f32, f32)> = None;

    for (cells, is_header) in header_row.into_iter().chain(body_rows) {
        let wrapped: Vec<Vec<String>> = (0..columns)
            .map(|c| {
                let text = cells.get(c).map(String::as_str).unwrap_or("");
                wrap_text(text, col_w - 2.0 * CELL_PAD, size)
            })
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let row_h = line_count as f32 * line_h + 2.0 * CELL_PAD;

        ctx.ensure_space(row_h)?;
        let cursor = ctx.cursor();
        if let Some((page, top, bottom)) = segment {
            if page != cursor.page {
                ctx.record(page, Rect::new(x0, bottom, width, top - bottom), label);
                segment = None;
            }
        }
        let (_, _, bottom) = segment.get_or_insert((cursor.page, cursor.y, cursor.y));
        *bottom = cursor.y - row_h;

        let row_y = cursor.y - row_h;
        for (c, lines) in wrapped.iter().enumerate() {
            let cell = Rect::new(x0 + c as f32 * col_w, row_y, col_w, row_h);
            let style = if is_header {
                BoxStyle { fill: Some(shade), ..grid }
            } else {
                grid
            };
            ctx.paint_rect(cursor.page, cell, &style);
            for (i, line) in lines.iter().enumerate() {
                let run = TextRun {
                    text: line.clone(),
                    x: cell.x + CELL_PAD,
                    y: cursor.y - CELL_PAD - i as f32 * line_h - size * ASCENT_RATIO,
                    size,
                    bold: is_header,
                    role: FontRole::Body,
                    color: sheet.colors.text,
                };
                ctx.paint_text(cursor.page, &run);
            }
        }
        ctx.advance(row_h);
    }

    if let Some((page, top, bottom)) = segment {
        ctx.record(page, Rect::new(x0, bottom, width, top - bottom), label);
    }
    Ok(())
}

// ============================================================================
// COVER PAGE
// ============================================================================

/// Draw the cover on physical page 0. Images that fail to load are logged and
/// left out.
pub fn draw_cover<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    cover: &CoverPage,
    form: &FormMetadata,
) -> Result<(), GenerateError> {
    ctx.move_to_page(0);
    let sheet = ctx.style();
    let width = sheet.content_width();
    let centered = |size: f32, bold: bool, color: Color| LineStyle {
        size,
        bold,
        role: FontRole::Heading,
        color,
        align: Align::Center,
        indent: 0.0,
    };

    if let Some(logo) = cover.logo.as_deref() {
        draw_cover_image(ctx, logo, LOGO_BOX, "cover-logo");
    }

    let title = cover.title.as_deref().unwrap_or(&form.title);
    if !title.trim().is_empty() {
        let style = centered(sheet.font_sizes.title * 1.6, true, sheet.colors.primary);
        draw_lines(ctx, &wrap_text(title, width, style.size), style, "cover-title")?;
        ctx.advance(sheet.block_spacing);
    }

    if let Some(subtitle) = cover.subtitle.as_deref().or(form.subtitle.as_deref()) {
        let style = centered(sheet.font_sizes.heading, false, sheet.colors.muted);
        draw_lines(ctx, &wrap_text(subtitle, width, style.size), style, "cover-subtitle")?;
        ctx.advance(sheet.block_spacing * 2.0);
    }

    if let Some(image) = cover.image.as_deref() {
        draw_cover_image(ctx, image, COVER_IMAGE_BOX, "cover-image");
    }

    let meta: Vec<String> = [
        ("Prepared by", cover.prepared_by.as_deref().or(form.author.as_deref())),
        ("Organization", cover.organization.as_deref().or(form.organization.as_deref())),
        ("Version", cover.version.as_deref().or(form.version())),
        ("Date", cover.date.as_deref()),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| format!("{}: {}", key, v))
    })
    .collect();
    if !meta.is_empty() {
        let style = LineStyle { align: Align::Center, ..body_style(ctx) };
        draw_lines(ctx, &meta, style, "cover-meta")?;
        ctx.advance(sheet.block_spacing * 2.0);
    }

    if !cover.revision_history.is_empty() {
        let style = LineStyle {
            size: sheet.font_sizes.heading,
            bold: true,
            role: FontRole::Heading,
            color: sheet.colors.primary,
            ..body_style(ctx)
        };
        draw_lines(ctx, &["Revision History".to_string()], style, "cover-revisions-heading")?;
        let headers: Vec<String> = ["Version", "Date", "Author", "Description"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<String>> = cover
            .revision_history
            .iter()
            .map(|r| {
                vec![r.version.clone(), r.date.clone(), r.author.clone(), r.description.clone()]
            })
            .collect();
        draw_table(ctx, &headers, &rows, "cover-revisions")?;
    }

    if let Some(legal) = cover.legal_text.as_deref() {
        draw_legal(ctx, legal);
    }

    if let Some(watermark) = cover.watermark.as_deref().filter(|w| !w.trim().is_empty()) {
        // not recorded: a watermark overlaps by nature
        let run = TextRun {
            text: watermark.to_string(),
            x: (sheet.page_width() - estimate_width(watermark, WATERMARK_SIZE)) / 2.0,
            y: sheet.page_height() / 2.0,
            size: WATERMARK_SIZE,
            bold: true,
            role: FontRole::Heading,
            color: Color::rgb(0xE0, 0xE0, 0xE0),
        };
        ctx.paint_text(0, &run);
    }

    Ok(())
}

fn draw_cover_image<S: Surface>(
    ctx: &mut LayoutContext<'_, S>,
    reference: &str,
    (w, h): (f32, f32),
    label: &str,
) {
    match load_image(reference) {
        Ok(image) => {
            let sheet = ctx.style();
            let cursor = ctx.cursor();
            let rect = Rect::new((sheet.page_width() - w) / 2.0, cursor.y - h, w, h);
            ctx.draw_image(cursor.page, &image, rect, label);
            ctx.advance(h + sheet.block_spacing * 2.0);
        }
        Err(e) => warn!("Omitting {}: {}", label, e),
    }
}

/// Legal text is pinned to the bottom margin of the cover.
fn draw_legal<S: Surface>(ctx: &mut LayoutContext<'_, S>, legal: &str) {
    let sheet = ctx.style();
    let size = sheet.font_sizes.small;
    let line_h = sheet.line_height_for(size);
    let lines = wrap_text(legal, sheet.content_width(), size);
    if lines.is_empty() {
        return;
    }
    let height = lines.len() as f32 * line_h;
    let top = sheet.margins.bottom + height;
    let page = ctx.cursor().page;
    let mut widest: f32 = 0.0;

    for (i, line) in lines.iter().enumerate() {
        let run = TextRun {
            text: line.clone(),
            x: sheet.margins.left,
            y: top - i as f32 * line_h - size * ASCENT_RATIO,
            size,
            bold: false,
            role: FontRole::Body,
            color: sheet.colors.muted,
        };
        widest = widest.max(estimate_width(line, size));
        ctx.paint_text(page, &run);
    }
    let bounds = Rect::new(sheet.margins.left, sheet.margins.bottom, widest, height);
    ctx.record(page, bounds, "cover-legal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context;
    use crate::overlap::detect_overlaps;
    use crate::stylesheet::ResolvedStylesheet;

    fn form() -> FormMetadata {
        FormMetadata {
            title: "Employee Onboarding".into(),
            description: Some("Please complete every section of this form.".into()),
            ..Default::default()
        }
    }

    #[test]
    fn title_advances_cursor() {
        let style = ResolvedStylesheet::default();
        let mut ctx = context(&style, 1, false);
        draw_title(&mut ctx, &form()).unwrap();

        // title: 18 * 1.4 + 8, description: 10 * 1.4 + 8
        let expected = 742.0 - (25.2 + 8.0) - (14.0 + 8.0);
        assert!((ctx.cursor().y - expected).abs() < 1e-3);
        let labels: Vec<&str> = ctx.elements().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["title", "description"]);
        assert!(detect_overlaps(ctx.elements()).is_empty());
    }

    #[test]
    fn long_content_flows_to_next_page() {
        let style = ResolvedStylesheet::default();
        let mut ctx = context(&style, 1, false);
        let text = "word ".repeat(2000);
        draw_blocks(&mut ctx, &[ContentBlock::Paragraph { text }]).unwrap();

        assert!(ctx.page_count() > 1);
        let pages: Vec<usize> = ctx.elements().iter().map(|e| e.page).collect();
        assert_eq!(pages, (0..ctx.page_count()).collect::<Vec<_>>());
        for e in ctx.elements() {
            assert!(e.y >= style.margins.bottom - 1e-3, "{:?}", e);
        }
    }

    #[test]
    fn blocks_do_not_overlap_each_other() {
        let style = ResolvedStylesheet::default();
        let mut ctx = context(&style, 1, false);
        let blocks = vec![
            ContentBlock::Heading { text: "Section".into(), level: 2 },
            ContentBlock::Paragraph {
                text: "Body text that is long enough to wrap across more than one line of the page"
                    .into(),
            },
            ContentBlock::Divider,
            ContentBlock::List { items: vec!["one".into(), "two".into()], ordered: true },
            ContentBlock::Table {
                headers: vec!["Name".into(), "Role".into()],
                rows: vec![vec!["Ada".into(), "Engineer".into()]],
            },
            ContentBlock::Spacer { height: 20.0 },
        ];
        draw_blocks(&mut ctx, &blocks).unwrap();
        assert!(detect_overlaps(ctx.elements()).is_empty());
        assert_eq!(ctx.elements().iter().filter(|e| e.label == "list-item").count(), 2);
    }

    #[test]
    fn cover_stays_on_page_zero_and_skips_missing_images() {
        let style = ResolvedStylesheet::default();
        let mut ctx = context(&style, 1, true);
        let cover = CoverPage {
            logo: Some("/nonexistent/logo.png".into()),
            version: Some("1.2".into()),
            legal_text: Some("Confidential. Do not distribute.".into()),
            watermark: Some("DRAFT".into()),
            revision_history: vec![crate::schema::Revision {
                version: "1.0".into(),
                date: "2024-01-01".into(),
                author: "Ops".into(),
                description: "Initial".into(),
            }],
            ..Default::default()
        };
        draw_cover(&mut ctx, &cover, &form()).unwrap();

        assert_eq!(ctx.page_count(), 2);
        assert!(ctx.elements().iter().all(|e| e.page == 0));
        assert!(!ctx.elements().iter().any(|e| e.label == "cover-logo"));
        assert!(ctx.elements().iter().any(|e| e.label == "cover-legal"));
        assert!(detect_overlaps(ctx.elements()).is_empty());
    }

    #[test]
    fn heading_sizes_shrink_by_level() {
        assert_eq!(heading_size(13.0, 10.0, 1), 13.0);
        assert_eq!(heading_size(13.0, 10.0, 2), 11.5);
        assert_eq!(heading_size(13.0, 10.0, 6), 10.0);
    }
}
