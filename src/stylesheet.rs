//! Stylesheet resolution.
//!
//! Every generation run works from one fully-populated `ResolvedStylesheet`.
//! Author stylesheets are sparse JSON documents merged over the built-in
//! default; anything unreadable falls back to the default with a warning.

use log::{debug, warn};
use serde::Deserialize;
use std::path::PathBuf;

use crate::schema::Color;

// ============================================================================
// RESOLVED TYPES
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    #[default]
    #[serde(rename = "letter", alias = "Letter", alias = "LETTER")]
    Letter,
    #[serde(rename = "a4", alias = "A4")]
    A4,
    #[serde(rename = "legal", alias = "Legal", alias = "LEGAL")]
    Legal,
}

impl PageSize {
    /// (width, height) in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn uniform(v: f32) -> Self {
        Margins { top: v, right: v, bottom: v, left: v }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontFamilies {
    pub body: String,
    pub heading: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f32,
    pub heading: f32,
    pub body: f32,
    pub label: f32,
    pub small: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub text: Color,
    pub primary: Color,
    pub muted: Color,
    pub border: Color,
}

/// Page geometry and typography shared read-only by every component of one
/// generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStylesheet {
    pub page_size: PageSize,
    pub margins: Margins,
    pub fonts: FontFamilies,
    pub font_sizes: FontSizes,
    pub colors: Palette,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Vertical gap between content blocks, in points.
    pub block_spacing: f32,
}

impl Default for ResolvedStylesheet {
    fn default() -> Self {
        ResolvedStylesheet {
            page_size: PageSize::Letter,
            margins: Margins::uniform(50.0),
            fonts: FontFamilies {
                body: "Helvetica".to_string(),
                heading: "Helvetica".to_string(),
            },
            font_sizes: FontSizes {
                title: 18.0,
                heading: 13.0,
                body: 10.0,
                label: 9.0,
                small: 8.0,
            },
            colors: Palette {
                text: Color::rgb(0x22, 0x22, 0x22),
                primary: Color::rgb(0x1F, 0x3A, 0x5F),
                muted: Color::rgb(0x66, 0x66, 0x66),
                border: Color::rgb(0x99, 0x99, 0x99),
            },
            line_height: 1.4,
            block_spacing: 8.0,
        }
    }
}

impl ResolvedStylesheet {
    pub fn page_width(&self) -> f32 {
        self.page_size.dimensions().0
    }

    pub fn page_height(&self) -> f32 {
        self.page_size.dimensions().1
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page_width() - self.margins.left - self.margins.right
    }

    /// Top of the content area in page coordinates (origin bottom-left).
    pub fn content_top(&self) -> f32 {
        self.page_height() - self.margins.top
    }

    pub fn line_height_for(&self, font_size: f32) -> f32 {
        font_size * self.line_height
    }
}

// ============================================================================
// SOURCE + RESOLUTION
// ============================================================================

/// Where the author stylesheet comes from.
#[derive(Debug, Clone, Default)]
pub enum StylesheetSource {
    #[default]
    Default,
    Path(PathBuf),
    Inline(serde_json::Value),
}

/// Resolve a stylesheet source into a complete stylesheet. Never fails.
pub fn resolve_stylesheet(source: &StylesheetSource) -> ResolvedStylesheet {
    let overrides = match source {
        StylesheetSource::Default => return ResolvedStylesheet::default(),
        StylesheetSource::Path(path) => match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<StylesheetOverrides>(&raw) {
                Ok(overrides) => overrides,
                Err(e) => {
                    warn!("Stylesheet {} is invalid, using default: {}", path.display(), e);
                    return ResolvedStylesheet::default();
                }
            },
            Err(e) => {
                warn!("Stylesheet {} could not be read, using default: {}", path.display(), e);
                return ResolvedStylesheet::default();
            }
        },
        StylesheetSource::Inline(value) => match StylesheetOverrides::deserialize(value) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Inline stylesheet is invalid, using default: {}", e);
                return ResolvedStylesheet::default();
            }
        },
    };

    let resolved = overrides.apply(ResolvedStylesheet::default());
    debug!(
        "Resolved stylesheet: {:?} page, margins {:?}",
        resolved.page_size, resolved.margins
    );
    resolved
}

// ============================================================================
// SPARSE AUTHOR STYLESHEET
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StylesheetOverrides {
    page_size: Option<PageSize>,
    margins: Option<MarginSpec>,
    fonts: Option<FontSpec>,
    font_sizes: Option<FontSizeSpec>,
    colors: Option<PaletteSpec>,
    line_height: Option<f32>,
    block_spacing: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarginSpec {
    Uniform(f32),
    Sides {
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
        left: Option<f32>,
    },
}

#[derive(Debug, Deserialize, Default)]
struct FontSpec {
    body: Option<String>,
    heading: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FontSizeSpec {
    title: Option<f32>,
    heading: Option<f32>,
    body: Option<f32>,
    label: Option<f32>,
    small: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct PaletteSpec {
    text: Option<Color>,
    primary: Option<Color>,
    muted: Option<Color>,
    border: Option<Color>,
}

fn positive(value: Option<f32>, fallback: f32) -> f32 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

fn non_negative(value: Option<f32>, fallback: f32) -> f32 {
    value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(fallback)
}

impl StylesheetOverrides {
    fn apply(self, base: ResolvedStylesheet) -> ResolvedStylesheet {
        let margins = match self.margins {
            Some(MarginSpec::Uniform(v)) => {
                Margins::uniform(non_negative(Some(v), base.margins.top))
            }
            Some(MarginSpec::Sides { top, right, bottom, left }) => Margins {
                top: non_negative(top, base.margins.top),
                right: non_negative(right, base.margins.right),
                bottom: non_negative(bottom, base.margins.bottom),
                left: non_negative(left, base.margins.left),
            },
            None => base.margins,
        };

        let fonts = self.fonts.unwrap_or_default();
        let sizes = self.font_sizes.unwrap_or_default();
        let colors = self.colors.unwrap_or_default();

        ResolvedStylesheet {
            page_size: self.page_size.unwrap_or(base.page_size),
            margins,
            fonts: FontFamilies {
                body: fonts.body.filter(|f| !f.trim().is_empty()).unwrap_or(base.fonts.body),
                heading: fonts
                    .heading
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or(base.fonts.heading),
            },
            font_sizes: FontSizes {
                title: positive(sizes.title, base.font_sizes.title),
                heading: positive(sizes.heading, base.font_sizes.heading),
                body: positive(sizes.body, base.font_sizes.body),
                label: positive(sizes.label, base.font_sizes.label),
                small: positive(sizes.small, base.font_sizes.small),
            },
            colors: Palette {
                text: colors.text.unwrap_or(base.colors.text),
                primary: colors.primary.unwrap_or(base.colors.primary),
                muted: colors.muted.unwrap_or(base.colors.muted),
                border: colors.border.unwrap_or(base.colors.border),
            },
            line_height: positive(self.line_height, base.line_height),
            block_spacing: non_negative(self.block_spacing, base.block_spacing),
        }
    }
}
