use serde::{Deserialize, Serialize};

// ============================================================================
// DOCUMENT SCHEMA
// ============================================================================

/// A parsed form document: metadata, optional cover page, header/footer
/// configuration, free content, and the fields to place.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub form: FormMetadata,

    #[serde(default)]
    pub cover_page: Option<CoverPage>,

    #[serde(default)]
    pub header: Option<HeaderConfig>,

    #[serde(default)]
    pub footer: Option<FooterConfig>,

    #[serde(default)]
    pub content: Vec<ContentBlock>,

    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Number of logical pages: `form.pages` when given, otherwise the
    /// highest page any field references. Never less than one.
    pub fn declared_page_count(&self) -> usize {
        let from_fields = self.fields.iter().map(|f| f.page).max().unwrap_or(1);
        self.form.pages.unwrap_or(from_fields).max(1) as usize
    }

    pub fn has_cover_page(&self) -> bool {
        self.cover_page.is_some()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormMetadata {
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    /// Declared logical page count.
    pub pages: Option<u32>,
}

impl FormMetadata {
    /// Version string, if present and non-blank.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

// ============================================================================
// COVER PAGE
// ============================================================================

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CoverPage {
    /// Overrides `form.title` on the cover.
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Logo reference: file path, http(s) URL or data URL.
    pub logo: Option<String>,
    /// Larger cover illustration, same reference forms as `logo`.
    pub image: Option<String>,
    pub prepared_by: Option<String>,
    pub organization: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub revision_history: Vec<Revision>,
    pub legal_text: Option<String>,
    pub watermark: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// HEADER / FOOTER
// ============================================================================

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeaderConfig {
    pub enabled: Option<bool>,
    pub left: Option<String>,
    pub center: Option<String>,
    pub right: Option<String>,
}

/// Footer configuration as written by the author. Explicit slots win over
/// shorthands; see `footer::resolve_footer_config`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FooterConfig {
    pub enabled: Option<bool>,
    pub left: Option<String>,
    pub center: Option<String>,
    pub right: Option<String>,

    // --- Shorthands ---
    pub text: Option<String>,
    pub copyright: Option<String>,
    #[serde(default)]
    pub show_page_numbers: bool,
    #[serde(default)]
    pub show_version: bool,
    #[serde(default)]
    pub show_date: bool,

    pub separator: Option<SeparatorConfig>,
    pub social_links: Option<SocialLinks>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeparatorConfig {
    pub enabled: Option<bool>,
    pub color: Option<Color>,
    pub thickness: Option<f32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SocialLinks {
    pub website: Option<String>,
    pub email: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub youtube: Option<String>,
}

// ============================================================================
// CONTENT
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Paragraph {
        text: String,
    },
    List {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default)]
        ordered: bool,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },
    Divider,
    Spacer {
        #[serde(default = "default_spacer_height")]
        height: f32,
    },
}

fn default_heading_level() -> u8 {
    1
}

fn default_spacer_height() -> f32 {
    12.0
}

// ============================================================================
// FIELDS
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Point {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

/// A field as it appears in the schema. `kind` stays a free string so that
/// unknown types can be reported and skipped instead of failing the parse.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub position: Point,
    pub width: Option<f32>,
    pub height: Option<f32>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    pub placeholder: Option<String>,
    #[serde(alias = "default")]
    pub default_value: Option<String>,
}

fn default_page() -> u32 {
    1
}

// ============================================================================
// COLOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn black() -> Self {
        Color::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Color::rgb(255, 255, 255)
    }

    /// Parse `#RRGGBB` or `#RGB` (leading `#` optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Color::rgb(digits.next()??, digits.next()??, digits.next()??))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channels scaled to 0.0..=1.0.
    pub fn to_unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

// Accepts either a hex string ("#1F3A5F") or an object ({"r":31,"g":58,"b":95}).
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};

        struct ColorVisitor;

        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a hex color string like \"#1F3A5F\" or an {r, g, b} object")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Color::from_hex(v).ok_or_else(|| de::Error::custom(format!("invalid color: {}", v)))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut color = Color::black();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "r" => color.r = map.next_value()?,
                        "g" => color.g = map.next_value()?,
                        "b" => color.b = map.next_value()?,
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(color)
            }
        }

        deserializer.deserialize_any(ColorVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_schema() {
        let schema: FormSchema = serde_json::from_str(
            r#"{
                "form": { "title": "Intake", "version": "2.0" },
                "fields": [
                    { "type": "text", "label": "Name", "position": { "x": 50, "y": -40 } },
                    {
                        "type": "checkbox", "label": "Agree", "page": 2,
                        "position": { "x": 50, "y": 600 }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.form.title, "Intake");
        assert_eq!(schema.fields[0].page, 1);
        assert_eq!(schema.fields[1].page, 2);
        assert_eq!(schema.declared_page_count(), 2);
        assert!(!schema.has_cover_page());
    }

    #[test]
    fn declared_pages_win_over_field_pages() {
        let schema: FormSchema = serde_json::from_str(
            r#"{ "form": { "title": "T", "pages": 2 },
                 "fields": [ { "type": "text", "page": 99 } ] }"#,
        )
        .unwrap();
        assert_eq!(schema.declared_page_count(), 2);
    }

    #[test]
    fn content_blocks_are_tagged_by_type() {
        let blocks: Vec<ContentBlock> = serde_json::from_str(
            r#"[ { "type": "heading", "text": "Intro" },
                 { "type": "divider" },
                 { "type": "spacer" } ]"#,
        )
        .unwrap();
        assert_eq!(blocks[0], ContentBlock::Heading { text: "Intro".into(), level: 1 });
        assert_eq!(blocks[1], ContentBlock::Divider);
        assert_eq!(blocks[2], ContentBlock::Spacer { height: 12.0 });
    }

    #[test]
    fn color_accepts_hex_and_object() {
        let a: Color = serde_json::from_str("\"#1F3A5F\"").unwrap();
        let b: Color = serde_json::from_str(r#"{"r":31,"g":58,"b":95}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(Color::from_hex("#fff"), Some(Color::white()));
        assert_eq!(a.to_hex(), "#1F3A5F");
        assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
    }
}
