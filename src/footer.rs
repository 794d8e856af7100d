//! Header/footer resolution and template substitution.
//!
//! A footer is resolved once per generation run. Static variables are filled
//! in immediately; `{{page}}` and `{{pages}}` survive until each page is drawn.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::schema::{Color, FooterConfig, FormMetadata, HeaderConfig, SocialLinks};

pub const PAGE_NUMBER_TEMPLATE: &str = "Page {{page}} of {{pages}}";
pub const DATE_TOKEN: &str = "{{date}}";
pub const PAGE_TOKEN: &str = "{{page}}";
pub const PAGES_TOKEN: &str = "{{pages}}";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// RESOLVED TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Separator {
    pub enabled: bool,
    pub color: Color,
    pub thickness: f32,
}

impl Separator {
    fn standard() -> Self {
        Separator { enabled: true, color: Color::rgb(0xCC, 0xCC, 0xCC), thickness: 0.5 }
    }

    fn disabled() -> Self {
        Separator { enabled: false, ..Separator::standard() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Website,
    Email,
    Github,
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
    Youtube,
}

impl SocialPlatform {
    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Website => "Web",
            SocialPlatform::Email => "Email",
            SocialPlatform::Github => "GitHub",
            SocialPlatform::Linkedin => "LinkedIn",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Youtube => "YouTube",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

impl SocialLink {
    /// "GitHub: https://github.com/acme"
    pub fn display(&self) -> String {
        format!("{}: {}", self.platform.label(), self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFooter {
    pub enabled: bool,
    pub left: String,
    pub center: String,
    pub right: String,
    pub separator: Separator,
    pub social_links: Vec<SocialLink>,
}

impl ResolvedFooter {
    pub fn disabled() -> Self {
        ResolvedFooter {
            enabled: false,
            left: String::new(),
            center: String::new(),
            right: String::new(),
            separator: Separator::disabled(),
            social_links: Vec::new(),
        }
    }

    /// (left, center, right) with per-page variables filled in.
    pub fn for_page(&self, page: usize, pages: usize) -> (String, String, String) {
        (
            render_page_template(&self.left, page, pages),
            render_page_template(&self.center, page, pages),
            render_page_template(&self.right, page, pages),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedHeader {
    pub enabled: bool,
    pub left: String,
    pub center: String,
    pub right: String,
}

impl ResolvedHeader {
    pub fn for_page(&self, page: usize, pages: usize) -> (String, String, String) {
        (
            render_page_template(&self.left, page, pages),
            render_page_template(&self.center, page, pages),
            render_page_template(&self.right, page, pages),
        )
    }
}

// ============================================================================
// FOOTER RESOLUTION
// ============================================================================

pub fn resolve_footer_config(footer: Option<&FooterConfig>, form: &FormMetadata) -> ResolvedFooter {
    resolve_footer_config_on(footer, form, Local::now().date_naive())
}

/// Resolve the footer as of `today`. Identical inputs yield identical output.
pub fn resolve_footer_config_on(
    footer: Option<&FooterConfig>,
    form: &FormMetadata,
    today: NaiveDate,
) -> ResolvedFooter {
    let Some(config) = footer else {
        return legacy_footer(form);
    };

    if config.enabled == Some(false) {
        return ResolvedFooter::disabled();
    }

    let non_empty = |s: &Option<String>| s.clone().filter(|v| !v.is_empty());

    let mut left = non_empty(&config.left).unwrap_or_default();
    let mut center = non_empty(&config.center).unwrap_or_default();
    let mut right = non_empty(&config.right).unwrap_or_default();

    if center.is_empty() {
        if let Some(text) = non_empty(&config.text) {
            center = text;
        }
    }

    if left.is_empty() {
        if let Some(copyright) = non_empty(&config.copyright) {
            left = copyright;
        }
    }

    if config.show_page_numbers && right.is_empty() {
        right = PAGE_NUMBER_TEMPLATE.to_string();
    }

    if config.show_version {
        if let Some(version) = form.version() {
            append(&mut center, &format!("Version {}", version), " - ");
        }
    }

    if config.show_date {
        if left.is_empty() {
            left = DATE_TOKEN.to_string();
        } else if right.is_empty() {
            right = DATE_TOKEN.to_string();
        } else {
            append(&mut center, DATE_TOKEN, " | ");
        }
    }

    let vars = StaticVars::new(form, today);
    let left = vars.substitute(&left);
    let center = vars.substitute(&center);
    let right = vars.substitute(&right);

    let social_links = config
        .social_links
        .as_ref()
        .map(collect_social_links)
        .unwrap_or_default();

    let enabled = !left.is_empty()
        || !center.is_empty()
        || !right.is_empty()
        || !social_links.is_empty();

    let separator = match (&config.separator, enabled) {
        (_, false) => Separator::disabled(),
        (None, true) => Separator::standard(),
        (Some(sep), true) => {
            let base = Separator::standard();
            Separator {
                enabled: sep.enabled.unwrap_or(base.enabled),
                color: sep.color.unwrap_or(base.color),
                thickness: sep.thickness.filter(|t| *t > 0.0).unwrap_or(base.thickness),
            }
        }
    };

    ResolvedFooter { enabled, left, center, right, separator, social_links }
}

fn legacy_footer(form: &FormMetadata) -> ResolvedFooter {
    match form.version() {
        Some(version) => ResolvedFooter {
            enabled: true,
            left: String::new(),
            center: format!("Version {}", version),
            right: String::new(),
            separator: Separator::standard(),
            social_links: Vec::new(),
        },
        None => ResolvedFooter::disabled(),
    }
}

fn append(slot: &mut String, value: &str, joiner: &str) {
    if !slot.is_empty() {
        slot.push_str(joiner);
    }
    slot.push_str(value);
}

fn collect_social_links(links: &SocialLinks) -> Vec<SocialLink> {
    [
        (SocialPlatform::Website, &links.website),
        (SocialPlatform::Email, &links.email),
        (SocialPlatform::Github, &links.github),
        (SocialPlatform::Linkedin, &links.linkedin),
        (SocialPlatform::Twitter, &links.twitter),
        (SocialPlatform::Facebook, &links.facebook),
        (SocialPlatform::Instagram, &links.instagram),
        (SocialPlatform::Youtube, &links.youtube),
    ]
    .into_iter()
    .filter_map(|(platform, url)| {
        url.as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| SocialLink { platform, url: u.to_string() })
    })
    .collect()
}

// ============================================================================
// HEADER RESOLUTION
// ============================================================================

pub fn resolve_header_config(header: Option<&HeaderConfig>, form: &FormMetadata) -> ResolvedHeader {
    resolve_header_config_on(header, form, Local::now().date_naive())
}

/// Absent config shows the form title on the left; `enabled: false` hides
/// the header entirely.
pub fn resolve_header_config_on(
    header: Option<&HeaderConfig>,
    form: &FormMetadata,
    today: NaiveDate,
) -> ResolvedHeader {
    let vars = StaticVars::new(form, today);

    let (left, center, right) = match header {
        None => (form.title.clone(), String::new(), String::new()),
        Some(config) if config.enabled == Some(false) => {
            (String::new(), String::new(), String::new())
        }
        Some(config) => (
            config.left.clone().unwrap_or_default(),
            config.center.clone().unwrap_or_default(),
            config.right.clone().unwrap_or_default(),
        ),
    };

    let left = vars.substitute(&left);
    let center = vars.substitute(&center);
    let right = vars.substitute(&right);
    let enabled = !left.is_empty() || !center.is_empty() || !right.is_empty();

    ResolvedHeader { enabled, left, center, right }
}

// ============================================================================
// TEMPLATES
// ============================================================================

struct StaticVars {
    title: String,
    version: String,
    author: String,
    date: String,
}

impl StaticVars {
    fn new(form: &FormMetadata, today: NaiveDate) -> Self {
        StaticVars {
            title: form.title.clone(),
            version: form.version().unwrap_or_default().to_string(),
            author: form.author.clone().unwrap_or_default(),
            date: today.format(DATE_FORMAT).to_string(),
        }
    }

    fn substitute(&self, template: &str) -> String {
        template
            .replace("{{title}}", &self.title)
            .replace("{{version}}", &self.version)
            .replace("{{author}}", &self.author)
            .replace(DATE_TOKEN, &self.date)
    }
}

/// Fill in `{{page}}` and `{{pages}}`.
pub fn render_page_template(template: &str, page: usize, pages: usize) -> String {
    template
        .replace(PAGE_TOKEN, &page.to_string())
        .replace(PAGES_TOKEN, &pages.to_string())
}

/// Split a template into literal text and per-page tokens, for backends that
/// resolve page numbers natively.
pub fn template_segments(template: &str) -> Vec<TemplateSegment> {
    let mut segments = Vec::new();
    let mut rest = template;

    loop {
        let next = [(PAGE_TOKEN, TemplateSegment::Page), (PAGES_TOKEN, TemplateSegment::Pages)]
            .into_iter()
            .filter_map(|(token, seg)| rest.find(token).map(|at| (at, token, seg)))
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, token, seg)) => {
                if at > 0 {
                    segments.push(TemplateSegment::Text(rest[..at].to_string()));
                }
                segments.push(seg);
                rest = &rest[at + token.len()..];
            }
            None => {
                if !rest.is_empty() {
                    segments.push(TemplateSegment::Text(rest.to_string()));
                }
                return segments;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSegment {
    Text(String),
    Page,
    Pages,
}
