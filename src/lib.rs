//! Form-schema layout engine.
//!
//! A declarative [`FormSchema`] plus a [`ResolvedStylesheet`] is laid out
//! once per call and rendered to one of three targets:
//!
//! - [`generate_pdf`]: fixed canvas, absolute x/y per physical page.
//! - [`generate_html`]: absolutely positioned page containers with native
//!   form controls.
//! - [`generate_docx`]: a flow document of paragraphs, tables, fields and
//!   page breaks for a word processor to lay out.
//!
//! All three share the same stylesheet resolution, text estimation, footer
//! templates, page mapping, and field ordering.

pub mod assets;
pub mod compose;
pub mod content;
pub mod context;
pub mod error;
pub mod fields;
pub mod footer;
pub mod overlap;
pub mod pagination;
pub mod placement;
pub mod render;
pub mod schema;
pub mod stylesheet;
pub mod text;

pub use error::{AssetError, GenerateError};
pub use render::{generate_docx, generate_html, generate_pdf, FlowDocument, HtmlOutput, PdfOutput};
pub use schema::FormSchema;
pub use stylesheet::{resolve_stylesheet, ResolvedStylesheet, StylesheetSource};
