//! Output backends.
//!
//! `pdf` and `html` implement [`Surface`](crate::context::Surface) and run the
//! shared composition; `docx` builds a flow document from the same resolved
//! pieces.

pub mod docx;
pub mod html;
pub mod pdf;

pub use docx::{generate_docx, FlowDocument};
pub use html::{generate_html, HtmlOutput};
pub use pdf::{generate_pdf, PdfOutput};
