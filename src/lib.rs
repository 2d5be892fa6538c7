//! # sgq-pdf
//!
//! Print-ready PDF rendering for quality-management procedure records.
//!
//! A record is a handful of fixed tables (the procedure or process content,
//! observations or indicators, and the change history) that must paginate
//! cleanly onto fixed-size pages: rows grow with their wrapped text, merged
//! cells span several rows, headers repeat on every continuation page, and a
//! row taller than a whole page is split into chunks instead of overflowing.
//! Every page carries the same running header with the logo, the title and
//! the storage path.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — templates, rows, merges, history, config
//!       ↓
//!   [text]     — measurement and line wrapping
//!       ↓
//!   [layout]   — row heights, page breaks, tables, running header
//!       ↓
//!   [pdf]      — serialize to PDF bytes
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::SgqPdfError;

use font::FontContext;
use layout::{LayoutEngine, LayoutPage};
use model::ProcedureDocument;
use pdf::PdfWriter;

/// Lay out a document into pages without serializing it.
pub fn layout(document: &ProcedureDocument) -> Result<Vec<LayoutPage>, SgqPdfError> {
    document.config.validate()?;
    let font_context = FontContext::new();
    let engine = LayoutEngine::new(document.config.clone());
    Ok(engine.layout(document, &font_context))
}

/// Render a document to PDF bytes.
pub fn render(document: &ProcedureDocument) -> Result<Vec<u8>, SgqPdfError> {
    let pages = layout(document)?;
    let font_context = FontContext::new();
    PdfWriter::new().write(&pages, Some(&document.title), &font_context)
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, SgqPdfError> {
    let document: ProcedureDocument = serde_json::from_str(json)?;
    render(&document)
}
