//! Structured error types for the sgq-pdf renderer.
//!
//! The layout engine itself never fails on content shape. Errors come from
//! the edges: JSON parsing, an invalid layout configuration, image decoding
//! and file I/O in the CLI.

use thiserror::Error;

/// The unified error type returned by all public sgq-pdf API functions.
#[derive(Debug, Error)]
pub enum SgqPdfError {
    /// JSON input failed to parse as a valid procedure document.
    #[error("Failed to parse document: {source}{}", render_hint(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// The layout configuration cannot produce a usable page.
    #[error("Invalid layout configuration: {0}")]
    ConfigError(String),
    /// An image could not be decoded.
    #[error("Image error: {0}")]
    ImageError(String),
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn render_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for SgqPdfError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the procedure document schema. Check \"template.type\" and field names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        SgqPdfError::ParseError { source: e, hint }
    }
}
