//! # Font Management
//!
//! The renderer only uses the standard PDF fonts, which need no embedding.
//! A font is selected by family name and boldness; unknown families fall
//! back to Helvetica.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// Identifies a font face used by a text run.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

impl FontKey {
    pub fn regular(family: &str) -> Self {
        Self {
            family: family.to_string(),
            bold: false,
        }
    }

    pub fn bold(family: &str) -> Self {
        Self {
            family: family.to_string(),
            bold: true,
        }
    }
}

/// The standard PDF fonts we have metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
            Self::Courier | Self::CourierBold => &metrics::COURIER,
        }
    }
}

/// Shared font context used by layout and PDF serialization.
#[derive(Debug, Default)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a font key to a standard font, falling back to Helvetica.
    pub fn resolve(&self, key: &FontKey) -> StandardFont {
        match (key.family.to_ascii_lowercase().as_str(), key.bold) {
            ("helvetica", false) => StandardFont::Helvetica,
            ("helvetica", true) => StandardFont::HelveticaBold,
            ("courier", false) => StandardFont::Courier,
            ("courier", true) => StandardFont::CourierBold,
            (other, bold) => {
                log::debug!("Unknown font family '{}', using Helvetica", other);
                if bold {
                    StandardFont::HelveticaBold
                } else {
                    StandardFont::Helvetica
                }
            }
        }
    }

    /// Metrics provider for a font key.
    pub fn metrics(&self, key: &FontKey) -> &'static StandardFontMetrics {
        self.resolve(key).metrics()
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        self.metrics(key).measure_string(text, font_size, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_is_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("Responsável", &FontKey::regular("Helvetica"), 12.0);
        let bold = ctx.measure_string("Responsável", &FontKey::bold("Helvetica"), 12.0);
        assert!(bold > regular, "Bold text should be wider than regular");
    }

    #[test]
    fn unknown_family_falls_back_to_helvetica() {
        let ctx = FontContext::new();
        let w1 = ctx.measure_string("A", &FontKey::regular("Helvetica"), 12.0);
        let w2 = ctx.measure_string("A", &FontKey::regular("Comic Sans"), 12.0);
        assert!((w1 - w2).abs() < 0.001);
        assert_eq!(
            ctx.resolve(&FontKey::bold("Comic Sans")),
            StandardFont::HelveticaBold
        );
    }

    #[test]
    fn family_match_is_case_insensitive() {
        let ctx = FontContext::new();
        assert_eq!(ctx.resolve(&FontKey::regular("COURIER")), StandardFont::Courier);
    }
}
