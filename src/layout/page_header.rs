//! The running header drawn at the top of every page: logo, document title,
//! a two-line breadcrumb of the storage path, and a separator line.

use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::font::{FontContext, FontKey};
use crate::image_loader::LoadedImage;
use crate::text::{fit_line, wrap_text, TextMeasure};

use super::{DrawCommand, LayoutElement};

const HEADER_TOP: f64 = 20.0;
const LOGO_GAP: f64 = 10.0;
const BREADCRUMB_WIDTH: f64 = 200.0;
const TITLE_MAX_LINES: usize = 2;

/// Split a storage path into folder and file name. Backslashes are treated
/// as separators.
pub fn split_path(path: &str) -> (String, String) {
    let normalized = path.trim().replace('\\', "/");
    match normalized.rsplit_once('/') {
        Some((folder, file)) => (folder.trim_matches('/').to_string(), file.to_string()),
        None => (String::new(), normalized),
    }
}

pub fn build_page_header(
    config: &LayoutConfig,
    fonts: &FontContext,
    title: &str,
    file_path: &str,
    logo: Option<&Arc<LoadedImage>>,
) -> Vec<LayoutElement> {
    let mut elements = Vec::new();
    let left = config.margin_left;
    let right = config.page_width - config.margin_right;

    let mut title_x = left;
    if let Some(image) = logo {
        let (width, height) = image.fit_within(config.logo_max_width, config.logo_max_height);
        elements.push(LayoutElement {
            x: left,
            y: HEADER_TOP,
            width,
            height,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
        });
        title_x += width + LOGO_GAP;
    }

    let bold = FontKey::bold(&config.font_family);
    let bold_metrics = fonts.metrics(&bold);
    let title_size = config.title_font_size;
    let title_width = (right - BREADCRUMB_WIDTH - LOGO_GAP - title_x).max(0.0);
    let mut lines = wrap_text(title, bold_metrics, title_size, title_width);
    if lines.len() > TITLE_MAX_LINES {
        let rest = lines[TITLE_MAX_LINES - 1..].join(" ");
        lines.truncate(TITLE_MAX_LINES - 1);
        lines.push(rest);
    }
    for (i, line) in lines.iter().enumerate() {
        let text = fit_line(line, bold_metrics, title_size, title_width);
        if text.is_empty() {
            continue;
        }
        let width = bold_metrics.measure(&text, title_size);
        elements.push(LayoutElement {
            x: title_x,
            y: HEADER_TOP + title_size + i as f64 * title_size * 1.2,
            width,
            height: title_size,
            draw: DrawCommand::Text {
                text,
                font: bold.clone(),
                font_size: title_size,
                color: config.text_color,
            },
        });
    }

    let regular = FontKey::regular(&config.font_family);
    let regular_metrics = fonts.metrics(&regular);
    let crumb_size = config.breadcrumb_font_size;
    let (folder, file) = split_path(file_path);
    for (i, line) in [folder, file].iter().enumerate() {
        let text = fit_line(line, regular_metrics, crumb_size, BREADCRUMB_WIDTH);
        if text.is_empty() {
            continue;
        }
        let width = regular_metrics.measure(&text, crumb_size);
        elements.push(LayoutElement {
            x: right - width,
            y: HEADER_TOP + crumb_size + i as f64 * (crumb_size + 3.0),
            width,
            height: crumb_size,
            draw: DrawCommand::Text {
                text,
                font: regular.clone(),
                font_size: crumb_size,
                color: config.muted_color,
            },
        });
    }

    elements.push(LayoutElement {
        x: left,
        y: config.header_height - 10.0,
        width: right - left,
        height: 0.0,
        draw: DrawCommand::Line {
            color: config.muted_color,
            width: 0.5,
        },
    });

    elements
}
