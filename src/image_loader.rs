//! # Logo Loading
//!
//! Loads the organization logo from a data URI, raw base64 or a file path
//! and prepares it for PDF embedding. JPEG bytes pass through untouched
//! (DCTDecode); PNG is decoded to RGB with a separate alpha channel for the
//! soft mask.

use std::io::Cursor;

use base64::Engine;

use crate::error::SgqPdfError;

/// A decoded image ready for embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG stream, embedded as is.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// RGB pixels, plus alpha when any pixel is not opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl LoadedImage {
    /// Largest `(width, height)` with the image's aspect ratio that fits in
    /// the given box. Images are never scaled up past one pixel per point.
    pub fn fit_within(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let w = self.width_px.max(1) as f64;
        let h = self.height_px.max(1) as f64;
        let scale = (max_width / w).min(max_height / h).min(1.0);
        (w * scale, h * scale)
    }
}

/// Load an image from a data URI, a file path or raw base64.
pub fn load_image(src: &str) -> Result<LoadedImage, SgqPdfError> {
    let src = src.trim();
    if src.starts_with("data:image/svg") {
        return Err(SgqPdfError::ImageError(
            "SVG logos are not supported, use PNG or JPEG".to_string(),
        ));
    }
    let bytes = read_source_bytes(src)?;
    decode_image_bytes(&bytes)
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, SgqPdfError> {
    if src.starts_with("data:image/") {
        let comma = src
            .find(',')
            .ok_or_else(|| SgqPdfError::ImageError("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma + 1..]);
    }

    // Base64 contains '/', so only explicit path prefixes are read from disk.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src).map_err(|e| {
                SgqPdfError::ImageError(format!("Failed to read image file '{}': {}", src, e))
            });
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(SgqPdfError::ImageError(format!(
                "File path images are not available in WASM: '{}'",
                src
            )));
        }
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, SgqPdfError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| SgqPdfError::ImageError(format!("Base64 decode error: {}", e)))
}

/// Sniff the format from magic bytes and decode.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, SgqPdfError> {
    if data.len() < 4 {
        return Err(SgqPdfError::ImageError("Image data too short".to_string()));
    }
    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else if looks_like_svg(data) {
        Err(SgqPdfError::ImageError(
            "SVG logos are not supported, use PNG or JPEG".to_string(),
        ))
    } else {
        Err(SgqPdfError::ImageError(
            "Unsupported image format (expected JPEG or PNG)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
}

fn is_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, 0x50, 0x4E, 0x47])
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&data[..data.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, SgqPdfError> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| SgqPdfError::ImageError(format!("JPEG format detection error: {}", e)))?
        .into_dimensions()
        .map_err(|e| SgqPdfError::ImageError(format!("Failed to read JPEG dimensions: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Walk the JPEG markers to the start-of-frame segment and read its
/// component count.
fn jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    JpegColorSpace::DeviceRGB
}

fn decode_png(data: &[u8]) -> Result<LoadedImage, SgqPdfError> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| SgqPdfError::ImageError(format!("PNG format detection error: {}", e)))?
        .decode()
        .map_err(|e| SgqPdfError::ImageError(format!("Failed to decode PNG: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if opaque { None } else { Some(alpha) },
        },
        width_px: width,
        height_px: height,
    })
}
