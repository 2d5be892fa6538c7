//! # PDF Serializer
//!
//! Writes laid-out pages as a PDF 1.7 file. The writer is self-contained:
//! standard Type1 fonts with WinAnsiEncoding (nothing to embed), Flate
//! compressed content streams, image XObjects for the logo and URI link
//! annotations.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, ...
//! xref                <- byte offset of every object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Layout coordinates grow downwards from the top of the page; PDF user
//! space grows upwards from the bottom, so every y is flipped here.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::SgqPdfError;
use crate::font::{FontContext, FontKey, StandardFont};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, LinkAnnotation};
use crate::style::Color;

const PRODUCER: &str = concat!("sgq-pdf ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
pub struct PdfWriter;

struct PdfBuilder {
    /// Object bodies; the index is the object number. Slot 0 is unused.
    objects: Vec<Vec<u8>>,
    /// Standard fonts in use, referenced as /F0, /F1, ...
    fonts: Vec<(StandardFont, usize)>,
    /// Distinct images, referenced as /Im0, /Im1, ...
    images: Vec<(Arc<LoadedImage>, usize)>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn font_index(&self, font: StandardFont) -> usize {
        self.fonts.iter().position(|(f, _)| *f == font).unwrap_or(0)
    }

    fn image_index(&self, image: &Arc<LoadedImage>) -> Option<usize> {
        self.images.iter().position(|(i, _)| Arc::ptr_eq(i, image))
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize pages to PDF bytes.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        title: Option<&str>,
        fonts: &FontContext,
    ) -> Result<Vec<u8>, SgqPdfError> {
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            fonts: Vec::new(),
            images: Vec::new(),
        };

        self.register_fonts(&mut builder, pages, fonts);
        self.register_images(&mut builder, pages)?;

        let mut page_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let content = self.build_content_stream(page, &builder, fonts);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut data = Vec::new();
            write!(
                data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            )?;
            data.extend_from_slice(&compressed);
            data.extend_from_slice(b"\nendstream");
            let content_id = builder.push(data);

            let annot_ids: Vec<usize> = page
                .links
                .iter()
                .map(|link| builder.push(Self::link_annotation(link, page.height).into_bytes()))
                .collect();

            let mut page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R \
                 /Resources << /Font << {} >>",
                page.width,
                page.height,
                content_id,
                self.font_resources(&builder)
            );
            let xobjects = self.xobject_resources(page, &builder);
            if !xobjects.is_empty() {
                let _ = write!(page_dict, " /XObject << {} >>", xobjects);
            }
            page_dict.push_str(" >>");
            if !annot_ids.is_empty() {
                let refs: Vec<String> = annot_ids.iter().map(|id| format!("{} 0 R", id)).collect();
                let _ = write!(page_dict, " /Annots [{}]", refs.join(" "));
            }
            page_dict.push_str(" >>");
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_ids.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            let _ = write!(info, "/Title {} ", Self::text_string(title));
        }
        let _ = write!(info, "/Producer ({}) >>", PRODUCER);
        let info_id = builder.push(info.into_bytes());

        log::debug!(
            "Writing PDF: {} page(s), {} font(s), {} image(s)",
            pages.len(),
            builder.fonts.len(),
            builder.images.len()
        );
        self.serialize(&builder, info_id)
    }

    /// One font object per standard font used, in a stable order.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage], fonts: &FontContext) {
        let mut keys: Vec<&FontKey> = pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { font, .. } => Some(font),
                _ => None,
            })
            .collect();
        keys.sort();
        keys.dedup();

        let mut used: Vec<StandardFont> = Vec::new();
        for key in keys {
            let font = fonts.resolve(key);
            if !used.contains(&font) {
                used.push(font);
            }
        }
        if used.is_empty() {
            used.push(StandardFont::Helvetica);
        }

        for font in used {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let id = builder.push(dict.into_bytes());
            builder.fonts.push((font, id));
        }
    }

    /// One XObject per distinct image; the logo is shared by every page.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) -> Result<(), SgqPdfError> {
        for element in pages.iter().flat_map(|p| p.elements.iter()) {
            if let DrawCommand::Image { image } = &element.draw {
                if builder.image_index(image).is_none() {
                    let id = Self::write_image_xobject(builder, image)?;
                    builder.images.push((Arc::clone(image), id));
                }
            }
        }
        Ok(())
    }

    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> Result<usize, SgqPdfError> {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj = Vec::new();
                write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} \
                     /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space,
                    data.len()
                )?;
                obj.extend_from_slice(data);
                obj.extend_from_slice(b"\nendstream");
                Ok(builder.push(obj))
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask = match alpha {
                    Some(alpha) => {
                        let compressed = compress_to_vec_zlib(alpha, 6);
                        let mut obj = Vec::new();
                        write!(
                            obj,
                            "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode \
                             /Length {} >>\nstream\n",
                            image.width_px,
                            image.height_px,
                            compressed.len()
                        )?;
                        obj.extend_from_slice(&compressed);
                        obj.extend_from_slice(b"\nendstream");
                        Some(builder.push(obj))
                    }
                    None => None,
                };

                let compressed = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj = Vec::new();
                write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB \
                     /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len(),
                    smask_ref
                )?;
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                Ok(builder.push(obj))
            }
        }
    }

    fn font_resources(&self, builder: &PdfBuilder) -> String {
        builder
            .fonts
            .iter()
            .enumerate()
            .map(|(i, (_, id))| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn xobject_resources(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut used: Vec<usize> = page
            .elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Image { image } => builder.image_index(image),
                _ => None,
            })
            .collect();
        used.sort_unstable();
        used.dedup();
        used.iter()
            .map(|&i| format!("/Im{} {} 0 R", i, builder.images[i].1))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn link_annotation(link: &LinkAnnotation, page_height: f64) -> String {
        let x1 = link.x;
        let y1 = page_height - link.y - link.height;
        format!(
            "<< /Type /Annot /Subtype /Link /Rect [{:.2} {:.2} {:.2} {:.2}] /Border [0 0 0] \
             /A << /S /URI /URI ({}) >> >>",
            x1,
            y1,
            x1 + link.width,
            y1 + link.height,
            Self::escape_pdf_string(&link.uri)
        )
    }

    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder, fonts: &FontContext) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder, fonts);
        }
        stream
    }

    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        fonts: &FontContext,
    ) {
        match &element.draw {
            DrawCommand::Rect { background, border } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                let (w, h) = (element.width, element.height);

                if let Some(bg) = background {
                    let _ = write!(
                        stream,
                        "q\n{} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        Self::color(bg),
                        x,
                        y,
                        w,
                        h
                    );
                }
                if let Some(border) = border {
                    let _ = write!(
                        stream,
                        "q\n{} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        Self::color(&border.color),
                        border.width,
                        x,
                        y,
                        w,
                        h
                    );
                }
            }

            DrawCommand::Line { color, width } => {
                let _ = write!(
                    stream,
                    "q\n{} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    Self::color(color),
                    width,
                    element.x,
                    page_height - element.y,
                    element.x + element.width,
                    page_height - element.y - element.height
                );
            }

            DrawCommand::Text {
                text,
                font,
                font_size,
                color,
            } => {
                let index = builder.font_index(fonts.resolve(font));
                let _ = write!(
                    stream,
                    "BT\n{} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    Self::color(color),
                    index,
                    font_size,
                    element.x,
                    page_height - element.y,
                    Self::encode_winansi(text)
                );
            }

            DrawCommand::Image { image } => {
                if let Some(index) = builder.image_index(image) {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        element.width,
                        element.height,
                        element.x,
                        page_height - element.y - element.height,
                        index
                    );
                }
            }
        }
    }

    fn color(c: &Color) -> String {
        format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
    }

    /// Text as a literal string body in WinAnsiEncoding; bytes outside
    /// printable ASCII are written as octal escapes.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match Self::unicode_to_winansi(ch).unwrap_or(b'?') {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                b @ 0x20..=0x7E => out.push(b as char),
                b => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// A PDF text string: plain literal when ASCII, UTF-16BE hex otherwise.
    fn text_string(s: &str) -> String {
        if s.is_ascii() {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Map a character to its Windows-1252 byte, the basis of
    /// WinAnsiEncoding.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95),
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    fn serialize(&self, builder: &PdfBuilder, info_id: usize) -> Result<Vec<u8>, SgqPdfError> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            write!(output, "{} 0 obj\n", i)?;
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        write!(output, "xref\n0 {}\n", builder.objects.len())?;
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            write!(output, "{:010} 00000 n \n", offset)?;
        }

        write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_id,
            xref_offset
        )?;

        Ok(output)
    }
}
