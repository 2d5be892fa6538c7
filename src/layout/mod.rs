//! # Page-Aware Layout Engine
//!
//! Turns a procedure document into fixed-size pages of absolutely
//! positioned draw commands. There is no infinite canvas that gets sliced
//! afterwards: tables are laid out directly onto a page cursor, and before
//! each block of rows is placed we ask whether it fits.
//!
//! 1. Open a page with the running header already drawn.
//! 2. Reserve the table header if this table has not drawn it on the page.
//! 3. Place every whole block of rows that fits.
//! 4. If nothing fits but an empty page would hold the block, start a new
//!    page and repeat the table header there.
//! 5. A block taller than an empty page is split: merged blocks dissolve
//!    into single rows, and a single row is cut into line chunks.
//!
//! Tables are drawn one after another on the same cursor, so each table
//! continues where the previous one ended.

pub mod page_break;
pub mod page_header;
pub mod row_height;
pub mod table;

use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::font::{FontContext, FontKey};
use crate::image_loader::{load_image, LoadedImage};
use crate::model::{
    HistoryEntry, ProcedureDocument, ProcedureTemplate, ProcessTemplate, Row, TemplateContent,
};
use crate::style::{Color, TextAlign};
use crate::text::TextMeasure;

use table::{TableRenderer, TableSpec};

/// A finished page.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
    pub links: Vec<LinkAnnotation>,
}

impl LayoutPage {
    /// All text runs on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = (&LayoutElement, &str)> {
        self.elements.iter().filter_map(|el| match &el.draw {
            DrawCommand::Text { text, .. } => Some((el, text.as_str())),
            _ => None,
        })
    }
}

/// A positioned element. Coordinates are in points from the top-left
/// corner of the page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    /// Top edge for boxes and images, baseline for text.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Filled and/or stroked rectangle.
    Rect {
        background: Option<Color>,
        border: Option<Border>,
    },
    /// Straight line from `(x, y)` to `(x + width, y + height)`.
    Line { color: Color, width: f64 },
    /// A single line of text starting at `(x, y)`.
    Text {
        text: String,
        font: FontKey,
        font_size: f64,
        color: Color,
    },
    Image { image: Arc<LoadedImage> },
}

/// A clickable area that opens `uri`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub uri: String,
}

/// Write position on the page being built.
#[derive(Debug, Clone)]
pub(crate) struct PageCursor {
    width: f64,
    height: f64,
    content_top: f64,
    content_bottom: f64,
    pub y: f64,
    pub elements: Vec<LayoutElement>,
    pub links: Vec<LinkAnnotation>,
    /// Running header copied onto every page.
    fixed_header: Vec<LayoutElement>,
}

impl PageCursor {
    pub fn new(config: &LayoutConfig, fixed_header: Vec<LayoutElement>) -> Self {
        Self {
            width: config.page_width,
            height: config.page_height,
            content_top: config.content_top(),
            content_bottom: config.content_bottom(),
            y: config.content_top(),
            elements: fixed_header.clone(),
            links: Vec::new(),
            fixed_header,
        }
    }

    pub fn remaining_height(&self) -> f64 {
        (self.content_bottom - self.y).max(0.0)
    }

    /// Space an empty page offers.
    pub fn fresh_capacity(&self) -> f64 {
        self.content_bottom - self.content_top
    }

    /// Nothing has been placed below the running header yet.
    pub fn is_fresh(&self) -> bool {
        self.y <= self.content_top
    }

    /// Move down by `gap`, without passing the bottom of the content area.
    pub fn advance(&mut self, gap: f64) {
        self.y = (self.y + gap).min(self.content_bottom);
    }

    pub fn push(&mut self, element: LayoutElement) {
        self.elements.push(element);
    }

    pub fn push_link(&mut self, link: LinkAnnotation) {
        self.links.push(link);
    }

    pub fn finalize(&self) -> LayoutPage {
        LayoutPage {
            width: self.width,
            height: self.height,
            elements: self.elements.clone(),
            links: self.links.clone(),
        }
    }

    pub fn new_page(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            content_top: self.content_top,
            content_bottom: self.content_bottom,
            y: self.content_top,
            elements: self.fixed_header.clone(),
            links: Vec::new(),
            fixed_header: self.fixed_header.clone(),
        }
    }
}

/// Close the current page and continue on a new one.
pub(crate) fn break_page(cursor: &mut PageCursor, pages: &mut Vec<LayoutPage>) {
    pages.push(cursor.finalize());
    *cursor = cursor.new_page();
    log::debug!("Starting page {}", pages.len() + 1);
}

/// Height of the history section title block, separator line included.
const SECTION_TITLE_HEIGHT: f64 = 20.0;

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Lay out a document into pages.
    pub fn layout(&self, document: &ProcedureDocument, fonts: &FontContext) -> Vec<LayoutPage> {
        let config = &self.config;
        let logo = document.logo.as_deref().and_then(|src| match load_image(src) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                log::warn!("Skipping logo: {}", e);
                None
            }
        });

        let header = page_header::build_page_header(
            config,
            fonts,
            &document.title,
            &document.file_path,
            logo.as_ref(),
        );

        let mut pages: Vec<LayoutPage> = Vec::new();
        let mut cursor = PageCursor::new(config, header);
        let renderer = TableRenderer::new(config, fonts);

        for spec in self.content_tables(&document.template) {
            if !cursor.is_fresh() {
                cursor.advance(config.section_gap);
            }
            renderer.layout_table(&spec, &mut cursor, &mut pages);
        }

        if !document.history.is_empty() {
            self.layout_history(&document.history, &renderer, fonts, &mut cursor, &mut pages);
        }

        pages.push(cursor.finalize());

        if config.page_numbers {
            self.number_pages(&mut pages, fonts);
        }

        log::debug!("Laid out {} page(s)", pages.len());
        pages
    }

    /// The content tables of a template, in drawing order.
    fn content_tables(&self, template: &TemplateContent) -> Vec<TableSpec> {
        match template {
            TemplateContent::Procedure(t) => self.procedure_tables(t),
            TemplateContent::Process(t) => self.process_tables(t),
        }
    }

    fn procedure_tables(&self, template: &ProcedureTemplate) -> Vec<TableSpec> {
        let config = &self.config;
        vec![
            TableSpec::with_header("main table", &config.main_table, template.main_table.clone()),
            TableSpec::with_header(
                "observations",
                &config.observations,
                template.observations.clone(),
            )
            .align_header(TextAlign::Left),
        ]
    }

    fn process_tables(&self, template: &ProcessTemplate) -> Vec<TableSpec> {
        let config = &self.config;
        let values = [
            &template.owner,
            &template.objective,
            &template.input_services,
            &template.output_service,
        ];
        let header_rows: Vec<Row> = config
            .process_header
            .labels
            .iter()
            .zip(values)
            .map(|(label, value)| vec![label.clone(), value.clone()])
            .collect();

        let process_header = TableSpec {
            name: "process header".to_string(),
            column_widths: config.process_header.widths.clone(),
            header: None,
            header_align: TextAlign::Left,
            shaded_columns: vec![0],
            rows: header_rows,
            merges: None,
        };

        let mut activities =
            TableSpec::with_header("activities", &config.activities, template.activities.clone());
        activities.merges = Some(template.merge.clone());

        let indicators = TableSpec::with_header(
            "indicators",
            &config.indicators,
            template.indicators.0.iter().map(|s| vec![s.clone()]).collect(),
        )
        .align_header(TextAlign::Left);

        vec![process_header, activities, indicators]
    }

    /// The change history: separator, section title and table. Starts a new
    /// page when the title, header and first few rows would not fit.
    fn layout_history(
        &self,
        history: &[HistoryEntry],
        renderer: &TableRenderer,
        fonts: &FontContext,
        cursor: &mut PageCursor,
        pages: &mut Vec<LayoutPage>,
    ) {
        let config = &self.config;
        let spec = TableSpec::with_header(
            "history",
            &config.history,
            history.iter().map(HistoryEntry::to_row).collect(),
        );
        let mut table = renderer.prepare(&spec);

        let lead_rows: f64 = table.heights().iter().take(config.history_min_rows).sum();
        let needed = config.section_gap
            + SECTION_TITLE_HEIGHT
            + table.header_height()
            + lead_rows
            + config.safety_margin;
        if !cursor.is_fresh() {
            if cursor.remaining_height() < needed {
                break_page(cursor, pages);
            } else {
                cursor.advance(config.section_gap);
            }
        }

        let x = config.margin_left;
        let top = cursor.y;
        cursor.push(LayoutElement {
            x,
            y: top,
            width: config.content_width(),
            height: 0.0,
            draw: DrawCommand::Line {
                color: config.grid_color,
                width: 1.0,
            },
        });

        let title_font = FontKey::bold(&config.font_family);
        let title_size = config.header_font_size + 2.0;
        let width = fonts.metrics(&title_font).measure(&config.history_title, title_size);
        cursor.push(LayoutElement {
            x,
            y: top + SECTION_TITLE_HEIGHT - 6.0,
            width,
            height: title_size,
            draw: DrawCommand::Text {
                text: config.history_title.clone(),
                font: title_font,
                font_size: title_size,
                color: config.text_color,
            },
        });
        cursor.y = top + SECTION_TITLE_HEIGHT;

        renderer.flow(&mut table, cursor, pages);
    }

    /// Add "Página X de Y" centered in the bottom margin of every page.
    fn number_pages(&self, pages: &mut [LayoutPage], fonts: &FontContext) {
        let config = &self.config;
        let font = FontKey::regular(&config.font_family);
        let metrics = fonts.metrics(&font);
        let total = pages.len();

        for (i, page) in pages.iter_mut().enumerate() {
            let text = format!("Página {} de {}", i + 1, total);
            let width = metrics.measure(&text, config.footer_font_size);
            page.elements.push(LayoutElement {
                x: (page.width - width) / 2.0,
                y: page.height - config.bottom_margin / 2.0,
                width,
                height: config.footer_font_size,
                draw: DrawCommand::Text {
                    text,
                    font: font.clone(),
                    font_size: config.footer_font_size,
                    color: config.muted_color,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Indicators, MergeSpec};

    fn procedure(main: Vec<Row>, observations: Vec<Row>) -> ProcedureDocument {
        ProcedureDocument::new(
            "PR-07 Auditorias Internas",
            "Qualidade/Procedimentos/PR-07.pdf",
            TemplateContent::Procedure(ProcedureTemplate {
                main_table: main,
                observations,
            }),
        )
    }

    fn layout(doc: &ProcedureDocument) -> Vec<LayoutPage> {
        LayoutEngine::new(doc.config.clone()).layout(doc, &FontContext::new())
    }

    fn count_text(pages: &[LayoutPage], needle: &str) -> usize {
        pages
            .iter()
            .flat_map(|p| p.texts())
            .filter(|(_, t)| *t == needle)
            .count()
    }

    #[test]
    fn cursor_starts_below_header() {
        let config = LayoutConfig::default();
        let cursor = PageCursor::new(&config, Vec::new());
        assert!(cursor.is_fresh());
        assert_eq!(cursor.remaining_height(), 670.0);
        assert_eq!(cursor.fresh_capacity(), 670.0);
    }

    #[test]
    fn new_page_repeats_fixed_header() {
        let config = LayoutConfig::default();
        let header = vec![LayoutElement {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            draw: DrawCommand::Rect {
                background: None,
                border: None,
            },
        }];
        let mut cursor = PageCursor::new(&config, header);
        cursor.y = 500.0;
        let next = cursor.new_page();
        assert!(next.is_fresh());
        assert_eq!(next.elements.len(), 1);
    }

    #[test]
    fn advance_stops_at_content_bottom() {
        let config = LayoutConfig::default();
        let mut cursor = PageCursor::new(&config, Vec::new());
        cursor.advance(5000.0);
        assert_eq!(cursor.remaining_height(), 0.0);
    }

    #[test]
    fn empty_procedure_is_one_page_with_headers() {
        let pages = layout(&procedure(vec![], vec![]));
        assert_eq!(pages.len(), 1);
        assert_eq!(count_text(&pages, "Entradas"), 1);
        assert_eq!(count_text(&pages, "Observações"), 1);
        assert_eq!(count_text(&pages, "Página 1 de 1"), 1);
    }

    #[test]
    fn no_history_section_without_entries() {
        let pages = layout(&procedure(vec![vec!["a".into()]], vec![]));
        assert_eq!(count_text(&pages, "Histórico de Alterações"), 0);
    }

    #[test]
    fn history_section_follows_content() {
        let mut doc = procedure(vec![vec!["a".into()]], vec![]);
        doc.history.push(HistoryEntry {
            date: "2024-05-01".into(),
            user: "rui".into(),
            action: "Criação".into(),
            description: "Documento criado".into(),
        });
        let pages = layout(&doc);
        assert_eq!(pages.len(), 1);
        assert_eq!(count_text(&pages, "Histórico de Alterações"), 1);
        assert_eq!(count_text(&pages, "Mudou de"), 1);
        assert_eq!(count_text(&pages, "Documento criado"), 1);
    }

    #[test]
    fn history_moves_to_next_page_when_lead_rows_do_not_fit() {
        let config = LayoutConfig::default();
        // Main table ends at 126 + 20 * 26 = 646, observations at 710, which
        // leaves 50pt: room for the title, not for title + header + 3 rows.
        let main: Vec<Row> = (0..20).map(|i| vec![format!("M{}", i)]).collect();
        let mut doc = procedure(main, vec![]);
        for i in 0..3 {
            doc.history.push(HistoryEntry {
                date: "2024-05-10".into(),
                user: "rui".into(),
                action: "Alteração".into(),
                description: format!("Revisão {}", i),
            });
        }
        let pages = layout(&doc);
        assert_eq!(pages.len(), 2);

        let on_page = |page: &LayoutPage, needle: &str| page.texts().any(|(_, t)| t == needle);
        assert!(on_page(&pages[0], "M19"));
        assert!(on_page(&pages[0], "Observações"));
        for needle in ["Histórico de Alterações", "Mudou de", "Revisão 0"] {
            assert!(!on_page(&pages[0], needle), "{} on page 1", needle);
            assert!(on_page(&pages[1], needle), "{} missing on page 2", needle);
        }
        assert!(!pages[0]
            .elements
            .iter()
            .any(|el| el.y >= config.content_top() && matches!(el.draw, DrawCommand::Line { .. })));

        let first = pages[1]
            .elements
            .iter()
            .find(|el| el.y >= config.content_top())
            .unwrap();
        assert!(matches!(first.draw, DrawCommand::Line { .. }));
        assert_eq!(first.y, config.content_top());
    }

    #[test]
    fn process_template_draws_all_tables() {
        let mut merge = MergeSpec::new();
        merge.merge(0, 2, 2);
        let doc = ProcedureDocument::new(
            "P-02",
            "Processos/P-02.pdf",
            TemplateContent::Process(ProcessTemplate {
                owner: "Direção".into(),
                objective: "Garantir a satisfação".into(),
                input_services: "Comercial".into(),
                output_service: "Expedição".into(),
                activities: vec![
                    vec!["A1".into(), "Receber".into(), "Ana".into()],
                    vec!["A2".into(), "Validar".into()],
                ],
                merge,
                indicators: Indicators(vec!["Prazo médio".into()]),
            }),
        );
        let pages = layout(&doc);
        assert_eq!(count_text(&pages, "Dono do Processo"), 1);
        assert_eq!(count_text(&pages, "Direção"), 1);
        assert_eq!(count_text(&pages, "Atividade"), 1);
        assert_eq!(count_text(&pages, "Ana"), 1);
        assert_eq!(count_text(&pages, "Prazo médio"), 1);
    }

    #[test]
    fn bad_logo_is_skipped() {
        let mut doc = procedure(vec![], vec![]);
        doc.logo = Some("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=".into());
        let pages = layout(&doc);
        assert_eq!(pages.len(), 1);
        assert!(!pages[0]
            .elements
            .iter()
            .any(|el| matches!(el.draw, DrawCommand::Image { .. })));
    }

    #[test]
    fn page_numbers_can_be_disabled() {
        let mut doc = procedure(vec![], vec![]);
        doc.config.page_numbers = false;
        let pages = layout(&doc);
        assert!(!pages[0].texts().any(|(_, t)| t.starts_with("Página")));
    }
}
