//! # Layout Configuration
//!
//! Every geometric constant the engine uses: page size, header reservation,
//! fonts, paddings, colors and the column layout of each table. All fields
//! default to the standard procedure-record layout (600×800 pages, Helvetica,
//! 8pt body text on 10pt lines), so a document only carries the overrides it
//! needs.

use serde::{Deserialize, Serialize};

use crate::error::SgqPdfError;
use crate::style::Color;

/// Column widths and header labels for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumns {
    /// Fixed column widths in points, left to right.
    pub widths: Vec<f64>,
    /// Header labels. For the process-header table these are the row labels.
    pub labels: Vec<String>,
}

impl TableColumns {
    fn new(widths: &[f64], labels: &[&str]) -> Self {
        Self {
            widths: widths.to_vec(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn total_width(&self) -> f64 {
        self.widths.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Space reserved at the top of every page for the document header.
    pub header_height: f64,
    pub bottom_margin: f64,

    pub font_family: String,
    pub title_font_size: f64,
    pub header_font_size: f64,
    pub body_font_size: f64,
    pub breadcrumb_font_size: f64,
    pub footer_font_size: f64,
    pub line_height: f64,

    pub cell_padding_x: f64,
    pub cell_padding_top: f64,
    pub cell_padding_bottom: f64,
    pub min_row_height: f64,
    pub min_header_height: f64,
    /// Slack kept free at the bottom when packing rows onto a page.
    pub safety_margin: f64,
    /// Vertical gap between consecutive tables on the same page.
    pub section_gap: f64,

    pub logo_max_width: f64,
    pub logo_max_height: f64,

    pub grid_color: Color,
    pub header_fill: Color,
    pub text_color: Color,
    pub muted_color: Color,
    pub link_color: Color,

    pub main_table: TableColumns,
    pub observations: TableColumns,
    pub process_header: TableColumns,
    pub activities: TableColumns,
    pub indicators: TableColumns,
    pub history: TableColumns,

    pub history_title: String,
    /// The history section starts on a new page unless its title, header and
    /// this many rows fit in the remaining space.
    pub history_min_rows: usize,
    /// Draw "Página X de Y" at the bottom of each page.
    pub page_numbers: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 600.0,
            page_height: 800.0,
            margin_left: 30.0,
            margin_right: 30.0,
            header_height: 90.0,
            bottom_margin: 40.0,

            font_family: "Helvetica".to_string(),
            title_font_size: 14.0,
            header_font_size: 9.0,
            body_font_size: 8.0,
            breadcrumb_font_size: 7.0,
            footer_font_size: 7.0,
            line_height: 10.0,

            cell_padding_x: 5.0,
            cell_padding_top: 8.0,
            cell_padding_bottom: 8.0,
            min_row_height: 20.0,
            min_header_height: 22.0,
            safety_margin: 2.0,
            section_gap: 12.0,

            logo_max_width: 90.0,
            logo_max_height: 45.0,

            grid_color: Color::BLACK,
            header_fill: Color::gray(0.7),
            text_color: Color::BLACK,
            muted_color: Color::gray(0.35),
            link_color: Color::rgb(0.0, 0.2, 0.8),

            main_table: TableColumns::new(
                &[95.0, 135.0, 100.0, 105.0, 105.0],
                &["Entradas", "Atividades", "Responsável", "Saídas", "Registos / Documentos"],
            ),
            observations: TableColumns::new(&[540.0], &["Observações"]),
            process_header: TableColumns::new(
                &[150.0, 390.0],
                &[
                    "Dono do Processo",
                    "Objetivo do Processo",
                    "Serviços de Entrada",
                    "Serviço de Saída",
                ],
            ),
            activities: TableColumns::new(
                &[80.0, 120.0, 80.0, 85.0, 85.0, 90.0],
                &["Atividade", "Descrição", "Responsável", "Entradas", "Saídas", "Documentos"],
            ),
            indicators: TableColumns::new(&[540.0], &["Indicadores"]),
            history: TableColumns::new(
                &[70.0, 80.0, 110.0, 140.0, 140.0],
                &["Data", "Utilizador", "Ação", "Mudou de", "Para"],
            ),

            history_title: "Histórico de Alterações".to_string(),
            history_min_rows: 3,
            page_numbers: true,
        }
    }
}

impl LayoutConfig {
    pub fn content_width(&self) -> f64 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Top of the content area, below the per-page header.
    pub fn content_top(&self) -> f64 {
        self.header_height
    }

    /// Bottom of the content area, above the bottom margin.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.bottom_margin
    }

    /// Vertical space a page offers to tables.
    pub fn usable_height(&self) -> f64 {
        self.content_bottom() - self.content_top()
    }

    pub fn vertical_padding(&self) -> f64 {
        self.cell_padding_top + self.cell_padding_bottom
    }

    /// Check that the configuration describes a page we can lay out on.
    pub fn validate(&self) -> Result<(), SgqPdfError> {
        let positive = [
            ("pageWidth", self.page_width),
            ("pageHeight", self.page_height),
            ("titleFontSize", self.title_font_size),
            ("headerFontSize", self.header_font_size),
            ("bodyFontSize", self.body_font_size),
            ("breadcrumbFontSize", self.breadcrumb_font_size),
            ("footerFontSize", self.footer_font_size),
            ("lineHeight", self.line_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SgqPdfError::ConfigError(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("marginLeft", self.margin_left),
            ("marginRight", self.margin_right),
            ("headerHeight", self.header_height),
            ("bottomMargin", self.bottom_margin),
            ("cellPaddingX", self.cell_padding_x),
            ("cellPaddingTop", self.cell_padding_top),
            ("cellPaddingBottom", self.cell_padding_bottom),
            ("minRowHeight", self.min_row_height),
            ("minHeaderHeight", self.min_header_height),
            ("safetyMargin", self.safety_margin),
            ("sectionGap", self.section_gap),
            ("logoMaxWidth", self.logo_max_width),
            ("logoMaxHeight", self.logo_max_height),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SgqPdfError::ConfigError(format!(
                    "{} must be zero or positive, got {}",
                    name, value
                )));
            }
        }

        if self.content_width() <= 0.0 {
            return Err(SgqPdfError::ConfigError(
                "horizontal margins leave no content width".to_string(),
            ));
        }

        let smallest_page_need = self.min_header_height
            + self.line_height
            + self.vertical_padding()
            + self.safety_margin;
        if self.usable_height() < smallest_page_need {
            return Err(SgqPdfError::ConfigError(format!(
                "headerHeight + bottomMargin leave {:.1}pt per page, need at least {:.1}pt",
                self.usable_height(),
                smallest_page_need
            )));
        }

        let tables = [
            ("mainTable", &self.main_table, 5, 5),
            ("observations", &self.observations, 1, 1),
            ("processHeader", &self.process_header, 2, 4),
            ("activities", &self.activities, 6, 6),
            ("indicators", &self.indicators, 1, 1),
            ("history", &self.history, 5, 5),
        ];
        for (name, table, columns, labels) in tables {
            self.validate_table(name, table, columns, labels)?;
        }

        Ok(())
    }

    fn validate_table(
        &self,
        name: &str,
        table: &TableColumns,
        columns: usize,
        labels: usize,
    ) -> Result<(), SgqPdfError> {
        if table.widths.len() != columns {
            return Err(SgqPdfError::ConfigError(format!(
                "{}.widths must have {} entries, got {}",
                name,
                columns,
                table.widths.len()
            )));
        }
        if table.labels.len() != labels {
            return Err(SgqPdfError::ConfigError(format!(
                "{}.labels must have {} entries, got {}",
                name,
                labels,
                table.labels.len()
            )));
        }
        if let Some(w) = table.widths.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(SgqPdfError::ConfigError(format!(
                "{}.widths must all be positive, got {}",
                name, w
            )));
        }
        if (table.total_width() - self.content_width()).abs() > 0.5 {
            return Err(SgqPdfError::ConfigError(format!(
                "{}.widths sum to {:.1}pt but the content width is {:.1}pt",
                name,
                table.total_width(),
                self.content_width()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.content_width(), 540.0);
        assert_eq!(config.usable_height(), 670.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "bodyFontSize": 9, "pageNumbers": false }"#).unwrap();
        assert_eq!(config.body_font_size, 9.0);
        assert!(!config.page_numbers);
        assert_eq!(config.page_height, 800.0);
        assert_eq!(config.main_table.widths.len(), 5);
    }

    #[test]
    fn rejects_widths_not_matching_content_width() {
        let mut config = LayoutConfig::default();
        config.main_table.widths = vec![100.0; 5];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mainTable.widths sum to 500.0pt"));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let mut config = LayoutConfig::default();
        config.activities.widths = vec![270.0, 270.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_page_without_room() {
        let config = LayoutConfig {
            header_height: 500.0,
            bottom_margin: 290.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_line_height() {
        let config = LayoutConfig {
            line_height: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lineHeight"));
    }
}
