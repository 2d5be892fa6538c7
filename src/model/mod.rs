//! # Document Model
//!
//! The input representation for the renderer: one procedure record as the
//! editor stores it. Two templates share the engine:
//!
//! - **procedure** (Template 1): a five-column procedure table followed by
//!   free-text observations.
//! - **process** (Template 2): a process header (owner, objective, input and
//!   output services), a six-column activities table with vertical merges,
//!   and a list of indicators.
//!
//! Both carry the append-only change history. JSON keys follow the editor's
//! naming; Rust field names describe the content.
//!
//! Table data is accepted leniently: `null` cells become empty strings,
//! numbers and booleans are stringified, and a row that is not an array
//! becomes a single-cell row. Layout never fails on content shape.

pub mod cell;
pub mod history;
pub mod merge;

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::LayoutConfig;

pub use cell::{Cell, CellLink, LinkKind};
pub use history::HistoryEntry;
pub use merge::{MergeGrid, MergeSpec};

/// A row of raw cell texts.
pub type Row = Vec<String>;

/// A complete procedure record ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDocument {
    /// Document title, repeated in the header of every page.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,

    /// Storage path `folder/.../filename`, shown as a breadcrumb.
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_path: String,

    /// Optional PNG or JPEG logo: a data URI, raw base64, or a file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Template-specific content.
    pub template: TemplateContent,

    /// Change log, oldest first. Empty means no history section.
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<HistoryEntry>,

    /// Layout overrides.
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: LayoutConfig,
}

impl ProcedureDocument {
    pub fn new(title: &str, file_path: &str, template: TemplateContent) -> Self {
        Self {
            title: title.to_string(),
            file_path: file_path.to_string(),
            logo: None,
            template,
            history: Vec::new(),
            config: LayoutConfig::default(),
        }
    }

    /// Attach logo bytes fetched by the caller.
    pub fn set_logo_bytes(&mut self, bytes: &[u8]) {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.logo = Some(b64);
    }
}

/// The content of one of the two document templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateContent {
    /// Template 1: procedure table plus observations.
    Procedure(ProcedureTemplate),
    /// Template 2: process header, activities and indicators.
    Process(ProcessTemplate),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureTemplate {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub main_table: Vec<Row>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub observations: Vec<Row>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessTemplate {
    #[serde(rename = "donoProcesso", default, deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(rename = "objetivoProcesso", default, deserialize_with = "lenient_string")]
    pub objective: String,
    #[serde(rename = "servicosEntrada", default, deserialize_with = "lenient_string")]
    pub input_services: String,
    #[serde(rename = "servicoSaida", default, deserialize_with = "lenient_string")]
    pub output_service: String,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub activities: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub merge: MergeSpec,
    #[serde(rename = "indicadores", default)]
    pub indicators: Indicators,
}

/// Process indicators, one per table row.
///
/// Older records stored a fixed object of named indicator fields; those are
/// accepted and collapsed to their non-empty values in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndicatorsInput")]
pub struct Indicators(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum IndicatorsInput {
    List(Vec<Value>),
    Legacy(BTreeMap<String, Value>),
    Other(Value),
}

impl From<IndicatorsInput> for Indicators {
    fn from(input: IndicatorsInput) -> Self {
        match input {
            IndicatorsInput::List(values) => Indicators(values.iter().map(value_to_text).collect()),
            IndicatorsInput::Legacy(fields) => Indicators(
                fields
                    .values()
                    .map(value_to_text)
                    .filter(|s| !s.trim().is_empty())
                    .collect(),
            ),
            IndicatorsInput::Other(value) => {
                let text = value_to_text(&value);
                if text.trim().is_empty() {
                    Indicators::default()
                } else {
                    Indicators(vec![text])
                }
            }
        }
    }
}

/// Text of a JSON scalar; `null` and containers become empty.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

/// `null` is treated like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn lenient_rows<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let rows = match value {
        Value::Array(rows) => rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(value_to_text).collect(),
                other => vec![value_to_text(other)],
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(rows)
}

/// Fit a row to exactly `columns` cells. Missing cells are empty; extra
/// cells are appended to the last column on their own lines so no text is
/// lost.
pub fn normalize_row(row: &[String], columns: usize) -> Row {
    if columns == 0 {
        return Vec::new();
    }
    let mut out: Row = row.iter().take(columns).cloned().collect();
    out.resize(columns, String::new());
    let extra: Vec<&str> = row
        .iter()
        .skip(columns)
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !extra.is_empty() {
        log::debug!("Row has {} cells for {} columns, folding extras", row.len(), columns);
        let last = &mut out[columns - 1];
        for text in extra {
            if !last.is_empty() {
                last.push('\n');
            }
            last.push_str(text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_procedure_template() {
        let doc: ProcedureDocument = serde_json::from_str(
            r#"{
                "title": "PR-01 Controlo de Documentos",
                "filePath": "Qualidade/Procedimentos/PR-01.pdf",
                "template": {
                    "type": "procedure",
                    "mainTable": [["a", null, 3, true, "e"]],
                    "observations": ["nota solta"]
                }
            }"#,
        )
        .unwrap();
        match &doc.template {
            TemplateContent::Procedure(t) => {
                assert_eq!(t.main_table, vec![vec!["a", "", "3", "true", "e"]]);
                assert_eq!(t.observations, vec![vec!["nota solta"]]);
            }
            _ => panic!("expected procedure template"),
        }
        assert!(doc.history.is_empty());
        assert_eq!(doc.config.page_height, 800.0);
    }

    #[test]
    fn parses_process_template_with_legacy_indicators() {
        let doc: ProcedureDocument = serde_json::from_str(
            r#"{
                "title": "P-03",
                "template": {
                    "type": "process",
                    "donoProcesso": "Ana",
                    "objetivoProcesso": null,
                    "activities": [["x"]],
                    "merge": { "mergedSpans": { "0-0": 2 }, "hiddenCells": { "1-0": true } },
                    "indicadores": { "indicador1": "Taxa de reclamações", "indicador2": "", "indicador3": "Prazo médio" }
                }
            }"#,
        )
        .unwrap();
        match &doc.template {
            TemplateContent::Process(t) => {
                assert_eq!(t.owner, "Ana");
                assert_eq!(t.objective, "");
                assert_eq!(
                    t.indicators,
                    Indicators(vec!["Taxa de reclamações".into(), "Prazo médio".into()])
                );
                assert!(!t.merge.is_empty());
            }
            _ => panic!("expected process template"),
        }
    }

    #[test]
    fn null_merge_and_history_mean_none() {
        let doc: ProcedureDocument = serde_json::from_str(
            r#"{
                "title": "P-04",
                "template": { "type": "process", "activities": [["a"]], "merge": null },
                "history": null,
                "config": null
            }"#,
        )
        .unwrap();
        match &doc.template {
            TemplateContent::Process(t) => assert!(t.merge.is_empty()),
            _ => panic!("expected process template"),
        }
        assert!(doc.history.is_empty());
        assert_eq!(doc.config.page_width, 600.0);
    }

    #[test]
    fn indicators_list_form() {
        let ind: Indicators = serde_json::from_str(r#"["a", null, "c"]"#).unwrap();
        assert_eq!(ind.0, vec!["a", "", "c"]);
    }

    #[test]
    fn unknown_template_type_is_an_error() {
        let result: Result<ProcedureDocument, _> =
            serde_json::from_str(r#"{ "template": { "type": "memo" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn normalize_pads_short_rows() {
        let row = vec!["a".to_string()];
        assert_eq!(normalize_row(&row, 3), vec!["a", "", ""]);
    }

    #[test]
    fn normalize_folds_extra_cells() {
        let row: Row = vec!["a".into(), "b".into(), "c".into(), "".into()];
        assert_eq!(normalize_row(&row, 2), vec!["a", "b\nc"]);
    }

    #[test]
    fn logo_bytes_become_base64() {
        let mut doc = ProcedureDocument::new(
            "t",
            "f",
            TemplateContent::Procedure(ProcedureTemplate::default()),
        );
        doc.set_logo_bytes(&[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(doc.logo.as_deref(), Some("iVBORw=="));
    }
}
