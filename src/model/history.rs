//! Change-history entries and the "mudou de / para" description heuristic.
//!
//! The backend records edits as free text such as
//! `Dono do Processo: de "Ana" para "Bruno"`. For the history table we pull
//! every such change out of the description; anything else goes to the
//! "Para" column untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lenient_string;

/// One entry of the append-only change log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "data", default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "utilizador", default, deserialize_with = "lenient_string")]
    pub user: String,
    #[serde(rename = "acao", default, deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(rename = "descricao", default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// A single field change found in a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub from: String,
    pub to: String,
}

static CHANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?P<field>[^:\n;]+?)\s*:\s*de\s+["“](?P<from>[^"”]*)["”]\s+para\s+["“](?P<to>[^"”]*)["”]"#)
        .expect("change pattern is valid")
});

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})(?:[T ](?P<hh>\d{2}):(?P<mm>\d{2}))?")
        .expect("date pattern is valid")
});

/// Extract every `campo: de "X" para "Y"` change from a description.
pub fn parse_changes(description: &str) -> Vec<FieldChange> {
    CHANGE_RE
        .captures_iter(description)
        .map(|caps| FieldChange {
            field: caps["field"]
                .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                .to_string(),
            from: caps["from"].to_string(),
            to: caps["to"].to_string(),
        })
        .collect()
}

/// Render ISO timestamps as `dd/mm/aaaa hh:mm`; other formats pass through.
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    match ISO_DATE_RE.captures(date) {
        Some(caps) => {
            let day = format!("{}/{}/{}", &caps["d"], &caps["m"], &caps["y"]);
            match (caps.name("hh"), caps.name("mm")) {
                (Some(hh), Some(mm)) => format!("{} {}:{}", day, hh.as_str(), mm.as_str()),
                _ => day,
            }
        }
        None => date.to_string(),
    }
}

impl HistoryEntry {
    /// The five history-table cells: date, user, action, from, to.
    pub fn to_row(&self) -> Vec<String> {
        let changes = parse_changes(&self.description);

        let (action, from, to) = if changes.is_empty() {
            (self.action.clone(), String::new(), self.description.clone())
        } else {
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            let action = if self.action.trim().is_empty() {
                fields.join("\n")
            } else {
                format!("{}\n{}", self.action, fields.join("\n"))
            };
            let from: Vec<&str> = changes.iter().map(|c| c.from.as_str()).collect();
            let to: Vec<&str> = changes.iter().map(|c| c.to.as_str()).collect();
            (action, from.join("\n"), to.join("\n"))
        };

        vec![format_date(&self.date), self.user.clone(), action, from, to]
    }
}
