//! Vertical cell merges for the activities table.
//!
//! The editor sends merges as two maps keyed by `"row-col"`:
//! `mergedSpans` gives the number of rows an origin cell covers, and
//! `hiddenCells` flags the cells it covers. Coverage is derived from the
//! spans; the hidden flags are only cross-checked.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Merge metadata as it appears in the input JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMergeSpec {
    #[serde(default)]
    pub merged_spans: BTreeMap<String, Value>,
    #[serde(default)]
    pub hidden_cells: BTreeMap<String, Value>,
}

/// Parsed merge metadata: `(row, col) -> span` plus the hidden set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMergeSpec", into = "RawMergeSpec")]
pub struct MergeSpec {
    spans: BTreeMap<(usize, usize), usize>,
    hidden: BTreeSet<(usize, usize)>,
}

fn parse_key(key: &str) -> Option<(usize, usize)> {
    let (row, col) = key.split_once('-')?;
    Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
}

fn parse_span(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|v| usize::try_from(v).unwrap_or(usize::MAX)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => s == "true",
        _ => false,
    }
}

impl From<RawMergeSpec> for MergeSpec {
    fn from(raw: RawMergeSpec) -> Self {
        let mut spec = MergeSpec::default();
        for (key, value) in &raw.merged_spans {
            match (parse_key(key), parse_span(value)) {
                (Some((row, col)), Some(span)) if span >= 1 => {
                    spec.spans.insert((row, col), span);
                }
                _ => log::warn!("Ignoring malformed merge span {:?}: {}", key, value),
            }
        }
        for (key, value) in &raw.hidden_cells {
            if !is_truthy(value) {
                continue;
            }
            match parse_key(key) {
                Some(pos) => {
                    spec.hidden.insert(pos);
                }
                None => log::warn!("Ignoring malformed hidden cell key {:?}", key),
            }
        }
        spec
    }
}

impl From<MergeSpec> for RawMergeSpec {
    fn from(spec: MergeSpec) -> Self {
        RawMergeSpec {
            merged_spans: spec
                .spans
                .iter()
                .map(|((r, c), span)| (format!("{}-{}", r, c), Value::from(*span)))
                .collect(),
            hidden_cells: spec
                .hidden
                .iter()
                .map(|(r, c)| (format!("{}-{}", r, c), Value::Bool(true)))
                .collect(),
        }
    }
}

impl MergeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the cell at `(row, col)` with the `span - 1` cells below it.
    pub fn merge(&mut self, row: usize, col: usize, span: usize) {
        if span <= 1 {
            return;
        }
        self.spans.insert((row, col), span);
        for r in row + 1..row.saturating_add(span) {
            self.hidden.insert((r, col));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.values().all(|&s| s <= 1)
    }

    /// Resolve against a concrete table shape: spans are clamped to the
    /// table, overlapping spans are dropped, and coverage is computed.
    pub fn resolve(&self, rows: usize, cols: usize) -> MergeGrid {
        let mut grid = MergeGrid::none(rows, cols);

        for (&(row, col), &span) in &self.spans {
            if span <= 1 {
                continue;
            }
            if row >= rows || col >= cols {
                log::warn!(
                    "Merge at {}-{} lies outside a {}x{} table, ignoring",
                    row,
                    col,
                    rows,
                    cols
                );
                continue;
            }
            if grid.covered[row][col] {
                log::warn!("Merge at {}-{} starts inside another merge, ignoring", row, col);
                continue;
            }
            // Spans are visited in row order, so a later origin inside this
            // span is caught by the coverage check above.
            let end = row + span.min(rows - row);
            grid.spans[row][col] = end - row;
            for r in row + 1..end {
                grid.covered[r][col] = true;
            }
        }

        for &(row, col) in &self.hidden {
            if row < rows && col < cols && !grid.covered[row][col] {
                log::debug!("Hidden cell {}-{} is not covered by any merge", row, col);
            }
        }

        grid
    }
}

/// Merge spans resolved against a table of known shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGrid {
    spans: Vec<Vec<usize>>,
    covered: Vec<Vec<bool>>,
}

impl MergeGrid {
    /// A grid with no merges.
    pub fn none(rows: usize, cols: usize) -> Self {
        Self {
            spans: vec![vec![1; cols]; rows],
            covered: vec![vec![false; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.spans.len()
    }

    /// Rows covered by the cell at `(row, col)`; 1 for unmerged cells.
    pub fn span(&self, row: usize, col: usize) -> usize {
        self.spans
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(1)
    }

    /// Whether `(row, col)` is drawn by a merged cell above it.
    pub fn is_covered(&self, row: usize, col: usize) -> bool {
        self.covered
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Drop every merge touching rows in `range`.
    pub fn dissolve(&mut self, range: Range<usize>) {
        for row in range {
            if let Some(spans) = self.spans.get_mut(row) {
                spans.iter_mut().for_each(|s| *s = 1);
            }
            if let Some(covered) = self.covered.get_mut(row) {
                covered.iter_mut().for_each(|c| *c = false);
            }
        }
    }

    /// Split the rows into pagination blocks: a single row, or the smallest
    /// run of consecutive rows that no merge crosses.
    pub fn blocks(&self) -> Vec<Range<usize>> {
        let mut blocks = Vec::new();
        let mut start = 0;
        while start < self.rows() {
            let mut end = start + 1;
            let mut row = start;
            while row < end {
                let reach = self.spans[row]
                    .iter()
                    .map(|span| row + span)
                    .max()
                    .unwrap_or(row + 1);
                end = end.max(reach);
                row += 1;
            }
            blocks.push(start..end);
            start = end;
        }
        blocks
    }
}
