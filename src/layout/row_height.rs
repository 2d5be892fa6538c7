//! Row heights from wrapped line counts.
//!
//! Every cell in a row shares the height of the tallest cell. Merged cells
//! do not size any single row; whatever their text needs beyond the rows
//! they span is added to the last of those rows.

use crate::model::MergeGrid;

/// Vertical metrics shared by every row of a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub line_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub min_height: f64,
}

impl RowMetrics {
    /// Height a cell needs to show `lines` lines. Zero lines still take one.
    pub fn cell_height(&self, lines: usize) -> f64 {
        lines.max(1) as f64 * self.line_height + self.padding_top + self.padding_bottom
    }
}

/// Height of a row whose cells wrapped to `line_counts` lines.
pub fn row_height(line_counts: &[usize], metrics: &RowMetrics) -> f64 {
    line_counts
        .iter()
        .map(|&n| metrics.cell_height(n))
        .fold(metrics.min_height, f64::max)
}

/// Heights of all rows of a table body.
///
/// `line_counts[row][col]` is the number of wrapped lines of each cell.
/// Covered cells are ignored; a merge origin only contributes through the
/// deficit rule.
pub fn row_heights(line_counts: &[Vec<usize>], grid: &MergeGrid, metrics: &RowMetrics) -> Vec<f64> {
    let mut heights: Vec<f64> = line_counts
        .iter()
        .enumerate()
        .map(|(r, counts)| {
            let own: Vec<usize> = counts
                .iter()
                .enumerate()
                .filter(|&(c, _)| grid.span(r, c) == 1 && !grid.is_covered(r, c))
                .map(|(_, &n)| n)
                .collect();
            row_height(&own, metrics)
        })
        .collect();

    for (r, counts) in line_counts.iter().enumerate() {
        for (c, &n) in counts.iter().enumerate() {
            let span = grid.span(r, c);
            if span <= 1 || grid.is_covered(r, c) {
                continue;
            }
            let end = (r + span).min(heights.len());
            let spanned: f64 = heights[r..end].iter().sum();
            let deficit = metrics.cell_height(n) - spanned;
            if deficit > 0.0 {
                heights[end - 1] += deficit;
            }
        }
    }

    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MergeSpec;

    fn metrics() -> RowMetrics {
        RowMetrics {
            line_height: 10.0,
            padding_top: 8.0,
            padding_bottom: 8.0,
            min_height: 20.0,
        }
    }

    #[test]
    fn tallest_cell_wins() {
        assert_eq!(row_height(&[1, 3, 2], &metrics()), 46.0);
    }

    #[test]
    fn minimum_applies() {
        let m = RowMetrics {
            min_height: 40.0,
            ..metrics()
        };
        assert_eq!(row_height(&[1], &m), 40.0);
    }

    #[test]
    fn zero_lines_count_as_one() {
        assert_eq!(row_height(&[0, 0], &metrics()), 26.0);
    }

    #[test]
    fn more_lines_never_shrink_a_row() {
        let m = metrics();
        let mut last = 0.0;
        for n in 0..20 {
            let h = row_height(&[n, 1], &m);
            assert!(h >= last);
            last = h;
        }
    }

    #[test]
    fn merged_cell_fits_in_spanned_rows() {
        let mut spec = MergeSpec::new();
        spec.merge(0, 0, 2);
        let grid = spec.resolve(2, 2);
        // Origin needs 46, the two rows give 26 + 26.
        let heights = row_heights(&[vec![3, 1], vec![0, 1]], &grid, &metrics());
        assert_eq!(heights, vec![26.0, 26.0]);
    }

    #[test]
    fn merged_deficit_goes_to_last_row() {
        let mut spec = MergeSpec::new();
        spec.merge(0, 0, 2);
        let grid = spec.resolve(3, 2);
        // Origin needs 7 lines = 86, rows give 26 + 36.
        let heights = row_heights(&[vec![7, 1], vec![0, 2], vec![1, 1]], &grid, &metrics());
        assert_eq!(heights, vec![26.0, 60.0, 26.0]);
        assert_eq!(heights[0] + heights[1], metrics().cell_height(7));
    }

    #[test]
    fn covered_cells_do_not_size_rows() {
        let mut spec = MergeSpec::new();
        spec.merge(0, 1, 2);
        let grid = spec.resolve(2, 2);
        let heights = row_heights(&[vec![1, 1], vec![1, 9]], &grid, &metrics());
        assert_eq!(heights, vec![26.0, 26.0]);
    }
}
