//! # Page Break Decisions
//!
//! What to do with the next block of table rows given the space left on the
//! current page. A block is one row, or several rows bound together by
//! merged cells; it is placed whole or not at all. Only a block that cannot
//! fit even an empty page is split.

/// Outcome for the pending rows at the current cursor position.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Draw the first `rows` pending rows (or blocks) on this page.
    Place { rows: usize },
    /// Nothing fits here but the first item fits an empty page.
    MoveToNextPage,
    /// The first item is taller than an empty page and must be split.
    Split,
}

/// Largest prefix of `heights` whose sum plus `safety_margin` fits in
/// `available`.
pub fn rows_that_fit(available: f64, heights: &[f64], safety_margin: f64) -> usize {
    let mut used = 0.0;
    let mut count = 0;
    for &h in heights {
        if used + h + safety_margin > available {
            break;
        }
        used += h;
        count += 1;
    }
    count
}

/// Decide how to continue with the pending `heights`.
///
/// `available` is the space left on the current page, `fresh_capacity` the
/// space an empty page offers, both after any header reservation.
pub fn decide_break(
    available: f64,
    fresh_capacity: f64,
    heights: &[f64],
    safety_margin: f64,
    page_is_fresh: bool,
) -> BreakDecision {
    let rows = rows_that_fit(available, heights, safety_margin);
    if rows > 0 {
        return BreakDecision::Place { rows };
    }

    match heights.first() {
        None => BreakDecision::Place { rows: 0 },
        Some(&first) if !page_is_fresh && first + safety_margin <= fresh_capacity => {
            BreakDecision::MoveToNextPage
        }
        Some(_) => BreakDecision::Split,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        let decision = decide_break(100.0, 600.0, &[20.0, 30.0, 40.0], 2.0, false);
        assert_eq!(decision, BreakDecision::Place { rows: 3 });
    }

    #[test]
    fn places_prefix_that_fits() {
        let decision = decide_break(55.0, 600.0, &[20.0, 30.0, 40.0], 2.0, false);
        assert_eq!(decision, BreakDecision::Place { rows: 2 });
    }

    #[test]
    fn safety_margin_is_respected() {
        assert_eq!(rows_that_fit(50.0, &[25.0, 25.0], 0.0), 2);
        assert_eq!(rows_that_fit(50.0, &[25.0, 25.0], 2.0), 1);
    }

    #[test]
    fn moves_when_fresh_page_has_room() {
        let decision = decide_break(10.0, 600.0, &[40.0], 2.0, false);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn splits_when_taller_than_a_page() {
        let decision = decide_break(10.0, 600.0, &[900.0], 2.0, false);
        assert_eq!(decision, BreakDecision::Split);
    }

    #[test]
    fn fresh_page_never_moves() {
        // Moving an item that does not fit a fresh page would loop forever.
        let decision = decide_break(30.0, 30.0, &[40.0], 2.0, true);
        assert_eq!(decision, BreakDecision::Split);
    }

    #[test]
    fn nothing_pending() {
        assert_eq!(
            decide_break(0.0, 600.0, &[], 2.0, false),
            BreakDecision::Place { rows: 0 }
        );
    }
}
