//! # Text Layout
//!
//! Measurement and greedy line breaking for table cells.
//!
//! Cells hold short procedural text, so the breaker is deliberately simple:
//! explicit newlines split paragraphs, whitespace separates words, and a word
//! that cannot fit on a line by itself is cut between characters. Every
//! width comparison measures the whole candidate string, so wrapping text
//! that was already wrapped at the same width reproduces the same lines.

/// Anything that can tell how wide a string is at a given font size.
pub trait TextMeasure {
    /// Width of `text` in points.
    fn measure(&self, text: &str, font_size: f64) -> f64;
}

/// Appended to lines that had to be cut short.
pub const ELLIPSIS: char = '\u{2026}';

/// Break `text` into lines no wider than `max_width`.
///
/// Always returns at least one line. Empty or whitespace-only input yields a
/// single empty line, which still occupies vertical space.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    metrics: &M,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        wrap_paragraph(paragraph, metrics, font_size, max_width, &mut lines);
    }
    lines
}

fn wrap_paragraph<M: TextMeasure + ?Sized>(
    paragraph: &str,
    metrics: &M,
    font_size: f64,
    max_width: f64,
    lines: &mut Vec<String>,
) {
    let fits = |s: &str| metrics.measure(s, font_size) <= max_width;

    let mut current = String::new();
    let mut saw_word = false;

    for word in paragraph.split_whitespace() {
        saw_word = true;

        if !current.is_empty() {
            let candidate = format!("{} {}", current, word);
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }

        if fits(word) {
            current = word.to_string();
        } else {
            current = split_long_word(word, metrics, font_size, max_width, lines);
        }
    }

    if !saw_word {
        lines.push(String::new());
    } else if !current.is_empty() {
        lines.push(current);
    }
}

/// Cut a word wider than `max_width` into fragments that fit. Full fragments
/// are pushed to `lines`; the trailing fragment is returned so following
/// words can join it. A single character that does not fit on its own is
/// still emitted as its own fragment.
fn split_long_word<M: TextMeasure + ?Sized>(
    word: &str,
    metrics: &M,
    font_size: f64,
    max_width: f64,
    lines: &mut Vec<String>,
) -> String {
    let mut fragment = String::new();
    for ch in word.chars() {
        let mut candidate = fragment.clone();
        candidate.push(ch);
        if fragment.is_empty() || metrics.measure(&candidate, font_size) <= max_width {
            fragment = candidate;
        } else {
            lines.push(std::mem::take(&mut fragment));
            fragment.push(ch);
        }
    }
    fragment
}

/// Last-resort safeguard: cut a line that is still wider than `max_width`
/// and end it with an ellipsis. Returns an empty string when not even the
/// ellipsis fits.
pub fn fit_line<M: TextMeasure + ?Sized>(
    line: &str,
    metrics: &M,
    font_size: f64,
    max_width: f64,
) -> String {
    if metrics.measure(line, font_size) <= max_width {
        return line.to_string();
    }

    let mut buf = [0u8; 4];
    let ellipsis_width = metrics.measure(ELLIPSIS.encode_utf8(&mut buf), font_size);
    if ellipsis_width > max_width {
        return String::new();
    }

    let mut out = String::new();
    let mut width = ellipsis_width;
    for ch in line.chars() {
        let w = metrics.measure(ch.encode_utf8(&mut buf), font_size);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::metrics::HELVETICA;

    /// Every character is exactly one point wide at any size.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn measure(&self, text: &str, _font_size: f64) -> f64 {
            text.chars().count() as f64
        }
    }

    #[test]
    fn test_single_line() {
        let lines = wrap_text("Hello world", &Monospace, 8.0, 100.0);
        assert_eq!(lines, vec!["Hello world"]);
    }

    #[test]
    fn test_line_break_at_space() {
        let lines = wrap_text("aaa bbb ccc", &Monospace, 8.0, 7.0);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_exact_fit_stays_on_line() {
        let lines = wrap_text("aaa bbb", &Monospace, 8.0, 7.0);
        assert_eq!(lines, vec!["aaa bbb"]);
    }

    #[test]
    fn test_explicit_newline_and_blank_line() {
        let lines = wrap_text("first\n\nthird\r\nfourth", &Monospace, 8.0, 50.0);
        assert_eq!(lines, vec!["first", "", "third", "fourth"]);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(wrap_text("", &Monospace, 8.0, 50.0), vec![""]);
        assert_eq!(wrap_text("   \n\t ", &Monospace, 8.0, 50.0), vec![""]);
    }

    #[test]
    fn test_long_word_is_force_split() {
        let lines = wrap_text("abcdefghij", &Monospace, 8.0, 4.0);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_split_remainder_joins_next_word() {
        let lines = wrap_text("xx abcdefg h", &Monospace, 8.0, 4.0);
        assert_eq!(lines, vec!["xx", "abcd", "efg", "h"]);

        let lines = wrap_text("abcdef g", &Monospace, 8.0, 4.0);
        assert_eq!(lines, vec!["abcd", "ef g"]);
    }

    #[test]
    fn test_char_wider_than_column_still_progresses() {
        let lines = wrap_text("abc", &Monospace, 8.0, 0.5);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_every_line_fits_real_metrics() {
        let text = "Verificar a conformidade dos registos de formação com o plano anual aprovado pela direção.";
        let lines = wrap_text(text, &HELVETICA, 8.0, 85.0);
        assert!(lines.len() >= 3);
        for line in &lines {
            assert!(HELVETICA.measure(line, 8.0) <= 85.0, "line too wide: {line}");
        }
    }

    #[test]
    fn test_rewrap_is_idempotent() {
        let samples = [
            "A very long sentence that exceeds one hundred characters and must wrap across multiple lines inside a narrow column.",
            "Supercalifragilisticexpialidocious antidisestablishmentarianism x",
            "linha um\n\nlinha três com mais palavras do que cabem",
            "   espaços   a  mais   ",
            "W",
        ];
        for width in [20.0, 45.0, 85.0, 200.0] {
            for s in samples {
                let once = wrap_text(s, &HELVETICA, 8.0, width);
                let twice = wrap_text(&once.join("\n"), &HELVETICA, 8.0, width);
                assert_eq!(once, twice, "re-wrapping changed lines at width {width}");
            }
        }
    }

    #[test]
    fn test_wrapping_preserves_non_whitespace_content() {
        let s = "Registo RG-07: arquivo digital\nResponsável: Gestor da Qualidade (GQ) Pneumoultramicroscopicossilicovulcanoconiótico";
        let lines = wrap_text(s, &HELVETICA, 8.0, 40.0);
        let joined: String = lines.concat().chars().filter(|c| !c.is_whitespace()).collect();
        let original: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(joined, original);
    }

    #[test]
    fn test_fit_line_passthrough() {
        assert_eq!(fit_line("short", &Monospace, 8.0, 10.0), "short");
    }

    #[test]
    fn test_fit_line_truncates_with_ellipsis() {
        assert_eq!(fit_line("abcdefgh", &Monospace, 8.0, 5.0), "abcd\u{2026}");
    }

    #[test]
    fn test_fit_line_nothing_fits() {
        assert_eq!(fit_line("abc", &Monospace, 8.0, 0.5), "");
    }
}
