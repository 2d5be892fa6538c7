//! Advance widths for the standard PDF fonts we render with.
//!
//! Widths are in 1/1000 em, taken from the Adobe AFM files. Only the
//! printable ASCII range is tabulated; accented Latin letters borrow the
//! width of their base letter, which is exact for Helvetica and Courier.

use crate::text::TextMeasure;

/// Per-character metrics for one standard font.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for U+0020..=U+007E.
    ascii: [u16; 95],
    /// Width used for anything we cannot map.
    default_width: u16,
}

impl StandardFontMetrics {
    /// Width of a single character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }

    fn units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        match ch {
            '\u{00A0}' => self.ascii[0],
            '\u{2026}' => 1000,
            '\u{2013}' => self.units('-').max(556),
            '\u{2014}' => 1000,
            '\u{2018}' | '\u{2019}' => self.units('\''),
            '\u{201C}' | '\u{201D}' => self.units('"'),
            '\u{00BA}' | '\u{00AA}' => 365,
            '\u{00B0}' => 400,
            '\u{20AC}' => 556,
            _ => match base_letter(ch) {
                Some(base) => self.units(base),
                None => self.default_width,
            },
        }
    }
}

impl TextMeasure for StandardFontMetrics {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        self.measure_string(text, font_size, 0.0)
    }
}

/// Map accented Latin-1 letters (the ones Portuguese text needs) to their
/// unaccented base letter.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
        334, 260, 334, 584, // '{'..'~'
    ],
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        333, 333, 584, 584, 584, 611, 975, // ':'..'@'
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        333, 278, 333, 584, 556, 333, // '['..'`'
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
        389, 280, 389, 584, // '{'..'~'
    ],
    default_width: 611,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    ascii: [600; 95],
    default_width: 600,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space() {
        let w = HELVETICA.char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn table_lookup_is_aligned() {
        assert_eq!(HELVETICA.units('A'), 667);
        assert_eq!(HELVETICA.units('Z'), 611);
        assert_eq!(HELVETICA.units('a'), 556);
        assert_eq!(HELVETICA.units('i'), 222);
        assert_eq!(HELVETICA.units('~'), 584);
        assert_eq!(HELVETICA_BOLD.units('m'), 889);
        assert_eq!(HELVETICA_BOLD.units('@'), 975);
    }

    #[test]
    fn accented_letters_use_base_width() {
        assert_eq!(HELVETICA.units('ã'), HELVETICA.units('a'));
        assert_eq!(HELVETICA.units('Ç'), HELVETICA.units('C'));
        assert_eq!(HELVETICA_BOLD.units('é'), HELVETICA_BOLD.units('e'));
    }

    #[test]
    fn courier_is_monospaced() {
        let a = COURIER.measure_string("iiii", 10.0, 0.0);
        let b = COURIER.measure_string("MMMM", 10.0, 0.0);
        assert!((a - b).abs() < 1e-9);
        assert!((a - 24.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_char_uses_default() {
        assert_eq!(HELVETICA.units('\u{4E2D}'), 556);
    }
}
