//! Standard 14 font names and glyph widths.
//!
//! Widths are Adobe AFM advance widths in 1/1000 em for the printable ASCII
//! range (32-126), indexed by WinAnsiEncoding code. Characters outside that
//! range are measured with the font's average lowercase width, which is
//! close enough for fit-to-box decisions.

use crate::model::FontClass;

const FIRST_PRINTABLE: u32 = 32;
const LAST_PRINTABLE: u32 = 126;

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
static TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
static TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

/// One of the twelve Latin standard Type1 fonts every PDF reader can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// Pick the variant of a class with the given weight and slant.
    pub fn from_parts(class: FontClass, bold: bool, italic: bool) -> Self {
        use StandardFont::*;
        match (class, bold, italic) {
            (FontClass::Sans, false, false) => Helvetica,
            (FontClass::Sans, true, false) => HelveticaBold,
            (FontClass::Sans, false, true) => HelveticaOblique,
            (FontClass::Sans, true, true) => HelveticaBoldOblique,
            (FontClass::Serif, false, false) => TimesRoman,
            (FontClass::Serif, true, false) => TimesBold,
            (FontClass::Serif, false, true) => TimesItalic,
            (FontClass::Serif, true, true) => TimesBoldItalic,
            (FontClass::Mono, false, false) => Courier,
            (FontClass::Mono, true, false) => CourierBold,
            (FontClass::Mono, false, true) => CourierOblique,
            (FontClass::Mono, true, true) => CourierBoldOblique,
        }
    }

    /// Look up a font by its PostScript name.
    pub fn from_name(name: &str) -> Option<Self> {
        use StandardFont::*;
        let font = match name {
            "Helvetica" => Helvetica,
            "Helvetica-Bold" => HelveticaBold,
            "Helvetica-Oblique" => HelveticaOblique,
            "Helvetica-BoldOblique" => HelveticaBoldOblique,
            "Times-Roman" => TimesRoman,
            "Times-Bold" => TimesBold,
            "Times-Italic" => TimesItalic,
            "Times-BoldItalic" => TimesBoldItalic,
            "Courier" => Courier,
            "Courier-Bold" => CourierBold,
            "Courier-Oblique" => CourierOblique,
            "Courier-BoldOblique" => CourierBoldOblique,
            _ => return None,
        };
        Some(font)
    }

    /// PostScript name, as written to /BaseFont.
    pub fn name(&self) -> &'static str {
        use StandardFont::*;
        match self {
            Helvetica => "Helvetica",
            HelveticaBold => "Helvetica-Bold",
            HelveticaOblique => "Helvetica-Oblique",
            HelveticaBoldOblique => "Helvetica-BoldOblique",
            TimesRoman => "Times-Roman",
            TimesBold => "Times-Bold",
            TimesItalic => "Times-Italic",
            TimesBoldItalic => "Times-BoldItalic",
            Courier => "Courier",
            CourierBold => "Courier-Bold",
            CourierOblique => "Courier-Oblique",
            CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn class(&self) -> FontClass {
        use StandardFont::*;
        match self {
            Helvetica | HelveticaBold | HelveticaOblique | HelveticaBoldOblique => FontClass::Sans,
            TimesRoman | TimesBold | TimesItalic | TimesBoldItalic => FontClass::Serif,
            Courier | CourierBold | CourierOblique | CourierBoldOblique => FontClass::Mono,
        }
    }

    pub fn is_bold(&self) -> bool {
        use StandardFont::*;
        matches!(
            self,
            HelveticaBold
                | HelveticaBoldOblique
                | TimesBold
                | TimesBoldItalic
                | CourierBold
                | CourierBoldOblique
        )
    }

    fn widths(&self) -> Option<&'static [u16; 95]> {
        use StandardFont::*;
        match self {
            Helvetica | HelveticaOblique => Some(&HELVETICA),
            HelveticaBold | HelveticaBoldOblique => Some(&HELVETICA_BOLD),
            TimesRoman => Some(&TIMES_ROMAN),
            TimesBold => Some(&TIMES_BOLD),
            TimesItalic => Some(&TIMES_ITALIC),
            TimesBoldItalic => Some(&TIMES_BOLD_ITALIC),
            Courier | CourierBold | CourierOblique | CourierBoldOblique => None,
        }
    }

    fn average_width(&self) -> u16 {
        match self.class() {
            FontClass::Sans => 556,
            FontClass::Serif => 500,
            FontClass::Mono => 600,
        }
    }

    /// Advance width of a character code in 1/1000 em.
    pub fn code_width(&self, code: u32) -> u16 {
        let Some(widths) = self.widths() else {
            return 600;
        };
        if (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&code) {
            widths[(code - FIRST_PRINTABLE) as usize]
        } else {
            self.average_width()
        }
    }

    /// Advance width of a string at `size`, in the same unit as `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.code_width(c as u32) as u32).sum();
        units as f32 / 1000.0 * size
    }
}

/// Encode text as WinAnsi bytes for a standard font.
///
/// Fails with the distinct characters the encoding cannot hold, in order of
/// first appearance.
pub fn encode_win_ansi(text: &str) -> Result<Vec<u8>, Vec<char>> {
    let missing = unencodable_chars(text);
    if !missing.is_empty() {
        return Err(missing);
    }
    Ok(text.chars().filter_map(win_ansi_code).collect())
}

/// Distinct characters of `text` outside WinAnsiEncoding.
pub fn unencodable_chars(text: &str) -> Vec<char> {
    let mut missing: Vec<char> = Vec::new();
    for c in text.chars() {
        if win_ansi_code(c).is_none() && !missing.contains(&c) {
            missing.push(c);
        }
    }
    missing
}

fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '\t' => 0x20,
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(StandardFont::Helvetica.code_width(b'A' as u32), 667);
        assert_eq!(StandardFont::Helvetica.code_width(b' ' as u32), 278);
        assert_eq!(StandardFont::TimesRoman.code_width(b'a' as u32), 444);
        assert_eq!(StandardFont::TimesBold.code_width(b'W' as u32), 1000);
        assert_eq!(StandardFont::CourierBold.code_width(b'i' as u32), 600);
    }

    #[test]
    fn test_tables_cover_printable_ascii() {
        for font in [
            StandardFont::Helvetica,
            StandardFont::HelveticaBold,
            StandardFont::TimesRoman,
            StandardFont::TimesBold,
            StandardFont::TimesItalic,
            StandardFont::TimesBoldItalic,
        ] {
            for code in FIRST_PRINTABLE..=LAST_PRINTABLE {
                assert!(font.code_width(code) > 0, "{:?} {}", font, code);
            }
        }
    }

    #[test]
    fn test_text_width() {
        // "Hi" = 722 + 222 in Helvetica
        let w = StandardFont::Helvetica.text_width("Hi", 10.0);
        assert!((w - 9.44).abs() < 1e-4);
        assert_eq!(StandardFont::Courier.text_width("abcd", 10.0), 24.0);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Café"), Ok(b"Caf\xE9".to_vec()));
        assert_eq!(
            encode_win_ansi("“ok” – €5"),
            Ok(b"\x93ok\x94 \x96 \x805".to_vec())
        );
        assert_eq!(encode_win_ansi("日本 Ω 日"), Err(vec!['日', '本', 'Ω']));
        assert!(unencodable_chars("Ingénieur").is_empty());
    }

    #[test]
    fn test_name_roundtrip() {
        for class in [FontClass::Sans, FontClass::Serif, FontClass::Mono] {
            for bold in [false, true] {
                for italic in [false, true] {
                    let font = StandardFont::from_parts(class, bold, italic);
                    assert_eq!(StandardFont::from_name(font.name()), Some(font));
                    assert_eq!(font.class(), class);
                    assert_eq!(font.is_bold(), bold);
                }
            }
        }
        assert_eq!(StandardFont::from_name("Symbol"), None);
    }
}
