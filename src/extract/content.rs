//! Content stream interpretation for positioned text and image placements.
//!
//! Walks a page's operators tracking the graphics state (CTM, fill color)
//! and the text state (font, size, spacing, matrices) well enough to place
//! every text-showing operator and every `Do` on the page.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{Color, FontClass, PageGeometry};
use crate::style::{strip_subset_prefix, StandardFont};

/// TJ offsets larger than this (in 1/1000 em) read as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Top of a glyph box above the baseline, as a fraction of the font size.
pub(crate) const ASCENT_RATIO: f32 = 0.8;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6].iter().filter_map(get_number).collect();
        (n.len() == 6).then(|| Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
    }
}

/// Widths and naming for one font resource on a page.
#[derive(Debug, Clone)]
pub(crate) struct FontMetrics {
    /// BaseFont with any subset prefix removed
    pub base_font: String,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    standard: Option<StandardFont>,
    /// Type0 fonts use two-byte codes
    pub two_byte: bool,
    /// Class from FontDescriptor flags
    pub class_hint: Option<FontClass>,
}

impl FontMetrics {
    /// Read metrics from a font dictionary.
    pub fn from_dict(doc: &LopdfDocument, font: &Dictionary) -> Self {
        let raw_name = name_of(font.get(b"BaseFont").ok()).unwrap_or_default();
        let base_font = strip_subset_prefix(&raw_name).to_string();
        let two_byte = name_of(font.get(b"Subtype").ok()).as_deref() == Some("Type0");

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(get_number)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0);
        let widths = resolve(doc, font.get(b"Widths").ok())
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| resolve(doc, Some(w)).and_then(get_number).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let mut descriptor = resolve(doc, font.get(b"FontDescriptor").ok())
            .and_then(|o| o.as_dict().ok());
        let mut cid_widths = HashMap::new();
        let mut default_width = 0.0;

        if two_byte {
            let descendant = resolve(doc, font.get(b"DescendantFonts").ok())
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve(doc, Some(o)))
                .and_then(|o| o.as_dict().ok());
            if let Some(cid_font) = descendant {
                default_width = cid_font
                    .get(b"DW")
                    .ok()
                    .and_then(get_number)
                    .unwrap_or(1000.0);
                if let Some(w) = resolve(doc, cid_font.get(b"W").ok()).and_then(|o| o.as_array().ok())
                {
                    cid_widths = parse_cid_widths(doc, w);
                }
                if descriptor.is_none() {
                    descriptor = resolve(doc, cid_font.get(b"FontDescriptor").ok())
                        .and_then(|o| o.as_dict().ok());
                }
            }
        }

        if let Some(desc) = descriptor {
            if let Some(missing) = desc.get(b"MissingWidth").ok().and_then(get_number) {
                if !two_byte {
                    default_width = missing;
                }
            }
        }

        let class_hint = descriptor
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(|o| o.as_i64().ok())
            .and_then(|flags| {
                if flags & 0x1 != 0 {
                    Some(FontClass::Mono)
                } else if flags & 0x2 != 0 {
                    Some(FontClass::Serif)
                } else {
                    None
                }
            });

        Self {
            standard: StandardFont::from_name(&base_font),
            base_font,
            first_char,
            widths,
            cid_widths,
            default_width,
            two_byte,
            class_hint,
        }
    }

    /// Metrics for an unknown resource name.
    fn unknown(name: &str) -> Self {
        Self {
            base_font: name.to_string(),
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: 0.0,
            standard: None,
            two_byte: false,
            class_hint: None,
        }
    }

    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| {
                    if c.len() == 2 {
                        u16::from_be_bytes([c[0], c[1]]) as u32
                    } else {
                        c[0] as u32
                    }
                })
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }

    /// Advance width of a code in 1/1000 em.
    pub fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        if code >= self.first_char {
            if let Some(w) = self.widths.get((code - self.first_char) as usize) {
                if *w > 0.0 {
                    return *w;
                }
            }
        }
        if let Some(standard) = self.standard {
            return standard.code_width(code) as f32;
        }
        if self.default_width > 0.0 {
            self.default_width
        } else {
            500.0
        }
    }
}

/// Parse a CIDFont /W array: `c [w1 w2 ...]` and `cfirst clast w` forms.
fn parse_cid_widths(doc: &LopdfDocument, w: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(first) = get_number(&w[i]) else {
            break;
        };
        let first = first.max(0.0) as u32;
        match w.get(i + 1).and_then(|o| resolve(doc, Some(o))) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset)
                        .ok()
                        .and_then(|offset| first.checked_add(offset))
                    else {
                        break;
                    };
                    if let Some(width) = get_number(width) {
                        widths.insert(code, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = get_number(last).map(|n| n.max(0.0) as u32).unwrap_or(first);
                let width = w.get(i + 2).and_then(get_number).unwrap_or(0.0);
                for code in first..=last.min(first.saturating_add(0xFFFF)) {
                    widths.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// A text-showing operator, positioned in default user space.
#[derive(Debug, Clone)]
pub(crate) struct TextSegment {
    /// Font resource name (e.g. "F1")
    pub font: Vec<u8>,
    pub text: String,
    /// Start x
    pub x: f32,
    /// Baseline y (bottom-left origin)
    pub baseline: f32,
    /// Horizontal advance
    pub width: f32,
    /// Effective size after text and graphics scaling
    pub size: f32,
    pub color: Color,
}

/// A `Do` operator with the CTM in force.
#[derive(Debug, Clone)]
pub(crate) struct XObjectPlacement {
    pub name: Vec<u8>,
    pub ctm: Matrix,
}

/// Everything positioned on one page.
#[derive(Debug, Default)]
pub(crate) struct PageContent {
    pub segments: Vec<TextSegment>,
    pub placements: Vec<XObjectPlacement>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Color,
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    render_mode: i64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: Color::BLACK,
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            render_mode: 0,
        }
    }
}

/// Interprets one page's content stream.
pub(crate) struct ContentInterpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: HashMap<Vec<u8>, FontMetrics>,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(doc: &'a LopdfDocument, fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        let metrics = fonts
            .iter()
            .map(|(name, dict)| (name.clone(), FontMetrics::from_dict(doc, dict)))
            .collect();
        Self {
            doc,
            fonts,
            metrics,
        }
    }

    /// Metrics for a font resource.
    pub fn metrics(&self, font: &[u8]) -> Option<&FontMetrics> {
        self.metrics.get(font)
    }

    /// Decode and walk a content stream.
    pub fn run(&self, content: &[u8]) -> Result<PageContent> {
        let content = Content::decode(content).map_err(|e| Error::Decode(e.to_string()))?;

        let mut page = PageContent::default();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut gs = GraphicsState::default();
        let mut text_matrix = Matrix::IDENTITY;
        let mut line_matrix = Matrix::IDENTITY;
        let mut in_text = false;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "rg" | "g" | "k" | "sc" | "scn" => {
                    if let Some(color) = fill_color(operands) {
                        gs.fill = color;
                    }
                }
                "BT" => {
                    in_text = true;
                    text_matrix = Matrix::IDENTITY;
                    line_matrix = Matrix::IDENTITY;
                }
                "ET" => in_text = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            gs.font = name.clone();
                        }
                        gs.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "Tc" => gs.char_spacing = operands.first().and_then(get_number).unwrap_or(0.0),
                "Tw" => gs.word_spacing = operands.first().and_then(get_number).unwrap_or(0.0),
                "Tz" => {
                    gs.horizontal_scale =
                        operands.first().and_then(get_number).unwrap_or(100.0) / 100.0
                }
                "TL" => gs.leading = operands.first().and_then(get_number).unwrap_or(0.0),
                "Tr" => {
                    gs.render_mode = operands.first().and_then(get_number).unwrap_or(0.0) as i64
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            gs.leading = -ty;
                        }
                        line_matrix = Matrix::translation(tx, ty).then(&line_matrix);
                        text_matrix = line_matrix;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        line_matrix = m;
                        text_matrix = m;
                    }
                }
                "T*" => {
                    line_matrix = Matrix::translation(0.0, -gs.leading).then(&line_matrix);
                    text_matrix = line_matrix;
                }
                "Tj" | "TJ" | "'" | "\"" if in_text => {
                    if op.operator == "'" || op.operator == "\"" {
                        if op.operator == "\"" && operands.len() >= 3 {
                            gs.word_spacing = get_number(&operands[0]).unwrap_or(0.0);
                            gs.char_spacing = get_number(&operands[1]).unwrap_or(0.0);
                        }
                        line_matrix = Matrix::translation(0.0, -gs.leading).then(&line_matrix);
                        text_matrix = line_matrix;
                    }
                    let shown = match op.operator.as_str() {
                        "TJ" => operands.first().cloned(),
                        "\"" => operands.get(2).cloned(),
                        _ => operands.first().cloned(),
                    };
                    if let Some(shown) = shown {
                        // invisible text still advances the text matrix
                        let segment = self.show(&shown, &gs, &mut text_matrix);
                        if let Some(segment) = segment.filter(|_| !is_invisible(gs.render_mode)) {
                            page.segments.push(segment);
                        }
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        page.placements.push(XObjectPlacement {
                            name: name.clone(),
                            ctm: gs.ctm,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(page)
    }

    /// Show a string or TJ array, advancing the text matrix.
    fn show(
        &self,
        operand: &Object,
        gs: &GraphicsState,
        text_matrix: &mut Matrix,
    ) -> Option<TextSegment> {
        let fallback;
        let metrics = match self.metrics.get(&gs.font) {
            Some(m) => m,
            None => {
                fallback = FontMetrics::unknown(&String::from_utf8_lossy(&gs.font));
                &fallback
            }
        };
        let encoding = self
            .fonts
            .get(&gs.font)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        let mut text = String::new();
        let mut advance = 0.0f32;

        let push_string = |bytes: &[u8], text: &mut String, advance: &mut f32| {
            let decoded = match &encoding {
                Some(enc) => LopdfDocument::decode_text(enc, bytes)
                    .unwrap_or_else(|_| decode_text_simple(bytes)),
                None => decode_text_simple(bytes),
            };
            text.push_str(&decoded);
            for code in metrics.codes(bytes) {
                let mut w = metrics.width(code) / 1000.0 * gs.font_size + gs.char_spacing;
                if code == 32 && !metrics.two_byte {
                    w += gs.word_spacing;
                }
                *advance += w * gs.horizontal_scale;
            }
        };

        match operand {
            Object::String(bytes, _) => push_string(bytes, &mut text, &mut advance),
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => push_string(bytes, &mut text, &mut advance),
                        Object::Integer(_) | Object::Real(_) => {
                            let adjustment = get_number(item).unwrap_or(0.0);
                            advance -= adjustment / 1000.0 * gs.font_size * gs.horizontal_scale;
                            if -adjustment > TJ_SPACE_THRESHOLD {
                                if let Some(last) = text.chars().last() {
                                    if !last.is_whitespace() && !is_spaceless_script_char(last) {
                                        text.push(' ');
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => return None,
        }

        let rendering = text_matrix.then(&gs.ctm);
        let (x, baseline) = rendering.apply(0.0, 0.0);
        let (end_x, _) = rendering.apply(advance, 0.0);
        let size = gs.font_size * rendering.vertical_scale();

        *text_matrix = Matrix::translation(advance, 0.0).then(text_matrix);

        if text.trim().is_empty() {
            return None;
        }

        Some(TextSegment {
            font: gs.font.clone(),
            text,
            x: x.min(end_x),
            baseline,
            width: (end_x - x).abs(),
            size,
            color: gs.fill,
        })
    }
}

/// Render modes 3 (neither fill nor stroke) and 7 (clip only) paint nothing.
pub(crate) fn is_invisible(render_mode: i64) -> bool {
    matches!(render_mode, 3 | 7)
}

/// Fill color from `rg`/`g`/`k`/`sc` operands by component count.
fn fill_color(operands: &[Object]) -> Option<Color> {
    let n: Vec<f32> = operands.iter().filter_map(get_number).collect();
    match n.len() {
        1 => Some(Color::from_unit(n[0], n[0], n[0])),
        3 => Some(Color::from_unit(n[0], n[1], n[2])),
        4 => {
            let (c, m, y, k) = (n[0], n[1], n[2], n[3]);
            Some(Color::from_unit(
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            ))
        }
        _ => None,
    }
}

/// Follow a reference one level.
pub(crate) fn resolve<'d>(doc: &'d LopdfDocument, obj: Option<&'d Object>) -> Option<&'d Object> {
    match obj? {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, walking up the page tree for inherited keys.
pub(crate) fn inherited<'d>(
    doc: &'d LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'d Object> {
    let mut current = doc.get_dictionary(page_id).ok();
    // Page trees are shallow; the bound only guards against Parent cycles.
    for _ in 0..64 {
        let dict = current?;
        if let Ok(obj) = dict.get(key) {
            return resolve(doc, Some(obj));
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    None
}

/// MediaBox origin and page size, defaulting to US Letter.
pub(crate) fn page_box(
    doc: &LopdfDocument,
    number: u32,
    page_id: ObjectId,
) -> ((f32, f32), PageGeometry) {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| resolve(doc, Some(o)).and_then(get_number))
                .collect::<Vec<f32>>()
        });

    match media_box {
        Some(b) if b.len() >= 4 => {
            let (x0, x1) = (b[0].min(b[2]), b[0].max(b[2]));
            let (y0, y1) = (b[1].min(b[3]), b[1].max(b[3]));
            ((x0, y0), PageGeometry::new(number, x1 - x0, y1 - y0))
        }
        _ => ((0.0, 0.0), PageGeometry::letter(number)),
    }
}

/// Name object as a string.
pub(crate) fn name_of(obj: Option<&Object>) -> Option<String> {
    obj.and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).to_string())
}

/// Helper to extract number from PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts that do not separate words with spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Text decoding fallback when no encoding is available.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_matrix_then() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 20.0);
        let m = scale.then(&shift);
        assert_eq!(m.apply(1.0, 1.0), (12.0, 22.0));
        let m = shift.then(&scale);
        assert_eq!(m.apply(1.0, 1.0), (22.0, 42.0));
        assert!(approx(scale.vertical_scale(), 2.0));
    }

    #[test]
    fn test_fill_color() {
        assert_eq!(
            fill_color(&[Object::Real(1.0), Object::Integer(0), Object::Integer(0)]),
            Some(Color::new(255, 0, 0))
        );
        assert_eq!(fill_color(&[Object::Integer(0)]), Some(Color::BLACK));
        assert_eq!(
            fill_color(&[
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1)
            ]),
            Some(Color::BLACK)
        );
        assert_eq!(fill_color(&[Object::Name(b"P0".to_vec())]), None);
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(decode_text_simple(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    #[test]
    fn test_unknown_font_uses_half_em() {
        let metrics = FontMetrics::unknown("F9");
        assert_eq!(metrics.width(65), 500.0);
        assert_eq!(metrics.codes(b"AB"), vec![65, 66]);
    }

    #[test]
    fn test_interpreter_positions_and_advances() {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        let interpreter = ContentInterpreter::new(&doc, &fonts);
        let page = interpreter
            .run(b"BT /F1 10 Tf 100 700 Td (AB) Tj (CD) Tj ET")
            .unwrap();
        assert_eq!(page.segments.len(), 2);
        let first = &page.segments[0];
        assert!(approx(first.x, 100.0));
        assert!(approx(first.baseline, 700.0));
        assert!(approx(first.width, 10.0));
        assert!(approx(first.size, 10.0));
        let second = &page.segments[1];
        assert!(approx(second.x, 110.0));
    }

    #[test]
    fn test_interpreter_applies_ctm_and_leading() {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        let interpreter = ContentInterpreter::new(&doc, &fonts);
        let page = interpreter
            .run(b"q 2 0 0 2 10 10 cm BT /F1 6 Tf 14 TL 5 5 Td (A) Tj T* (B) Tj ET Q 0 0 1 rg")
            .unwrap();
        assert_eq!(page.segments.len(), 2);
        assert!(approx(page.segments[0].x, 20.0));
        assert!(approx(page.segments[0].baseline, 20.0));
        assert!(approx(page.segments[0].size, 12.0));
        assert!(approx(page.segments[1].baseline, 20.0 - 28.0));
    }

    #[test]
    fn test_interpreter_tj_spacing_and_placements() {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        let interpreter = ContentInterpreter::new(&doc, &fonts);
        let page = interpreter
            .run(b"1 0 0 rg BT /F1 10 Tf [(Hello) -300 (World)] TJ ET q 50 0 0 40 10 20 cm /Im0 Do Q")
            .unwrap();
        assert_eq!(page.segments[0].text, "Hello World");
        assert_eq!(page.segments[0].color, Color::new(255, 0, 0));
        // 10 glyphs at 5pt plus a 3pt gap
        assert!(approx(page.segments[0].width, 53.0));
        assert_eq!(page.placements.len(), 1);
        assert_eq!(page.placements[0].name, b"Im0".to_vec());
        assert_eq!(page.placements[0].ctm.apply(1.0, 1.0), (60.0, 60.0));
    }

    #[test]
    fn test_interpreter_skips_invisible_text() {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        let interpreter = ContentInterpreter::new(&doc, &fonts);
        let page = interpreter
            .run(b"BT /F1 10 Tf 3 Tr 100 700 Td (Hidden) Tj 0 Tr (Shown) Tj ET")
            .unwrap();
        assert_eq!(page.segments.len(), 1);
        assert_eq!(page.segments[0].text, "Shown");
        // the hidden run still moved the pen
        assert!(approx(page.segments[0].x, 130.0));
    }

    #[test]
    fn test_render_mode_restored_by_q() {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        let interpreter = ContentInterpreter::new(&doc, &fonts);
        let page = interpreter
            .run(b"q 7 Tr BT /F1 10 Tf (Clip) Tj ET Q BT /F1 10 Tf (Ink) Tj ET")
            .unwrap();
        let texts: Vec<&str> = page.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Ink"]);
    }

    #[test]
    fn test_cid_widths_ignore_overflowing_start() {
        let doc = LopdfDocument::with_version("1.5");
        let w = vec![
            Object::Real(4.3e9),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            Object::Integer(3),
            Object::Array(vec![Object::Integer(250)]),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.get(&u32::MAX), Some(&500.0));
        assert_eq!(widths.get(&3), Some(&250.0));
        assert_eq!(widths.len(), 2);
    }
}
