//! Editable text fields and their geometry and style.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Axis-aligned box with a top-left origin.
///
/// Units are page points for PDF sources and pixels for images.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width (never negative)
    pub width: f32,
    /// Height (never negative)
    pub height: f32,
}

impl BoundingBox {
    /// Create a box, clamping negative dimensions to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Build a box from two corners in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Vertical center.
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unit-range components, as PDF operators carry them.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_byte(r), to_byte(g), to_byte(b))
    }

    /// Components in the 0..=1 range.
    pub fn to_unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b))
    }

    /// Uppercase hex without the leading `#`, as DOCX expects.
    pub fn to_hex_bare(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a #rrggbb color string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Color, E> {
                Color::from_hex(v).ok_or_else(|| E::custom(format!("invalid color: {}", v)))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

/// Broad typeface class used for substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontClass {
    Sans,
    Serif,
    Mono,
}

impl FontClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontClass::Sans => "sans",
            FontClass::Serif => "serif",
            FontClass::Mono => "mono",
        }
    }
}

impl fmt::Display for FontClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated style of an extracted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleHint {
    /// Font family as declared by the source (subset prefix removed)
    pub family: String,
    /// Size in points (PDF) or pixels (image)
    pub size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub color: Color,
    /// Class read from structural font data, when the source has any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_hint: Option<FontClass>,
}

impl StyleHint {
    /// Create a regular-weight black hint.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
            color: Color::BLACK,
            class_hint: None,
        }
    }

    /// Set bold.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set italic.
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Set color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the structural class hint.
    pub fn with_class_hint(mut self, class: FontClass) -> Self {
        self.class_hint = Some(class);
        self
    }

    /// Infer bold/italic from a PostScript-style font name.
    pub fn with_name_flags(mut self) -> Self {
        let lower = self.family.to_lowercase();
        self.bold = self.bold
            || ["bold", "black", "heavy", "semibold"]
                .iter()
                .any(|k| lower.contains(k));
        self.italic = self.italic || lower.contains("italic") || lower.contains("oblique");
        self
    }
}

/// One positioned, editable unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextField {
    /// Identifier, unique within the document
    pub id: String,
    /// Human-readable form label
    pub label: String,
    /// Current text (may be empty)
    pub value: String,
    /// 1-based page number
    pub page: u32,
    /// Where old content is erased and new content drawn
    pub bounding_box: BoundingBox,
    /// Estimated source style
    pub style_hint: StyleHint,
    /// OCR confidence in [0, 100]; absent for structural PDF text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TextField {
    /// Create a field with authoritative (non-OCR) text.
    pub fn new(
        id: impl Into<String>,
        value: impl Into<String>,
        bounding_box: BoundingBox,
        style_hint: StyleHint,
    ) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            value: value.into(),
            page: 1,
            bounding_box,
            style_hint,
            confidence: None,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the page number.
    pub fn on_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the OCR confidence, clamped to [0, 100].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 100.0));
        self
    }

    /// Confidence as reported to callers: absent means fully authoritative.
    pub fn effective_confidence(&self) -> f32 {
        self.confidence.unwrap_or(100.0)
    }
}
