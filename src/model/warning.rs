//! Advisory warnings produced by extraction and preview.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningCategory {
    /// The requested font is not renderable and another family will be used
    FontSubstitution,
    /// OCR confidence for a field is below the configured threshold
    LowConfidence,
    /// Extraction produced no fields
    EmptyResult,
    /// A value holds characters the standard PDF fonts cannot draw
    UnencodableText,
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningCategory::FontSubstitution => "fontSubstitution",
            WarningCategory::LowConfidence => "lowConfidence",
            WarningCategory::EmptyResult => "emptyResult",
            WarningCategory::UnencodableText => "unencodableText",
        };
        f.write_str(name)
    }
}

/// Original and replacement family for a font substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub requested: String,
    pub resolved: String,
}

/// A human-readable advisory. Never blocks regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    /// Field the warning is about, if any
    pub field_id: Option<String>,
    pub message: String,
    pub category: WarningCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<Substitution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Warning {
    /// Font substitution for a field.
    pub fn font_substitution(
        field_id: impl Into<String>,
        requested: impl Into<String>,
        resolved: impl Into<String>,
    ) -> Self {
        let requested = requested.into();
        let resolved = resolved.into();
        Self {
            field_id: Some(field_id.into()),
            message: format!(
                "Font '{}' is not available and will be rendered as '{}'",
                requested, resolved
            ),
            category: WarningCategory::FontSubstitution,
            substitution: Some(Substitution {
                requested,
                resolved,
            }),
            confidence: None,
        }
    }

    /// Low OCR confidence for a field.
    pub fn low_confidence(field_id: impl Into<String>, confidence: f32, threshold: f32) -> Self {
        Self {
            field_id: Some(field_id.into()),
            message: format!(
                "Recognized text has {:.0}% confidence (below {:.0}%); please verify it",
                confidence, threshold
            ),
            category: WarningCategory::LowConfidence,
            substitution: None,
            confidence: Some(confidence),
        }
    }

    /// Extraction found no text.
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self {
            field_id: None,
            message: message.into(),
            category: WarningCategory::EmptyResult,
            substitution: None,
            confidence: None,
        }
    }

    /// Characters a PDF target cannot encode.
    pub fn unencodable_text(field_id: impl Into<String>, chars: &[char]) -> Self {
        Self {
            field_id: Some(field_id.into()),
            message: format!(
                "{} cannot be drawn with the standard PDF fonts; PDF output will fail",
                quote_chars(chars)
            ),
            category: WarningCategory::UnencodableText,
            substitution: None,
            confidence: None,
        }
    }

    /// Whether the warning concerns the given field.
    pub fn is_for(&self, field_id: &str) -> bool {
        self.field_id.as_deref() == Some(field_id)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_id {
            Some(id) => write!(f, "[{}] {}: {}", self.category, id, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

/// `'a', 'b'` style listing of characters.
pub(crate) fn quote_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_substitution_warning() {
        let w = Warning::font_substitution("k-f1", "Georgia", "Times");
        assert_eq!(w.category, WarningCategory::FontSubstitution);
        assert!(w.message.contains("Georgia"));
        assert_eq!(w.substitution.as_ref().unwrap().resolved, "Times");
        assert!(w.is_for("k-f1"));
    }

    #[test]
    fn test_category_serializes_camel_case() {
        let w = Warning::empty_result("nothing found");
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"emptyResult\""));
        assert!(json.contains("\"fieldId\":null"));
    }

    #[test]
    fn test_unencodable_text_warning() {
        let w = Warning::unencodable_text("k-f3", &['日', 'Ω']);
        assert_eq!(w.category, WarningCategory::UnencodableText);
        assert!(w.message.starts_with("'日', 'Ω' cannot be drawn"));
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"unencodableText\""));
    }

    #[test]
    fn test_display() {
        let w = Warning::low_confidence("k-f2", 42.0, 70.0);
        assert_eq!(
            w.to_string(),
            "[lowConfidence] k-f2: Recognized text has 42% confidence (below 70%); please verify it"
        );
    }
}
