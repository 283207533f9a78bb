//! Extraction report with summary statistics.

use serde::Serialize;

use crate::model::{LayoutModel, Warning, WarningCategory};

/// A layout together with its warnings, as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport<'a> {
    /// Extracted layout
    pub layout: &'a LayoutModel,

    /// Warnings from extraction or preview
    pub warnings: &'a [Warning],

    /// Summary counts
    pub stats: ExtractionStats,
}

impl<'a> ExtractionReport<'a> {
    /// Build a report and compute its statistics.
    pub fn new(layout: &'a LayoutModel, warnings: &'a [Warning]) -> Self {
        Self {
            layout,
            warnings,
            stats: ExtractionStats::collect(layout, warnings),
        }
    }
}

/// Statistics about an extracted layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    /// Total number of pages (1 for images)
    pub page_count: u32,

    /// Number of editable fields
    pub field_count: u32,

    /// Number of embedded images
    pub image_count: u32,

    /// Characters of field text
    pub char_count: u32,

    /// Fields flagged for low OCR confidence
    pub low_confidence_count: u32,

    /// Fields whose font will be substituted
    pub substitution_count: u32,
}

impl ExtractionStats {
    /// Count everything in one pass over the layout and warnings.
    pub fn collect(layout: &LayoutModel, warnings: &[Warning]) -> Self {
        let count = |category: WarningCategory| {
            warnings.iter().filter(|w| w.category == category).count() as u32
        };
        Self {
            page_count: layout.pages.len() as u32,
            field_count: layout.fields.len() as u32,
            image_count: layout.images.len() as u32,
            char_count: layout.text_len() as u32,
            low_confidence_count: count(WarningCategory::LowConfidence),
            substitution_count: count(WarningCategory::FontSubstitution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, DocumentFormat, PageGeometry, SourceDocument, StyleHint, TextField};

    #[test]
    fn test_collect_stats() {
        let source = SourceDocument::new(b"img".to_vec(), DocumentFormat::Png);
        let mut layout = LayoutModel::new(&source, vec![PageGeometry::new(1, 100.0, 100.0)]);
        layout.fields.push(TextField::new(
            source.field_id(1),
            "Hello",
            BoundingBox::new(0.0, 0.0, 50.0, 10.0),
            StyleHint::new("Arial", 10.0),
        ));
        let warnings = vec![Warning::low_confidence(source.field_id(1), 40.0, 70.0)];

        let stats = ExtractionStats::collect(&layout, &warnings);
        assert_eq!(stats.page_count, 1);
        assert_eq!(stats.field_count, 1);
        assert_eq!(stats.char_count, 5);
        assert_eq!(stats.low_confidence_count, 1);
        assert_eq!(stats.substitution_count, 0);
    }
}
