//! Warnings for a pending edit, without rendering anything.

use crate::error::Result;
use crate::model::{DocumentFormat, EditSet, LayoutModel, Warning, WarningCategory};
use crate::style::{unencodable_chars, StyleResolver};

/// Collect the warnings a caller should see before regenerating.
///
/// Validates `edits` exactly as regeneration does, so a successful preview
/// means regeneration will accept the same edit set. Per field, in layout
/// order: a font substitution warning when the style cannot be rendered as
/// requested, and a low confidence warning when an OCR value below
/// `threshold` is being kept unchanged. For PDF sources, values holding
/// characters the standard fonts cannot encode are flagged, since PDF
/// regeneration rejects them. An empty-result warning from extraction is
/// carried through last.
pub fn preview(
    layout: &LayoutModel,
    edits: &EditSet,
    extraction_warnings: &[Warning],
    resolver: &StyleResolver,
    threshold: f32,
) -> Result<Vec<Warning>> {
    layout.check_edits(edits)?;
    let values = edits.values();

    let mut warnings = Vec::new();
    for field in &layout.fields {
        warnings.extend(resolver.substitution_warning(field));

        let value = values.get(field.id.as_str()).copied().unwrap_or_default();
        if let Some(confidence) = field.confidence {
            if confidence < threshold && value == field.value {
                warnings.push(Warning::low_confidence(&field.id, confidence, threshold));
            }
        }

        if layout.format == DocumentFormat::Pdf {
            let missing = unencodable_chars(value.trim());
            if !missing.is_empty() {
                warnings.push(Warning::unencodable_text(&field.id, &missing));
            }
        }
    }

    warnings.extend(
        extraction_warnings
            .iter()
            .filter(|w| w.category == WarningCategory::EmptyResult)
            .cloned(),
    );
    Ok(warnings)
}
