//! OCR extraction, preview and raster regeneration with a canned engine.

mod common;

use std::sync::Arc;

use common::{blank_png, resume_words, MockEngine};
use docrewrite::extract::{Extractor, OcrExtractor};
use docrewrite::model::{DocumentFormat, SourceDocument, TargetFormat, WarningCategory};
use docrewrite::{preview_warnings, Error, FontLibrary, OcrOptions, Regenerator};

fn extractor(engine: MockEngine) -> OcrExtractor {
    OcrExtractor::new(Arc::new(engine), OcrOptions::default())
}

fn png_source() -> SourceDocument {
    SourceDocument::new(blank_png(200, 100), DocumentFormat::Png)
}

/// A regenerator that never touches installed fonts.
fn fontless() -> Regenerator {
    Regenerator::default().with_fonts(Arc::new(FontLibrary::empty()))
}

#[test]
fn test_words_become_line_fields() {
    let extraction = extractor(MockEngine::new(resume_words()))
        .extract(&png_source())
        .unwrap();
    let layout = &extraction.layout;

    assert_eq!(layout.format, DocumentFormat::Png);
    assert_eq!(layout.pages.len(), 1);
    assert_eq!(layout.pages[0].width, 200.0);
    assert_eq!(layout.pages[0].height, 100.0);

    assert_eq!(layout.fields.len(), 2);
    assert_eq!(layout.fields[0].value, "Jane Doe");
    assert_eq!(layout.fields[1].value, "Engineer");
    assert_eq!(layout.fields[1].confidence, Some(42.0));

    let name = &layout.fields[0];
    assert_eq!(name.bounding_box.x, 10.0);
    assert_eq!(name.bounding_box.width, 76.0);
    assert_eq!(name.style_hint.size, 20.0);
    assert!(name.confidence.unwrap() > 90.0);
}

#[test]
fn test_low_confidence_warning_follows_edits() {
    let extraction = extractor(MockEngine::new(resume_words()))
        .extract(&png_source())
        .unwrap();
    let layout = extraction.layout;
    let weak = layout.fields[1].id.clone();

    let low: Vec<_> = extraction
        .warnings
        .iter()
        .filter(|w| w.category == WarningCategory::LowConfidence)
        .collect();
    assert_eq!(low.len(), 1);
    assert!(low[0].is_for(&weak));
    assert_eq!(low[0].confidence, Some(42.0));

    // unchanged value still carries the warning
    let warnings = preview_warnings(&layout, &layout.edits(), &extraction.warnings).unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.category == WarningCategory::LowConfidence && w.is_for(&weak)));

    // a corrected value clears it
    let edits = layout.edits().with_value(&weak, "Engineer II").unwrap();
    let warnings = preview_warnings(&layout, &edits, &extraction.warnings).unwrap();
    assert!(warnings
        .iter()
        .all(|w| w.category != WarningCategory::LowConfidence));
}

#[test]
fn test_no_text_is_an_empty_result() {
    let extraction = extractor(MockEngine::new(Vec::new()))
        .extract(&png_source())
        .unwrap();

    assert!(extraction.layout.fields.is_empty());
    assert_eq!(extraction.warnings.len(), 1);
    assert_eq!(extraction.warnings[0].category, WarningCategory::EmptyResult);

    // the empty result is repeated by preview
    let warnings = preview_warnings(
        &extraction.layout,
        &extraction.layout.edits(),
        &extraction.warnings,
    )
    .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, WarningCategory::EmptyResult);
}

#[test]
fn test_unavailable_engine() {
    let extractor = extractor(MockEngine::unavailable());
    assert!(!extractor.is_available());
    assert!(matches!(
        extractor.extract(&png_source()),
        Err(Error::BackendUnavailable(_))
    ));
}

#[test]
fn test_undecodable_image() {
    let source = SourceDocument::new(b"\x89PNG\r\n\x1a\nbroken".to_vec(), DocumentFormat::Png);
    let result = extractor(MockEngine::new(resume_words())).extract(&source);
    assert!(matches!(result, Err(Error::Decode(_))));
}

#[test]
fn test_erase_to_every_raster_target() {
    let source = png_source();
    let extraction = extractor(MockEngine::new(resume_words()))
        .extract(&source)
        .unwrap();
    let layout = extraction.layout;

    let mut edits = layout.edits();
    for field in &mut edits.fields {
        field.value.clear();
    }

    let regenerator = fontless();
    for target in [
        TargetFormat::Png,
        TargetFormat::Jpeg,
        TargetFormat::Bmp,
        TargetFormat::Tiff,
    ] {
        let output = regenerator
            .regenerate(&source, &layout, &edits, target)
            .unwrap();
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100), "{}", target);
    }

    let svg = regenerator
        .regenerate(&source, &layout, &edits, TargetFormat::Svg)
        .unwrap();
    let svg = String::from_utf8(svg.bytes).unwrap();
    assert!(svg.contains("<svg xmlns="));
    assert!(svg.contains("data:image/png;base64,"));
}

#[test]
fn test_text_without_fonts_is_a_render_error() {
    let source = png_source();
    let extraction = extractor(MockEngine::new(resume_words()))
        .extract(&source)
        .unwrap();
    let layout = extraction.layout;

    let result = fontless().regenerate(&source, &layout, &layout.edits(), TargetFormat::Png);
    assert!(matches!(result, Err(Error::Render(_))));
}

#[test]
fn test_image_source_cannot_become_pdf() {
    let source = png_source();
    let extraction = extractor(MockEngine::new(resume_words()))
        .extract(&source)
        .unwrap();
    let layout = extraction.layout;

    for target in [TargetFormat::Pdf, TargetFormat::Docx] {
        let result = fontless().regenerate(&source, &layout, &layout.edits(), target);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }
}
