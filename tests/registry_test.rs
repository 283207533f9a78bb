//! Integration tests for the extractor registry.

mod common;

use std::sync::Arc;

use common::{blank_png, MockEngine};
use docrewrite::error::Result;
use docrewrite::extract::{Extraction, Extractor, ExtractorRegistry, OcrExtractor, PdfExtractor};
use docrewrite::model::{DocumentFormat, LayoutModel, PageGeometry, SourceDocument};
use docrewrite::{EditorConfig, Error, OcrOptions};

/// Mock extractor for testing.
struct MockExtractor {
    formats: Vec<DocumentFormat>,
    name: &'static str,
}

impl MockExtractor {
    fn new(formats: Vec<DocumentFormat>, name: &'static str) -> Self {
        Self { formats, name }
    }
}

impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &self.formats
    }

    fn extract(&self, source: &SourceDocument) -> Result<Extraction> {
        let layout = LayoutModel::new(source, vec![PageGeometry::new(1, 10.0, 10.0)]);
        Ok(Extraction::new(layout, Vec::new()))
    }
}

#[test]
fn test_registry_new() {
    let registry = ExtractorRegistry::new();

    // Empty registry should support nothing
    assert!(!registry.supports(DocumentFormat::Pdf));
    assert!(!registry.supports(DocumentFormat::Png));
    assert!(!registry.is_available(DocumentFormat::Pdf));
}

#[test]
fn test_registry_with_defaults() {
    let registry = ExtractorRegistry::with_defaults(&EditorConfig::default());

    for format in DocumentFormat::ALL {
        assert!(registry.supports(format), "{}", format);
    }
    assert_eq!(registry.get(DocumentFormat::Pdf).unwrap().name(), "pdf");
    assert_eq!(registry.get(DocumentFormat::Tiff).unwrap().name(), "ocr");
    assert!(registry.is_available(DocumentFormat::Pdf));
}

#[test]
fn test_registry_get_by_name() {
    let registry = ExtractorRegistry::with_defaults(&EditorConfig::default());

    assert!(registry.get_by_name("pdf").is_some());
    assert!(registry.get_by_name("OCR").is_some()); // Case insensitive
    assert!(registry.get_by_name("unknown").is_none());
}

#[test]
fn test_later_registration_wins() {
    let mut registry = ExtractorRegistry::new();
    registry.register(Arc::new(PdfExtractor::new()));
    registry.register(Arc::new(MockExtractor::new(
        vec![DocumentFormat::Pdf, DocumentFormat::Bmp],
        "override",
    )));

    assert_eq!(registry.get(DocumentFormat::Pdf).unwrap().name(), "override");
    assert!(registry.supports(DocumentFormat::Bmp));
    assert!(!registry.supports(DocumentFormat::Png));
}

#[test]
fn test_registry_dispatches_by_declared_format() {
    let mut registry = ExtractorRegistry::new();
    registry.register(Arc::new(MockExtractor::new(vec![DocumentFormat::Png], "mock")));

    let source = SourceDocument::new(blank_png(10, 10), DocumentFormat::Png);
    let extraction = registry.extract(&source).unwrap();
    assert_eq!(extraction.layout.format, DocumentFormat::Png);
    assert_eq!(extraction.layout.source_key, source.key());

    let source = SourceDocument::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf);
    assert!(matches!(
        registry.extract(&source),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_ocr_extractor_formats() {
    let extractor = OcrExtractor::new(Arc::new(MockEngine::new(Vec::new())), OcrOptions::default());

    assert_eq!(extractor.name(), "ocr");
    assert_eq!(extractor.engine().name(), "mock");
    assert!(extractor.supports(DocumentFormat::Jpeg));
    assert!(extractor.supports(DocumentFormat::Tiff));
    assert!(!extractor.supports(DocumentFormat::Pdf));
}

#[test]
fn test_pdf_extractor_formats() {
    let extractor = PdfExtractor::new();

    assert_eq!(extractor.name(), "pdf");
    assert_eq!(extractor.supported_formats(), &[DocumentFormat::Pdf]);
    assert!(extractor.is_available());
}

#[test]
fn test_format_names() {
    assert_eq!("JPG".parse::<DocumentFormat>().unwrap(), DocumentFormat::Jpeg);
    assert_eq!(".tif".parse::<DocumentFormat>().unwrap(), DocumentFormat::Tiff);
    assert!("docx".parse::<DocumentFormat>().is_err());
}
