//! Extraction of positioned text fields from source documents.
//!
//! Extraction strategies implement [`Extractor`] and are registered in an
//! [`ExtractorRegistry`] keyed by [`DocumentFormat`]. The registry picks the
//! strategy from the document's declared format.
//!
//! # Example
//!
//! ```no_run
//! use docrewrite::extract::ExtractorRegistry;
//! use docrewrite::model::{DocumentFormat, SourceDocument};
//! use docrewrite::EditorConfig;
//!
//! fn main() -> docrewrite::Result<()> {
//!     let registry = ExtractorRegistry::with_defaults(&EditorConfig::default());
//!     let bytes = std::fs::read("resume.pdf")?;
//!     let source = SourceDocument::new(bytes, DocumentFormat::Pdf);
//!
//!     let extraction = registry.extract(&source)?;
//!     for field in &extraction.layout.fields {
//!         println!("{}: {}", field.label, field.value);
//!     }
//!     Ok(())
//! }
//! ```

pub(crate) mod content;
mod labels;
mod ocr;
mod pdf;
mod tesseract;

pub use labels::{ocr_label, pdf_label};
pub use ocr::{merge_words, OcrEngine, OcrExtractor, OcrLine, OcrWord};
pub use pdf::PdfExtractor;
pub use tesseract::TesseractEngine;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::model::{DocumentFormat, LayoutModel, SourceDocument, Warning, WarningCategory};
use crate::style::StyleResolver;

/// Layout plus the advisories raised while producing it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub layout: LayoutModel,
    pub warnings: Vec<Warning>,
}

impl Extraction {
    pub fn new(layout: LayoutModel, warnings: Vec<Warning>) -> Self {
        Self { layout, warnings }
    }

    /// Whether extraction found no text.
    pub fn is_empty(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.category == WarningCategory::EmptyResult)
    }
}

/// Trait for extraction strategies.
///
/// Implement this trait to support a new source format.
pub trait Extractor: Send + Sync {
    /// Get the name of this extractor.
    fn name(&self) -> &str;

    /// Formats this extractor accepts.
    fn supported_formats(&self) -> &[DocumentFormat];

    /// Whether the extractor's backend can run right now.
    fn is_available(&self) -> bool {
        true
    }

    /// Extract fields, images and geometry.
    fn extract(&self, source: &SourceDocument) -> Result<Extraction>;

    /// Check if this extractor handles the given format.
    fn supports(&self, format: DocumentFormat) -> bool {
        self.supported_formats().contains(&format)
    }
}

/// Registry mapping document formats to extractors.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentFormat, Arc<dyn Extractor>>,
    by_name: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the PDF extractor and the tesseract-backed
    /// OCR extractor for every image format.
    pub fn with_defaults(config: &EditorConfig) -> Self {
        let resolver = StyleResolver::new(config.font_table.clone());
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::with_options(
            config.extract.clone(),
            resolver,
        )));
        registry.register(Arc::new(OcrExtractor::new(
            Arc::new(TesseractEngine::new(&config.ocr)),
            config.ocr.clone(),
        )));
        registry
    }

    /// Register an extractor for all of its formats.
    ///
    /// A later registration replaces an earlier one for the same format.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        for format in extractor.supported_formats() {
            self.extractors.insert(*format, extractor.clone());
        }
        self.by_name
            .insert(extractor.name().to_lowercase(), extractor);
    }

    /// Get the extractor for a format.
    pub fn get(&self, format: DocumentFormat) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&format).cloned()
    }

    /// Get an extractor by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Extractor>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format has an extractor.
    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.extractors.contains_key(&format)
    }

    /// Whether the extractor for `format` exists and can run.
    pub fn is_available(&self, format: DocumentFormat) -> bool {
        self.get(format).is_some_and(|e| e.is_available())
    }

    /// Extract a document with the extractor for its declared format.
    pub fn extract(&self, source: &SourceDocument) -> Result<Extraction> {
        let extractor = self.get(source.format()).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no extractor for format: {}", source.format()))
        })?;

        log::debug!(
            "extracting {} bytes of {} with '{}'",
            source.len(),
            source.format(),
            extractor.name()
        );
        extractor.extract(source)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults(&EditorConfig::default())
    }
}

/// Emit the standard empty-result warning when `layout` has no fields.
pub(crate) fn empty_result_warning(layout: &LayoutModel) -> Option<Warning> {
    layout.is_empty().then(|| {
        let message = if layout.format.is_image() {
            "No text was recognized in the image"
        } else {
            "No text was found in the document"
        };
        Warning::empty_result(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = ExtractorRegistry::with_defaults(&EditorConfig::default());
        for format in DocumentFormat::ALL {
            assert!(registry.supports(format), "{}", format);
        }
        assert_eq!(registry.get(DocumentFormat::Pdf).unwrap().name(), "pdf");
        assert_eq!(registry.get(DocumentFormat::Png).unwrap().name(), "ocr");
        assert!(registry.get_by_name("PDF").is_some());
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = ExtractorRegistry::new();
        let source = SourceDocument::new(b"%PDF-1.4".to_vec(), DocumentFormat::Pdf);
        assert!(matches!(
            registry.extract(&source),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(!registry.is_available(DocumentFormat::Pdf));
    }
}
