//! # docrewrite
//!
//! Edit the text of existing PDFs and scanned images in place.
//!
//! A document is turned into a [`LayoutModel`]: positioned, editable text
//! fields with an estimated style, plus embedded images and page geometry.
//! Callers change field values and regenerate the document; each field's box
//! is erased and the new value is drawn in the same place with the closest
//! renderable font.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docrewrite::model::TargetFormat;
//! use docrewrite::{inspect_file, regenerate_document};
//!
//! fn main() -> docrewrite::Result<()> {
//!     let (source, extraction) = inspect_file("resume.pdf")?;
//!     let layout = extraction.layout;
//!
//!     let first = layout.fields[0].id.clone();
//!     let edits = layout.edits().with_value(&first, "Jane Doe")?;
//!
//!     let output = regenerate_document(&source, &layout, &edits, TargetFormat::Pdf)?;
//!     std::fs::write("resume-edited.pdf", &output.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Structural PDF extraction**: text runs merged into fields, with fonts,
//!   sizes, colors and embedded images
//! - **OCR for images**: PNG, JPEG, BMP and TIFF through tesseract
//! - **Font substitution**: a versionable table maps unknown families onto
//!   the standard sans, serif and mono faces
//! - **Regeneration**: PDF overlay, DOCX, and PNG/JPEG/BMP/TIFF/SVG output
//! - **Sessions**: an [`Editor`] keeps uploads between preview and
//!   regeneration
//! - **Parallel processing**: uses Rayon for multi-page PDFs

pub mod config;
pub mod detect;
pub mod editor;
pub mod error;
pub mod extract;
mod imaging;
pub mod model;
pub mod preview;
pub mod regenerate;
pub mod render;
pub mod session;
pub mod style;

// Re-export commonly used types
pub use config::{
    EditorConfig, EraseFill, ExtractOptions, OcrOptions, RegenerateOptions, SessionOptions,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, verify_declared};
pub use editor::{
    extract_document, preview_warnings, regenerate_document, resolve_style, Editor, Health, Upload,
};
pub use error::{Error, Result};
pub use extract::{Extraction, Extractor, ExtractorRegistry, OcrEngine};
pub use model::{
    BoundingBox, Color, DocumentFormat, EditSet, ImageAsset, LayoutModel, OutputDocument,
    SourceDocument, StyleHint, TargetFormat, TextField, Warning, WarningCategory,
};
pub use regenerate::{FontLibrary, Regenerator};
pub use render::{ExtractionReport, JsonFormat};
pub use session::SessionStore;
pub use style::{FontTable, ResolvedStyle, StyleResolver};

use std::path::Path;

/// Read a file, detect its format and extract its layout.
///
/// Returns the source alongside the extraction so the caller can
/// regenerate without reading the file again.
///
/// # Example
///
/// ```no_run
/// use docrewrite::inspect_file;
///
/// let (_, extraction) = inspect_file("scan.png").unwrap();
/// for field in &extraction.layout.fields {
///     println!("{} = {}", field.label, field.value);
/// }
/// ```
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<(SourceDocument, Extraction)> {
    let bytes = std::fs::read(path)?;
    inspect_bytes(bytes)
}

/// Detect the format of `bytes` and extract their layout.
pub fn inspect_bytes(bytes: Vec<u8>) -> Result<(SourceDocument, Extraction)> {
    let format = detect_format_from_bytes(&bytes)?;
    let source = SourceDocument::new(bytes, format);
    let extraction = ExtractorRegistry::default().extract(&source)?;
    Ok((source, extraction))
}

/// Extract a file and render the layout and warnings as JSON.
///
/// # Example
///
/// ```no_run
/// use docrewrite::{to_json, JsonFormat};
///
/// let json = to_json("resume.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("resume.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let (_, extraction) = inspect_file(path)?;
    let report = ExtractionReport::new(&extraction.layout, &extraction.warnings);
    render::to_json(&report, format)
}

/// Extract a file and render the layout as plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let (_, extraction) = inspect_file(path)?;
    Ok(render::to_text(&extraction.layout, &extraction.warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_bytes_rejects_unknown_signature() {
        assert!(matches!(
            inspect_bytes(b"plain text".to_vec()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(matches!(
            inspect_file("/nonexistent/resume.pdf"),
            Err(Error::Io(_))
        ));
    }
}
