//! Pipeline configuration.
//!
//! Every policy constant the pipeline depends on (confidence threshold,
//! shrink floor, line-merge tolerances, session lifetime) lives here as a
//! builder-style option with a default.

use std::path::PathBuf;

use crate::style::FontTable;

/// Options for structural PDF extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Process pages in parallel
    pub parallel: bool,

    /// Infer semantic labels ("Email", "Phone", ...) instead of positional ones
    pub semantic_labels: bool,

    /// Below this many characters, a PDF with images is flagged as scanned
    pub scanned_text_threshold: usize,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel page processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable semantic labels.
    pub fn with_semantic_labels(mut self, enabled: bool) -> Self {
        self.semantic_labels = enabled;
        self
    }

    /// Set the scanned-document text threshold.
    pub fn with_scanned_text_threshold(mut self, chars: usize) -> Self {
        self.scanned_text_threshold = chars;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            semantic_labels: true,
            scanned_text_threshold: 50,
        }
    }
}

/// Options for OCR extraction.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract executable
    pub tesseract_path: PathBuf,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    pub language: String,

    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u32,

    /// Words below this confidence are discarded (0 keeps everything)
    pub min_word_confidence: f32,

    /// Fields below this confidence get a low-confidence warning
    pub low_confidence_threshold: f32,

    /// Max center distance, as a fraction of box height, to share a line
    pub line_tolerance: f32,

    /// Horizontal gap, in line heights, that splits a line into two fields
    pub gap_factor: f32,

    /// Font size as a fraction of the field's box height
    pub font_size_ratio: f32,

    /// Smallest estimated font size in pixels
    pub min_font_px: f32,
}

impl OcrOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tesseract executable.
    pub fn with_tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tesseract_path = path.into();
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: u32) -> Self {
        self.page_segmentation_mode = psm;
        self
    }

    /// Set the word noise floor.
    pub fn with_min_word_confidence(mut self, confidence: f32) -> Self {
        self.min_word_confidence = confidence;
        self
    }

    /// Set the low-confidence warning threshold.
    pub fn with_low_confidence_threshold(mut self, threshold: f32) -> Self {
        self.low_confidence_threshold = threshold;
        self
    }

    /// Set the line merge tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    /// Set the gap factor that splits a line.
    pub fn with_gap_factor(mut self, factor: f32) -> Self {
        self.gap_factor = factor;
        self
    }

    /// Set the box height → font size ratio.
    pub fn with_font_size_ratio(mut self, ratio: f32) -> Self {
        self.font_size_ratio = ratio;
        self
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            min_word_confidence: 0.0,
            low_confidence_threshold: 70.0,
            line_tolerance: 0.5,
            gap_factor: 2.0,
            font_size_ratio: 1.0,
            min_font_px: 8.0,
        }
    }
}

/// How erased regions are filled in raster output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EraseFill {
    /// Most common color along the box border
    #[default]
    Sampled,
    /// Always white
    White,
}

/// Options for regeneration.
#[derive(Debug, Clone)]
pub struct RegenerateOptions {
    /// Size decrement per shrink-to-fit step
    pub shrink_step: f32,

    /// Shrink floor for PDF output, in points
    pub pdf_shrink_floor: f32,

    /// Shrink floor for raster output, in pixels
    pub raster_shrink_floor: f32,

    /// Minimum legible PDF font size; smaller hints are clamped
    pub pdf_min_font_size: f32,

    /// Minimum legible raster font size; smaller hints are clamped
    pub raster_min_font_size: f32,

    /// Background fill for erased raster regions
    pub erase_fill: EraseFill,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Extra font directories for raster text
    pub font_dirs: Vec<PathBuf>,

    /// Whether to load the system's installed fonts
    pub system_fonts: bool,
}

impl RegenerateOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shrink step.
    pub fn with_shrink_step(mut self, step: f32) -> Self {
        self.shrink_step = step;
        self
    }

    /// Set both shrink floors.
    pub fn with_shrink_floor(mut self, floor: f32) -> Self {
        self.pdf_shrink_floor = floor;
        self.raster_shrink_floor = floor;
        self
    }

    /// Set the erase fill policy.
    pub fn with_erase_fill(mut self, fill: EraseFill) -> Self {
        self.erase_fill = fill;
        self
    }

    /// Set JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Add a font directory.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    /// Enable or disable system font loading.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }
}

impl Default for RegenerateOptions {
    fn default() -> Self {
        Self {
            shrink_step: 0.5,
            pdf_shrink_floor: 6.0,
            raster_shrink_floor: 6.0,
            pdf_min_font_size: 4.0,
            raster_min_font_size: 6.0,
            erase_fill: EraseFill::Sampled,
            jpeg_quality: 95,
            font_dirs: Vec::new(),
            system_fonts: true,
        }
    }
}

/// Options for the session store.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Idle time after which a session expires
    pub ttl: chrono::Duration,
}

impl SessionOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle lifetime.
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::hours(1),
        }
    }
}

/// All pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub extract: ExtractOptions,
    pub ocr: OcrOptions,
    pub regenerate: RegenerateOptions,
    pub session: SessionOptions,
    pub font_table: FontTable,
}

impl EditorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction options.
    pub fn with_extract(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    /// Set OCR options.
    pub fn with_ocr(mut self, options: OcrOptions) -> Self {
        self.ocr = options;
        self
    }

    /// Set regeneration options.
    pub fn with_regenerate(mut self, options: RegenerateOptions) -> Self {
        self.regenerate = options;
        self
    }

    /// Set session options.
    pub fn with_session(mut self, options: SessionOptions) -> Self {
        self.session = options;
        self
    }

    /// Set the font substitution table.
    pub fn with_font_table(mut self, table: FontTable) -> Self {
        self.font_table = table;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert!(config.extract.parallel);
        assert_eq!(config.ocr.low_confidence_threshold, 70.0);
        assert_eq!(config.ocr.min_word_confidence, 0.0);
        assert_eq!(config.regenerate.pdf_shrink_floor, 6.0);
        assert_eq!(config.regenerate.erase_fill, EraseFill::Sampled);
        assert_eq!(config.session.ttl, chrono::Duration::hours(1));
    }

    #[test]
    fn test_builders() {
        let config = EditorConfig::new()
            .with_extract(ExtractOptions::new().sequential())
            .with_ocr(
                OcrOptions::new()
                    .with_language("deu")
                    .with_psm(6)
                    .with_low_confidence_threshold(80.0),
            )
            .with_regenerate(RegenerateOptions::new().with_jpeg_quality(0).with_shrink_floor(8.0))
            .with_session(SessionOptions::new().with_ttl(chrono::Duration::minutes(5)));

        assert!(!config.extract.parallel);
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.ocr.low_confidence_threshold, 80.0);
        assert_eq!(config.regenerate.jpeg_quality, 1);
        assert_eq!(config.regenerate.raster_shrink_floor, 8.0);
        assert_eq!(config.session.ttl, chrono::Duration::minutes(5));
    }
}
