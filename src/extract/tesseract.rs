//! Tesseract command-line OCR backend.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use image::DynamicImage;

use super::ocr::{OcrEngine, OcrWord};
use crate::config::OcrOptions;
use crate::error::{Error, Result};
use crate::model::BoundingBox;

/// TSV row level for individual words.
const WORD_LEVEL: &str = "5";

/// Runs the `tesseract` executable and parses its TSV output.
#[derive(Debug)]
pub struct TesseractEngine {
    path: PathBuf,
    language: String,
    psm: u32,
    available: OnceLock<bool>,
}

impl TesseractEngine {
    pub fn new(options: &OcrOptions) -> Self {
        Self {
            path: options.tesseract_path.clone(),
            language: options.language.clone(),
            psm: options.page_segmentation_mode,
            available: OnceLock::new(),
        }
    }

    /// Language codes look like "eng", "eng+deu" or "chi_sim".
    fn validate_language(lang: &str) -> Result<()> {
        if lang.is_empty()
            || lang.len() > 32
            || !lang
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '_')
        {
            return Err(Error::BackendUnavailable(format!(
                "invalid tesseract language code '{}'",
                lang
            )));
        }
        Ok(())
    }

    /// Parse `tesseract ... tsv` output into words.
    pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
        tsv.lines()
            .filter_map(|line| {
                let cols: Vec<&str> = line.split('\t').collect();
                if cols.len() < 12 || cols[0] != WORD_LEVEL {
                    return None;
                }
                let num = |i: usize| cols[i].trim().parse::<f32>().ok();
                let (left, top, width, height, conf) = (num(6)?, num(7)?, num(8)?, num(9)?, num(10)?);
                let text = cols[11..].join("\t");
                if conf < 0.0 || text.trim().is_empty() {
                    return None;
                }
                Some(OcrWord::new(
                    text.trim(),
                    BoundingBox::new(left, top, width, height),
                    conf.min(100.0),
                ))
            })
            .collect()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let status = Command::new(&self.path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            let available = matches!(status, Ok(s) if s.success());
            if !available {
                log::warn!("tesseract not found at '{}'", self.path.display());
            }
            available
        })
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrWord>> {
        Self::validate_language(&self.language)?;

        let input = tempfile::Builder::new()
            .prefix("docrewrite-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), image::ImageFormat::Png)
            .map_err(|e| Error::Render(format!("failed to write OCR input: {}", e)))?;

        let output = Command::new(&self.path)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::BackendUnavailable(
                    format!(
                        "failed to run '{}': {}; install tesseract-ocr or set DOCREWRITE_TESSERACT",
                        self.path.display(),
                        e
                    ),
                ),
                _ => Error::Io(e),
            })?;

        if !output.status.success() {
            return Err(Error::Decode(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let words = Self::parse_tsv(&String::from_utf8_lossy(&output.stdout));
        log::debug!(
            "tesseract ({}, psm {}) returned {} words",
            self.language,
            self.psm,
            words.len()
        );
        Ok(words)
    }
}
