//! OCR extraction for raster images.
//!
//! An [`OcrEngine`] turns an image into positioned words; [`merge_words`]
//! groups them into line-level fields; [`OcrExtractor`] wraps both into an
//! [`Extractor`].

use std::cmp::Ordering;
use std::sync::Arc;

use image::DynamicImage;

use super::labels::ocr_label;
use super::{empty_result_warning, Extraction, Extractor};
use crate::config::OcrOptions;
use crate::error::{Error, Result};
use crate::imaging::{border_color, contrast_color, PixelRect};
use crate::model::{
    BoundingBox, Color, DocumentFormat, FontClass, LayoutModel, PageGeometry, SourceDocument,
    StyleHint, TextField, Warning,
};

/// Family assumed for recognized text.
const OCR_FAMILY: &str = "Arial";

/// A recognized word in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
    /// Engine confidence in [0, 100]
    pub confidence: f32,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// A run of words that became one field.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub bbox: BoundingBox,
    /// Character-weighted mean of the word confidences
    pub confidence: f32,
}

/// Text recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Get the name of this engine.
    fn name(&self) -> &str;

    /// Whether the backend can run right now.
    fn is_available(&self) -> bool;

    /// Recognize words in an image.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrWord>>;
}

/// Group words into line fields.
///
/// Words share a line when their vertical centers are close relative to
/// their heights; a line is split into separate fields at wide horizontal
/// gaps. The result is ordered top-to-bottom, then left-to-right.
pub fn merge_words(words: Vec<OcrWord>, options: &OcrOptions) -> Vec<OcrLine> {
    let mut words: Vec<OcrWord> = words
        .into_iter()
        .filter(|w| !w.text.trim().is_empty() && w.confidence >= options.min_word_confidence)
        .collect();
    words.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));

    let mut lines: Vec<(BoundingBox, Vec<OcrWord>)> = Vec::new();
    for word in words {
        let best = lines
            .iter()
            .enumerate()
            .filter_map(|(i, (bounds, _))| {
                let distance = (bounds.center_y() - word.bbox.center_y()).abs();
                let limit = options.line_tolerance * bounds.height.min(word.bbox.height);
                (distance <= limit).then_some((i, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        match best {
            Some(i) => {
                let (bounds, members) = &mut lines[i];
                *bounds = bounds.union(&word.bbox);
                members.push(word);
            }
            None => lines.push((word.bbox, vec![word])),
        }
    }

    let mut fields = Vec::new();
    for (bounds, mut members) in lines {
        members.sort_by(|a, b| a.bbox.x.total_cmp(&b.bbox.x));
        let max_gap = options.gap_factor * bounds.height;

        let mut group: Vec<OcrWord> = Vec::new();
        for word in members {
            if let Some(last) = group.last() {
                if word.bbox.x - last.bbox.right() > max_gap {
                    fields.push(join_words(std::mem::take(&mut group)));
                }
            }
            group.push(word);
        }
        if !group.is_empty() {
            fields.push(join_words(group));
        }
    }

    fields.sort_by(|a, b| match a.bbox.y.total_cmp(&b.bbox.y) {
        Ordering::Equal => a.bbox.x.total_cmp(&b.bbox.x),
        other => other,
    });
    fields
}

fn join_words(words: Vec<OcrWord>) -> OcrLine {
    let mut bbox = words[0].bbox;
    let mut weighted = 0.0f32;
    let mut chars = 0usize;
    for word in &words {
        bbox = bbox.union(&word.bbox);
        let n = word.text.trim().chars().count();
        weighted += word.confidence * n as f32;
        chars += n;
    }

    OcrLine {
        text: words
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" "),
        bbox,
        confidence: if chars == 0 {
            0.0
        } else {
            weighted / chars as f32
        },
    }
}

/// Extracts line-level fields from images with an [`OcrEngine`].
pub struct OcrExtractor {
    engine: Arc<dyn OcrEngine>,
    options: OcrOptions,
}

impl OcrExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, options: OcrOptions) -> Self {
        Self { engine, options }
    }

    /// The engine in use.
    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.engine
    }

    fn decode(&self, source: &SourceDocument) -> Result<DynamicImage> {
        let format = source.format().image_format().ok_or_else(|| {
            Error::UnsupportedFormat(format!("{} is not an image format", source.format()))
        })?;
        image::load_from_memory_with_format(source.bytes(), format)
            .map_err(|e| Error::Decode(format!("failed to decode {} image: {}", source.format(), e)))
    }
}

impl Extractor for OcrExtractor {
    fn name(&self) -> &str {
        "ocr"
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[
            DocumentFormat::Png,
            DocumentFormat::Jpeg,
            DocumentFormat::Bmp,
            DocumentFormat::Tiff,
        ]
    }

    fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    fn extract(&self, source: &SourceDocument) -> Result<Extraction> {
        let image = self.decode(source)?;

        if !self.engine.is_available() {
            return Err(Error::BackendUnavailable(format!(
                "OCR engine '{}' is not available; install tesseract-ocr and make sure it is on PATH",
                self.engine.name()
            )));
        }

        let words = self.engine.recognize(&image)?;
        log::debug!("{} recognized {} words", self.engine.name(), words.len());

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut layout = LayoutModel::new(
            source,
            vec![PageGeometry::new(1, width as f32, height as f32)],
        );
        let mut warnings = Vec::new();

        for line in merge_words(words, &self.options) {
            let n = layout.fields.len() + 1;
            let id = source.field_id(n);

            let size = (line.bbox.height * self.options.font_size_ratio).max(self.options.min_font_px);
            let color = PixelRect::covering(&line.bbox, width, height)
                .map(|rect| contrast_color(&rgb, rect, border_color(&rgb, rect)))
                .unwrap_or(Color::BLACK);
            let hint = StyleHint::new(OCR_FAMILY, size)
                .with_color(color)
                .with_class_hint(FontClass::Sans);

            let field = TextField::new(&id, &line.text, line.bbox, hint)
                .with_label(ocr_label(&line.text, line.bbox.y, n))
                .with_confidence(line.confidence);

            if field.effective_confidence() < self.options.low_confidence_threshold {
                warnings.push(Warning::low_confidence(
                    &id,
                    field.effective_confidence(),
                    self.options.low_confidence_threshold,
                ));
            }
            layout.fields.push(field);
        }

        layout.update_margins();
        warnings.extend(empty_result_warning(&layout));

        log::info!(
            "recognized {} fields in {}x{} image",
            layout.fields.len(),
            width,
            height
        );
        Ok(Extraction::new(layout, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f32, y: f32, w: f32, conf: f32) -> OcrWord {
        OcrWord::new(text, BoundingBox::new(x, y, w, 20.0), conf)
    }

    #[test]
    fn test_merge_words_into_lines() {
        let words = vec![
            word("Doe", 70.0, 12.0, 40.0, 90.0),
            word("Jane", 10.0, 10.0, 50.0, 80.0),
            word("Engineer", 10.0, 50.0, 90.0, 95.0),
        ];
        let lines = merge_words(words, &OcrOptions::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Jane Doe");
        assert_eq!(lines[0].bbox, BoundingBox::new(10.0, 10.0, 100.0, 22.0));
        // (80*4 + 90*3) / 7
        assert!((lines[0].confidence - 84.2857).abs() < 0.01);
        assert_eq!(lines[1].text, "Engineer");
    }

    #[test]
    fn test_merge_splits_wide_gaps() {
        let words = vec![
            word("Name", 10.0, 10.0, 60.0, 90.0),
            word("Value", 200.0, 10.0, 60.0, 90.0),
        ];
        let lines = merge_words(words, &OcrOptions::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Name");
        assert_eq!(lines[1].text, "Value");
    }

    #[test]
    fn test_merge_applies_noise_floor() {
        let words = vec![word("noise", 10.0, 10.0, 40.0, 5.0), word("  ", 60.0, 10.0, 5.0, 99.0)];
        assert_eq!(merge_words(words.clone(), &OcrOptions::default()).len(), 1);
        let options = OcrOptions::default().with_min_word_confidence(10.0);
        assert!(merge_words(words, &options).is_empty());
    }
}
