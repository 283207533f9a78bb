//! Regeneration of documents from edited field values.
//!
//! Values come from the [`EditSet`]; geometry and style always come from
//! the stored [`LayoutModel`]. Each edit set is validated against the
//! layout before anything is rendered, so a failed call never produces
//! partial output.

mod docx;
mod fonts;
mod pdf;
mod raster;

pub use fonts::FontLibrary;

use std::sync::{Arc, OnceLock};

use crate::config::RegenerateOptions;
use crate::error::Result;
use crate::model::{EditSet, LayoutModel, OutputDocument, SourceDocument, TargetFormat};
use crate::style::StyleResolver;

/// Text may exceed its box by this fraction before it is shrunk.
const WIDTH_TOLERANCE: f32 = 0.01;

/// Renders edited layouts into output documents.
pub struct Regenerator {
    resolver: StyleResolver,
    options: RegenerateOptions,
    fonts: OnceLock<Arc<FontLibrary>>,
}

impl Regenerator {
    /// Create a regenerator; raster fonts load on first use.
    pub fn new(resolver: StyleResolver, options: RegenerateOptions) -> Self {
        Self {
            resolver,
            options,
            fonts: OnceLock::new(),
        }
    }

    /// Use a prepared font library instead of loading one.
    pub fn with_fonts(mut self, fonts: Arc<FontLibrary>) -> Self {
        self.fonts = OnceLock::from(fonts);
        self
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn options(&self) -> &RegenerateOptions {
        &self.options
    }

    /// Font faces for raster output.
    pub fn fonts(&self) -> &Arc<FontLibrary> {
        self.fonts
            .get_or_init(|| Arc::new(FontLibrary::new(&self.options)))
    }

    /// Regenerate `source` with the values in `edits` into `target`.
    pub fn regenerate(
        &self,
        source: &SourceDocument,
        layout: &LayoutModel,
        edits: &EditSet,
        target: TargetFormat,
    ) -> Result<OutputDocument> {
        layout.check_edits(edits)?;
        source.format().check_target(target)?;

        let values = edits.values();
        let bytes = match target {
            TargetFormat::Pdf => pdf::write(source, layout, &values, &edits.images, self)?,
            TargetFormat::Docx => docx::write(layout, &values, &edits.images, self)?,
            TargetFormat::Png
            | TargetFormat::Jpeg
            | TargetFormat::Bmp
            | TargetFormat::Tiff
            | TargetFormat::Svg => raster::write(source, layout, &values, target, self)?,
        };

        log::info!(
            "regenerated {} fields from {} into {} ({} bytes)",
            layout.fields.len(),
            source.format(),
            target,
            bytes.len()
        );
        Ok(OutputDocument::new(target, bytes))
    }
}

impl Default for Regenerator {
    fn default() -> Self {
        Self::new(StyleResolver::default(), RegenerateOptions::default())
    }
}

/// Shrink `size` until `measure(size)` fits `box_width`.
///
/// Steps down by `step` and never goes below `floor`; text that still
/// overflows at the floor is drawn overflowing. Sizes already below the
/// floor are left alone.
pub fn shrink_to_fit(
    size: f32,
    box_width: f32,
    step: f32,
    floor: f32,
    measure: impl Fn(f32) -> f32,
) -> f32 {
    let limit = box_width * (1.0 + WIDTH_TOLERANCE);
    if step <= 0.0 || box_width <= 0.0 {
        return size;
    }

    let mut size = size;
    while measure(size) > limit && size - step >= floor - f32::EPSILON {
        size -= step;
    }
    size
}
