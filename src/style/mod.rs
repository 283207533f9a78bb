//! Style resolution: mapping declared fonts onto renderable ones.
//!
//! # Example
//!
//! ```
//! use docrewrite::model::StyleHint;
//! use docrewrite::style::StyleResolver;
//!
//! let resolver = StyleResolver::default();
//! let resolution = resolver.resolve(&StyleHint::new("Georgia", 11.0));
//! assert!(resolution.substituted);
//! assert_eq!(resolution.style.base_font.name(), "Times-Roman");
//! ```

mod metrics;
mod table;

pub use metrics::{encode_win_ansi, unencodable_chars, StandardFont};
pub use table::{
    normalize_family, strip_subset_prefix, ClassFamilies, FontTable, KeywordRule,
    FONT_TABLE_VERSION,
};

use serde::Serialize;

use crate::model::{Color, FontClass, StyleHint, TextField, Warning};

/// Hard limits imposed by a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLimits {
    /// Smallest legible size in the renderer's unit
    pub min_size: f32,
}

impl RenderLimits {
    /// No limits.
    pub const NONE: RenderLimits = RenderLimits { min_size: 0.0 };

    pub fn new(min_size: f32) -> Self {
        Self { min_size }
    }
}

/// A concrete, renderable style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    /// Renderable family name (e.g. "Times")
    pub family: String,
    /// Standard font variant used for PDF output and metrics
    #[serde(serialize_with = "serialize_font_name")]
    pub base_font: StandardFont,
    pub class: FontClass,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
}

fn serialize_font_name<S: serde::Serializer>(
    font: &StandardFont,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(font.name())
}

impl ResolvedStyle {
    /// Width of `text` at this style's size.
    pub fn text_width(&self, text: &str) -> f32 {
        self.base_font.text_width(text, self.size)
    }

    /// Copy of this style at another size.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

/// Outcome of resolving a style hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub style: ResolvedStyle,
    /// Whether the requested family had to be replaced
    pub substituted: bool,
}

/// Maps style hints to renderable styles using a [`FontTable`].
///
/// Resolution is total: every hint, including empty or unknown family
/// names, resolves to some style.
#[derive(Debug, Clone, Default)]
pub struct StyleResolver {
    table: FontTable,
}

impl StyleResolver {
    /// Create a resolver over a specific table.
    pub fn new(table: FontTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub fn table(&self) -> &FontTable {
        &self.table
    }

    /// Resolve a hint without renderer limits.
    pub fn resolve(&self, hint: &StyleHint) -> Resolution {
        self.resolve_with(hint, RenderLimits::NONE)
    }

    /// Resolve a hint, clamping the size to the renderer's minimum.
    ///
    /// Clamping is cosmetic and is not reported as a substitution.
    pub fn resolve_with(&self, hint: &StyleHint, limits: RenderLimits) -> Resolution {
        let normalized = normalize_family(&hint.family);

        let (class, substituted) = match self.table.classify(&normalized) {
            Some(found) => found,
            None => (hint.class_hint.unwrap_or(self.table.default_class), true),
        };

        let base_font = StandardFont::from_parts(class, hint.bold, hint.italic);
        let size = if hint.size.is_finite() && hint.size > 0.0 {
            hint.size.max(limits.min_size)
        } else {
            limits.min_size.max(1.0)
        };

        log::trace!(
            "resolved font '{}' -> {} (substituted: {})",
            hint.family,
            base_font.name(),
            substituted
        );

        Resolution {
            style: ResolvedStyle {
                family: self.table.families.get(class).to_string(),
                base_font,
                class,
                size,
                bold: hint.bold,
                italic: hint.italic,
                color: hint.color,
            },
            substituted,
        }
    }

    /// Substitution warning for a field, if its font must be replaced.
    pub fn substitution_warning(&self, field: &TextField) -> Option<Warning> {
        let resolution = self.resolve(&field.style_hint);
        resolution.substituted.then(|| {
            let requested = if field.style_hint.family.trim().is_empty() {
                "(unnamed)".to_string()
            } else {
                strip_subset_prefix(&field.style_hint.family).to_string()
            };
            Warning::font_substitution(&field.id, requested, resolution.style.base_font.name())
        })
    }

    /// Substitution warnings for every field, in field order.
    pub fn substitution_warnings(&self, fields: &[TextField]) -> Vec<Warning> {
        fields
            .iter()
            .filter_map(|f| self.substitution_warning(f))
            .collect()
    }
}
