//! Layout model types shared by extraction, preview and regeneration.
//!
//! Every extraction strategy produces the same [`LayoutModel`]: an ordered
//! list of [`TextField`]s, any embedded [`ImageAsset`]s, and the page or
//! canvas geometry needed to draw them back.

mod asset;
mod field;
mod format;
mod layout;
mod warning;

pub use asset::{detect_mime_type, ImageAsset, ImageEncoding};
pub use field::{BoundingBox, Color, FontClass, StyleHint, TextField};
pub use format::{DocumentFormat, TargetFormat};
pub use layout::{
    EditSet, LayoutModel, Margins, OutputDocument, PageGeometry, SourceDocument, DEFAULT_MARGIN,
};
pub use warning::{Substitution, Warning, WarningCategory};
pub(crate) use warning::quote_chars;
