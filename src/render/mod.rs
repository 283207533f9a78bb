//! Rendering of layouts and warnings for display and transport.

mod json;
mod result;
mod text;

pub use json::{to_json, JsonFormat};
pub use result::{ExtractionReport, ExtractionStats};
pub use text::to_text;
