//! Embedded raster images found in PDF sources.

use serde::{Deserialize, Serialize};

use super::field::BoundingBox;

/// How an image asset's bytes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// JPEG file bytes
    Jpeg,
    /// PNG file bytes
    Png,
    /// Decoded stream data that could not be re-encoded
    Raw,
}

impl ImageEncoding {
    /// Sniff an encoding from file bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match detect_mime_type(data)? {
            "image/jpeg" => Some(ImageEncoding::Jpeg),
            "image/png" => Some(ImageEncoding::Png),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Png => "image/png",
            ImageEncoding::Raw => "application/octet-stream",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
            ImageEncoding::Raw => "bin",
        }
    }
}

/// An embedded raster image and where it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    /// Identifier, unique within the document
    pub id: String,
    /// 1-based page number
    pub page: u32,
    /// XObject resource name on the page (e.g. "Im0")
    pub name: String,
    /// PDF object number and generation of the image stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<(u32, u16)>,
    /// Encoding of `data`
    pub encoding: ImageEncoding,
    /// Width in pixels
    pub pixel_width: u32,
    /// Height in pixels
    pub pixel_height: u32,
    /// Placement on the page, top-left origin, in points
    pub placement: BoundingBox,
    /// Image bytes
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ImageAsset {
    /// Suggested file name for exporting the asset.
    pub fn suggested_filename(&self) -> String {
        format!("{}.{}", self.id, self.encoding.extension())
    }

    pub fn mime_type(&self) -> &'static str {
        self.encoding.mime_type()
    }
}

/// Detect MIME type from magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // TIFF: II*\0 (little-endian) or MM\0* (big-endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some("image/tiff");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }

    None
}
