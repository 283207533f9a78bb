//! Source and target format tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF, extracted structurally
    Pdf,
    /// PNG image, extracted with OCR
    Png,
    /// JPEG image, extracted with OCR
    Jpeg,
    /// BMP image, extracted with OCR
    Bmp,
    /// TIFF image, extracted with OCR
    Tiff,
}

impl DocumentFormat {
    /// All supported source formats.
    pub const ALL: [DocumentFormat; 5] = [
        DocumentFormat::Pdf,
        DocumentFormat::Png,
        DocumentFormat::Jpeg,
        DocumentFormat::Bmp,
        DocumentFormat::Tiff,
    ];

    /// Lowercase name used in file extensions and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Png => "png",
            DocumentFormat::Jpeg => "jpeg",
            DocumentFormat::Bmp => "bmp",
            DocumentFormat::Tiff => "tiff",
        }
    }

    /// Whether this is a raster format that goes through OCR.
    pub fn is_image(&self) -> bool {
        !matches!(self, DocumentFormat::Pdf)
    }

    /// The `image` crate format for raster sources.
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            DocumentFormat::Pdf => None,
            DocumentFormat::Png => Some(image::ImageFormat::Png),
            DocumentFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            DocumentFormat::Bmp => Some(image::ImageFormat::Bmp),
            DocumentFormat::Tiff => Some(image::ImageFormat::Tiff),
        }
    }

    /// Output format that re-emits the source container.
    pub fn native_target(&self) -> TargetFormat {
        match self {
            DocumentFormat::Pdf => TargetFormat::Pdf,
            DocumentFormat::Png => TargetFormat::Png,
            DocumentFormat::Jpeg => TargetFormat::Jpeg,
            DocumentFormat::Bmp => TargetFormat::Bmp,
            DocumentFormat::Tiff => TargetFormat::Tiff,
        }
    }

    /// Target formats a document of this format can be regenerated into.
    pub fn supported_targets(&self) -> &'static [TargetFormat] {
        match self {
            DocumentFormat::Pdf => &[TargetFormat::Pdf, TargetFormat::Docx],
            _ => &[
                TargetFormat::Png,
                TargetFormat::Jpeg,
                TargetFormat::Bmp,
                TargetFormat::Tiff,
                TargetFormat::Svg,
            ],
        }
    }

    /// Check that `target` is reachable from this source format.
    pub fn check_target(&self, target: TargetFormat) -> Result<()> {
        if self.supported_targets().contains(&target) {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat(format!(
                "cannot produce {} from a {} source",
                target, self
            )))
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "png" => Ok(DocumentFormat::Png),
            "jpeg" | "jpg" => Ok(DocumentFormat::Jpeg),
            "bmp" => Ok(DocumentFormat::Bmp),
            "tiff" | "tif" => Ok(DocumentFormat::Tiff),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Requested output format for regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// PDF with text overlaid on the original pages
    Pdf,
    /// Word document built from the layout
    Docx,
    /// PNG raster
    Png,
    /// JPEG raster
    Jpeg,
    /// BMP raster
    Bmp,
    /// TIFF raster
    Tiff,
    /// SVG wrapping an embedded PNG
    Svg,
}

impl TargetFormat {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Pdf => "pdf",
            TargetFormat::Docx => "docx",
            TargetFormat::Png => "png",
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Bmp => "bmp",
            TargetFormat::Tiff => "tiff",
            TargetFormat::Svg => "svg",
        }
    }

    /// File extension for outputs of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    /// MIME type for outputs of this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Pdf => "application/pdf",
            TargetFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            TargetFormat::Png => "image/png",
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Bmp => "image/bmp",
            TargetFormat::Tiff => "image/tiff",
            TargetFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(TargetFormat::Pdf),
            "docx" => Ok(TargetFormat::Docx),
            "png" => Ok(TargetFormat::Png),
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "bmp" => Ok(TargetFormat::Bmp),
            "tiff" | "tif" => Ok(TargetFormat::Tiff),
            "svg" => Ok(TargetFormat::Svg),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_format() {
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert_eq!("jpg".parse::<DocumentFormat>().unwrap(), DocumentFormat::Jpeg);
        assert_eq!(".tif".parse::<DocumentFormat>().unwrap(), DocumentFormat::Tiff);
        assert!(matches!(
            "gif".parse::<DocumentFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_target_format() {
        assert_eq!("docx".parse::<TargetFormat>().unwrap(), TargetFormat::Docx);
        assert_eq!("SVG".parse::<TargetFormat>().unwrap(), TargetFormat::Svg);
        assert!(matches!(
            "heic".parse::<TargetFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_target_matrix() {
        assert!(DocumentFormat::Pdf.check_target(TargetFormat::Docx).is_ok());
        assert!(DocumentFormat::Pdf.check_target(TargetFormat::Png).is_err());
        assert!(DocumentFormat::Png.check_target(TargetFormat::Svg).is_ok());
        assert!(DocumentFormat::Jpeg.check_target(TargetFormat::Docx).is_err());
        assert_eq!(DocumentFormat::Bmp.native_target(), TargetFormat::Bmp);
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(TargetFormat::Jpeg.extension(), "jpg");
        assert_eq!(TargetFormat::Svg.mime_type(), "image/svg+xml");
    }
}
