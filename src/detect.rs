//! Source format detection and verification.

use crate::error::{Error, Result};
use crate::model::DocumentFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
const BMP_MAGIC: &[u8] = b"BM";

/// Detect a supported format from a file's leading bytes.
///
/// # Example
/// ```no_run
/// use docrewrite::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("resume.pdf").unwrap();
/// println!("format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut header = Vec::with_capacity(16);
    reader.take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect a supported format from bytes.
///
/// # Returns
/// * `Ok(DocumentFormat)` when the magic bytes match a supported format
/// * `Err(Error::UnsupportedFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocumentFormat> {
    if data.starts_with(PDF_MAGIC) {
        return Ok(DocumentFormat::Pdf);
    }
    if data.starts_with(PNG_MAGIC) {
        return Ok(DocumentFormat::Png);
    }
    if data.starts_with(JPEG_MAGIC) {
        return Ok(DocumentFormat::Jpeg);
    }
    if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        return Ok(DocumentFormat::Tiff);
    }
    if data.len() >= 6 && data.starts_with(BMP_MAGIC) {
        return Ok(DocumentFormat::Bmp);
    }
    Err(Error::UnsupportedFormat(
        "unrecognized file signature".to_string(),
    ))
}

/// Check that `data` really is the declared format.
///
/// A mismatch means the bytes cannot be decoded as declared, so it is a
/// decode error rather than an unsupported format.
pub fn verify_declared(data: &[u8], declared: DocumentFormat) -> Result<()> {
    if data.is_empty() {
        return Err(Error::Decode("empty input".to_string()));
    }
    match detect_format_from_bytes(data) {
        Ok(found) if found == declared => Ok(()),
        Ok(found) => Err(Error::Decode(format!(
            "declared {} but content looks like {}",
            declared, found
        ))),
        Err(_) => Err(Error::Decode(format!(
            "content is not a valid {} file",
            declared
        ))),
    }
}

/// PDF header version (e.g., "1.7"), if the data starts with a valid header.
pub fn pdf_version(data: &[u8]) -> Option<String> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return None;
    }
    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    is_valid_version(&version).then_some(version)
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if bytes carry a supported signature.
pub fn is_supported_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
