//! Error types for docrewrite.

use std::io;
use thiserror::Error;

/// Result type alias for docrewrite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting, previewing or regenerating.
///
/// Low confidence and font substitution are never errors; they surface as
/// [`Warning`](crate::model::Warning)s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input bytes could not be decoded as the declared format.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The source or target format is outside the supported set.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Edited fields do not correspond to the stored layout.
    #[error("Invalid field set: {0}")]
    InvalidFieldSet(String),

    /// The underlying renderer or encoder failed.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Unknown, expired or cleared session.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The OCR or PDF backend is not installed or not reachable.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl Error {
    /// Whether the error is fatal only to the current call and leaves a
    /// session usable.
    pub fn is_call_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidFieldSet(_) | Error::Render(_) | Error::UnsupportedFormat(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Decode(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                Error::Decode(err.to_string())
            }
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::Render(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Render(format!("DOCX packaging failed: {}", err))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Render(format!("XML writing failed: {}", err))
    }
}
