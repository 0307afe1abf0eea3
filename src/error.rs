//! Error types for the manuscript export library.

use std::io;
use thiserror::Error;

/// Result type alias for manuscript operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during an export run.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Profile, project or preview (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The export format name or file extension is not recognized.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// A text referenced by id does not exist in the project.
    #[error("Text not found: {0}")]
    MissingText(String),

    /// An object referenced by id does not exist in the project.
    #[error("Object not found: {0}")]
    MissingObject(String),

    /// A paragraph format referenced by id does not exist in the project.
    #[error("Paragraph format not found: {0}")]
    MissingFormat(String),

    /// An op could not be rendered by the target renderer.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The DOCX container could not be assembled.
    #[error("Packaging error: {0}")]
    Package(String),

    /// A single map rasterization failed.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat("pdf".to_string());
        assert_eq!(err.to_string(), "Unknown export format: pdf");

        let err = Error::MissingObject("O1".to_string());
        assert_eq!(err.to_string(), "Object not found: O1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
