//! Error types for slide generation and deck enhancement.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting, building or enhancing decks.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a local file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The source document format is not supported.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to pull text out of a source document.
    #[error("Text extraction error: {0}")]
    ExtractionError(String),

    /// An image file is missing or could not be decoded.
    #[error("Image read error: {0}")]
    ImageReadError(String),

    /// The model call failed or returned something unusable.
    #[error("AI generation error: {0}")]
    AiGenerationError(String),

    /// Upload or download against the object store failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The PPTX package is structurally invalid.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (for PPTX/DOCX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX/DOCX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Slide plan (de)serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e.to_string())
    }
}
