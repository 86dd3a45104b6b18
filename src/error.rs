//! Error types for pdfsift.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analysing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document layout could not be loaded or is malformed.
    #[error("Unreadable document {0}: {1}")]
    UnreadableDocument(String, String),

    /// A model file (heading classifier or cross-encoder) does not exist.
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The classifier model expects features this crate does not produce.
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The classifier model is structurally invalid.
    #[error("Invalid classifier model: {0}")]
    InvalidModel(String),

    /// The relevance scorer failed or returned an unusable answer.
    #[error("Relevance scoring failed: {0}")]
    Scorer(String),

    /// Local model inference (ONNX Runtime, tokenizer) failed.
    #[error("Inference error: {0}")]
    Inference(String),

    /// HTTP transport error talking to a model service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
