//! Error types for layout processing.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the layout crate.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The layout document does not exist.
    #[error("Layout document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The layout document is not valid JSON or does not match the expected shape.
    #[error("Failed to parse layout document: {0}")]
    Json(#[from] serde_json::Error),

    /// The layout document parsed but is structurally unusable.
    #[error("Invalid layout document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
