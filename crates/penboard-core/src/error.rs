//! Errors surfaced at the edges of the editor.
//!
//! The interaction core itself has no recoverable errors: a handler whose
//! precondition does not hold simply returns.

use thiserror::Error;

/// Editor errors.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Unknown line style: {0}")]
    UnknownLineStyle(String),
    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),
    #[error("Invalid zoom bounds: min {min}, max {max}")]
    ScaleBounds { min: f64, max: f64 },
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
