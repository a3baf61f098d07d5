//! Error types for scan operations.

use thiserror::Error;

/// Errors surfaced by the scan pipeline.
///
/// Parsing failures mostly degrade to "fewer records" instead of erroring;
/// the variants here cover the cases a caller genuinely has to branch on.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No tabular section found in the captured output.
    #[error("no table found in output")]
    NoTable,

    /// File I/O failure (capture fallback files).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience alias for results with [`ScanError`].
pub type Result<T> = std::result::Result<T, ScanError>;
