//! Error taxonomy for the geometry kernel
//!
//! Every failure is surfaced to the immediate caller with the failing
//! argument identified. Undo/redo on an empty stack is not an error;
//! those operations return `false` instead.

use thiserror::Error;

/// Error type for geometry, boolean and export operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    /// A primitive parameter was non-positive or non-finite
    #[error("invalid dimension: {name} = {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    /// A mesh failed structural validation
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// The boolean engine rejected its inputs or produced invalid output
    #[error("boolean operation failed: {0}")]
    BooleanFailure(String),

    /// Export format not recognized by the core
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// An export backend was requested but is not available
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The external writer rejected the shape or I/O failed
    #[error("export failed: {0}")]
    ExportFailure(String),
}

/// Result type for kernel operations
pub type CadResult<T> = Result<T, CadError>;
