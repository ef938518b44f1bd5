//! Error types for model construction.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building a model. Solving never fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Mount or dome geometry violates an invariant.
    #[error("Invalid geometry: {what}")]
    InvalidGeometry { what: String },

    #[error(transparent)]
    Core(#[from] ds_core::DsError),
}
