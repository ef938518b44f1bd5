//! Error types for tracking and actuation.

use crate::devices::DeviceError;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised by the tracking controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Bad settings or unresolved collaborator at startup. Fatal.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// A device could not be reached this tick. The tick is skipped.
    #[error("Transient device error: {0}")]
    TransientDevice(#[from] DeviceError),

    /// The relay failed its check or misbehaved mid-drive. Both channels have
    /// been forced off; needs an operator.
    #[error("Actuation fault: {what}")]
    ActuationFault { what: String },

    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl ControlError {
    /// True when the next tick may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlError::TransientDevice(_))
    }
}

impl From<ds_model::ModelError> for ControlError {
    fn from(e: ds_model::ModelError) -> Self {
        ControlError::Configuration {
            what: e.to_string(),
        }
    }
}
