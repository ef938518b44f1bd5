//! Error types for the ds-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The config file could not be read or parsed.
    #[error("Config file error: {0}")]
    ConfigFile(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bad geometry or settings, or a location that does not resolve.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transient device error: {0}")]
    TransientDevice(String),

    #[error("Actuation fault: {0}")]
    ActuationFault(String),

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ds-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Faults that need an operator before the dome may move again.
    pub fn is_fault(&self) -> bool {
        matches!(self, AppError::ActuationFault(_))
    }
}

impl From<ds_config::ConfigError> for AppError {
    fn from(err: ds_config::ConfigError) -> Self {
        use ds_config::ConfigError;
        match err {
            ConfigError::Validation(e) => AppError::Configuration(e.to_string()),
            ConfigError::Migration { what } => AppError::Configuration(what),
            e @ (ConfigError::UnknownFormat { .. }
            | ConfigError::Io(_)
            | ConfigError::Yaml(_)
            | ConfigError::Json(_)) => AppError::ConfigFile(e.to_string()),
        }
    }
}

impl From<ds_model::ModelError> for AppError {
    fn from(err: ds_model::ModelError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<ds_control::ControlError> for AppError {
    fn from(err: ds_control::ControlError) -> Self {
        use ds_control::ControlError;
        match err {
            ControlError::Configuration { what } => AppError::Configuration(what),
            ControlError::TransientDevice(e) => AppError::TransientDevice(e.to_string()),
            ControlError::ActuationFault { what } => AppError::ActuationFault(what),
            ControlError::InvalidArg { what } => AppError::InvalidInput(what.to_string()),
        }
    }
}

impl From<ds_control::DeviceError> for AppError {
    fn from(err: ds_control::DeviceError) -> Self {
        match err {
            ds_control::DeviceError::Unsupported { .. } => AppError::Unsupported {
                message: err.to_string(),
            },
            other => AppError::TransientDevice(other.to_string()),
        }
    }
}
