//! ds-config: domesync configuration file format and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{MAX_POLL_INTERVAL_S, ValidationError, is_location, validate_config};

use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Unknown config format: {path}")]
    UnknownFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn finish(config: DomeSyncConfig) -> ConfigResult<DomeSyncConfig> {
    let config = migrate_to_latest(config)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn from_yaml_str(content: &str) -> ConfigResult<DomeSyncConfig> {
    finish(serde_yaml::from_str(content)?)
}

pub fn from_json_str(content: &str) -> ConfigResult<DomeSyncConfig> {
    finish(serde_json::from_str(content)?)
}

pub fn load_yaml(path: &Path) -> ConfigResult<DomeSyncConfig> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, config: &DomeSyncConfig) -> ConfigResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ConfigResult<DomeSyncConfig> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn save_json(path: &Path, config: &DomeSyncConfig) -> ConfigResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.yaml`/`.yml` or `.json`.
pub fn load(path: &Path) -> ConfigResult<DomeSyncConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ConfigError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Save by extension: `.yaml`/`.yml` or `.json`.
pub fn save(path: &Path, config: &DomeSyncConfig) -> ConfigResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => save_yaml(path, config),
        Some("json") => save_json(path, config),
        _ => Err(ConfigError::UnknownFormat {
            path: path.display().to_string(),
        }),
    }
}
