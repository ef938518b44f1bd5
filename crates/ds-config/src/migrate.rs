//! Configuration format migration.
//!
//! Version 0 files come from the standalone tracker, which stored longitude
//! positive west. Version 1 stores it positive east.

use crate::ConfigError;
use crate::schema::DomeSyncConfig;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut config: DomeSyncConfig) -> Result<DomeSyncConfig, ConfigError> {
    while config.version < LATEST_VERSION {
        config = migrate_one_version(config)?;
    }
    Ok(config)
}

fn migrate_one_version(config: DomeSyncConfig) -> Result<DomeSyncConfig, ConfigError> {
    match config.version {
        0 => migrate_v0_to_v1(config),
        v => Err(ConfigError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut config: DomeSyncConfig) -> Result<DomeSyncConfig, ConfigError> {
    config.site_location.longitude_deg = -config.site_location.longitude_deg;
    config.version = 1;
    Ok(config)
}
