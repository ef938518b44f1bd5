//! Validation rejects configurations the runtime could not honor.

use ds_config::schema::*;
use ds_config::{MAX_POLL_INTERVAL_S, ValidationError, validate_config};

fn rejects(config: &DomeSyncConfig, field: &str) {
    match validate_config(config) {
        Err(ValidationError::InvalidValue { field: f, .. }) => assert_eq!(f, field),
        other => panic!("expected invalid {field}, got {other:?}"),
    }
}

#[test]
fn dome_radius_must_be_positive() {
    let mut config = DomeSyncConfig::default();
    config.geometry.dome_radius = 0.0;
    rejects(&config, "geometry.dome_radius");
    config.geometry.dome_radius = -1.0;
    rejects(&config, "geometry.dome_radius");
}

#[test]
fn rate_and_poll_interval_must_be_positive() {
    let mut config = DomeSyncConfig::default();
    config.tracking.rotation_rate_deg_per_s = 0.0;
    rejects(&config, "tracking.rotation_rate_deg_per_s");

    let mut config = DomeSyncConfig::default();
    config.tracking.poll_interval_s = -30.0;
    rejects(&config, "tracking.poll_interval_s");
}

#[test]
fn poll_interval_is_bounded() {
    let mut config = DomeSyncConfig::default();
    config.tracking.poll_interval_s = 1e30;
    rejects(&config, "tracking.poll_interval_s");

    config.tracking.poll_interval_s = MAX_POLL_INTERVAL_S;
    assert!(validate_config(&config).is_ok());
}

#[test]
fn tolerance_must_not_be_negative() {
    let mut config = DomeSyncConfig::default();
    config.tracking.tolerance_deg = -0.5;
    rejects(&config, "tracking.tolerance_deg");
    config.tracking.tolerance_deg = 0.0;
    validate_config(&config).unwrap();
}

#[test]
fn limits_must_not_be_inverted() {
    let mut config = DomeSyncConfig::default();
    config.tracking.limits = Some(LimitsDef {
        min_deg: 270.0,
        max_deg: 0.0,
    });
    rejects(&config, "tracking.limits");
}

#[test]
fn relay_channels_must_differ() {
    let config = DomeSyncConfig {
        actuator: ActuatorDef::Relay {
            switch: None,
            increase_channel: 1,
            decrease_channel: 1,
            monitor: true,
        },
        ..DomeSyncConfig::default()
    };
    rejects(&config, "actuator.decrease_channel");
}

#[test]
fn latitude_out_of_range() {
    let mut config = DomeSyncConfig::default();
    config.site_location.latitude_deg = 91.0;
    rejects(&config, "site_location.latitude_deg");
}

#[test]
fn malformed_location() {
    let config = DomeSyncConfig {
        telescope: "Telescope0".to_string(),
        ..DomeSyncConfig::default()
    };
    assert!(matches!(
        validate_config(&config),
        Err(ValidationError::InvalidLocation { .. })
    ));
}

#[test]
fn status_file_dome_cannot_slew() {
    let config = DomeSyncConfig {
        dome: Some(STATUS_FILE_LOCATION.to_string()),
        ..DomeSyncConfig::default()
    };
    assert!(matches!(
        validate_config(&config),
        Err(ValidationError::Unsupported { .. })
    ));
}

#[test]
fn future_version_rejected() {
    let config = DomeSyncConfig {
        version: ds_config::LATEST_VERSION + 1,
        ..DomeSyncConfig::default()
    };
    assert!(matches!(
        validate_config(&config),
        Err(ValidationError::UnsupportedVersion { .. })
    ));
}
