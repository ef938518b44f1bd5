//! Configuration to runtime wiring.
//!
//! Locations are resolved once here. `/Class/name` locations resolve to the
//! built-in simulated devices; `status-file` resolves to the legacy status
//! files. Anything else is a configuration error.

use crate::clock::SystemSiderealClock;
use crate::error::{AppError, AppResult};
use crate::sim::{SimulatedDome, SimulatedRelay, SimulatedTelescope, shared_motion};
use crate::status_files::{StatusFileAzimuth, StatusFileTelescope};
use ds_config::schema::{
    ActuatorDef, DeviationPolicyDef, DomeSyncConfig, MountTypeDef, STATUS_FILE_LOCATION,
    SouthernFlipDef,
};
use ds_control::{
    Actuation, AzimuthLimits, AzimuthSensor, DeviationPolicy, DomeDevice, PollConfig,
    RelayChannels, RelayDriver, RelaySwitch, TelescopeSource, TrackingController,
    TrackingSettings,
};
use ds_model::{AzimuthModel, MountGeometry, MountType, SouthernFlip};
use std::time::Duration;

/// Which kind of device a location names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Simulated,
    StatusFile,
}

/// Resolve a location for a device class such as `Dome` or `Telescope`.
///
/// # Errors
///
/// Returns `Configuration` if the location names another class or is
/// malformed.
pub fn resolve_location(class: &str, location: &str) -> AppResult<Resolved> {
    if location == STATUS_FILE_LOCATION {
        return Ok(Resolved::StatusFile);
    }
    let mut parts = location.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(c), Some(name), None) if c == class && !name.is_empty() => {
            Ok(Resolved::Simulated)
        }
        _ => Err(AppError::Configuration(format!(
            "cannot resolve {class} location {location:?}"
        ))),
    }
}

fn dome_location(config: &DomeSyncConfig) -> &str {
    config.dome.as_deref().unwrap_or("/Dome/0")
}

pub fn mount_type(def: MountTypeDef) -> MountType {
    match def {
        MountTypeDef::AltAz => MountType::AltAz,
        MountTypeDef::Fork => MountType::Fork,
        MountTypeDef::GermanEquatorial => MountType::GermanEquatorial,
    }
}

pub fn build_geometry(config: &DomeSyncConfig) -> AppResult<MountGeometry> {
    resolve_location("Site", &config.site)?;
    let g = &config.geometry;
    let geometry = MountGeometry::new(
        config.site_location.latitude_deg,
        g.dome_radius,
        g.dec_axis_height,
        g.dec_axis_length,
        g.dec_axis_offset,
    )?
    .with_mount_type(mount_type(g.mount_type));
    Ok(geometry)
}

pub fn build_model(config: &DomeSyncConfig) -> AppResult<AzimuthModel> {
    let flip = match config.solver.southern_flip {
        SouthernFlipDef::Radians => SouthernFlip::Radians,
        SouthernFlipDef::Degrees => SouthernFlip::Degrees,
    };
    Ok(AzimuthModel::new(build_geometry(config)?).with_southern_flip(flip))
}

pub fn build_settings(config: &DomeSyncConfig) -> AppResult<TrackingSettings> {
    let t = &config.tracking;
    let policy = match t.deviation {
        DeviationPolicyDef::Signed => DeviationPolicy::Signed,
        DeviationPolicyDef::ShortestPath => DeviationPolicy::ShortestPath,
    };
    let mut settings = TrackingSettings::new(t.tolerance_deg, t.rotation_rate_deg_per_s)?
        .with_iterations(config.solver.iterations)
        .with_policy(policy)
        .with_cancel_slice(Duration::from_millis(t.cancel_slice_ms));
    if let Some(limits) = &t.limits {
        settings = settings.with_limits(AzimuthLimits::new(limits.min_deg, limits.max_deg)?);
    }
    if let Some(resolution) = config.az_resolution_deg {
        settings = settings.with_az_resolution(resolution);
    }
    Ok(settings)
}

pub fn poll_config(config: &DomeSyncConfig) -> AppResult<PollConfig> {
    PollConfig::new(config.tracking.poll_interval_s)
        .map_err(|e| AppError::Configuration(format!("tracking.poll_interval_s: {e}")))
}

pub fn build_telescope(config: &DomeSyncConfig) -> AppResult<Box<dyn TelescopeSource>> {
    let telescope: Box<dyn TelescopeSource> =
        match resolve_location("Telescope", &config.telescope)? {
            Resolved::Simulated => Box::new(SimulatedTelescope::new(
                config.simulation.ra_hours,
                config.simulation.dec_deg,
            )),
            Resolved::StatusFile => Box::new(StatusFileTelescope::new(
                config.status_files.telcoords.clone(),
            )),
        };
    Ok(telescope)
}

fn simulated_dome(config: &DomeSyncConfig, motion: crate::sim::SharedMotion) -> SimulatedDome {
    let dome = SimulatedDome::new(config.device.clone(), motion);
    match config.simulation.dome_resolution_deg {
        Some(step) => dome.with_resolution(step),
        None => dome,
    }
}

/// Closed-loop dome device.
///
/// # Errors
///
/// Returns `Configuration` if the dome location does not name a dome that
/// can slew.
pub fn build_dome(config: &DomeSyncConfig) -> AppResult<Box<dyn DomeDevice>> {
    match resolve_location("Dome", dome_location(config))? {
        Resolved::Simulated => {
            let motion = shared_motion(
                config.simulation.dome_az_deg,
                config.tracking.rotation_rate_deg_per_s,
            );
            Ok(Box::new(simulated_dome(config, motion)))
        }
        Resolved::StatusFile => Err(AppError::Configuration(
            "a status-file dome cannot slew; use the relay actuator".to_string(),
        )),
    }
}

pub fn build_actuation(config: &DomeSyncConfig) -> AppResult<Actuation> {
    match &config.actuator {
        ActuatorDef::ClosedLoop => Ok(Actuation::ClosedLoop(build_dome(config)?)),
        ActuatorDef::Relay {
            switch,
            increase_channel,
            decrease_channel,
            monitor,
        } => {
            let channels = RelayChannels::new(*increase_channel, *decrease_channel)?;
            let motion = shared_motion(
                config.simulation.dome_az_deg,
                config.tracking.rotation_rate_deg_per_s,
            );

            let sensor: Box<dyn AzimuthSensor> =
                match resolve_location("Dome", dome_location(config))? {
                    Resolved::Simulated => Box::new(simulated_dome(config, motion.clone())),
                    Resolved::StatusFile => Box::new(StatusFileAzimuth::new(
                        config.status_files.dome_azimuth.clone(),
                    )),
                };

            let switch_location = switch.as_deref().unwrap_or("/Switch/0");
            let relay: Box<dyn RelaySwitch> = match resolve_location("Switch", switch_location)? {
                Resolved::Simulated => Box::new(SimulatedRelay::new(motion, channels)),
                Resolved::StatusFile => {
                    return Err(AppError::Configuration(
                        "a power switch cannot be a status file".to_string(),
                    ));
                }
            };

            let driver = RelayDriver::new(relay, channels)
                .with_slice(Duration::from_millis(config.tracking.cancel_slice_ms))
                .with_monitoring(*monitor);
            Ok(Actuation::Relay { sensor, driver })
        }
    }
}

/// Assemble a tracking controller with every collaborator resolved.
pub fn build_controller(config: &DomeSyncConfig) -> AppResult<TrackingController> {
    let model = build_model(config)?;
    let settings = build_settings(config)?;
    let clock = Box::new(SystemSiderealClock::new(config.site_location.longitude_deg));
    let telescope = build_telescope(config)?;
    let actuation = build_actuation(config)?;
    let controller = TrackingController::new(model, settings, clock, telescope, actuation)?;
    tracing::info!(
        device = %config.device,
        latitude = config.site_location.latitude_deg,
        dome_radius = config.geometry.dome_radius,
        tolerance_deg = controller.state().tolerance_deg,
        "dome sync runtime ready"
    );
    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_resolve_by_class() {
        assert_eq!(resolve_location("Dome", "/Dome/0").unwrap(), Resolved::Simulated);
        assert_eq!(
            resolve_location("Dome", "status-file").unwrap(),
            Resolved::StatusFile
        );
        assert!(resolve_location("Dome", "/Telescope/0").is_err());
        assert!(resolve_location("Dome", "Dome").is_err());
    }

    #[test]
    fn default_config_builds() {
        let config = DomeSyncConfig::default();
        let controller = build_controller(&config).unwrap();
        assert!(!controller.actuation().is_open_loop());
        assert_eq!(controller.settings().iterations, 10);
    }

    #[test]
    fn configured_resolution_raises_tolerance() {
        let config = DomeSyncConfig {
            az_resolution_deg: Some(7.5),
            ..DomeSyncConfig::default()
        };
        let controller = build_controller(&config).unwrap();
        assert_eq!(controller.state().tolerance_deg, 7.5);
    }

    #[test]
    fn huge_poll_interval_is_an_error_not_a_panic() {
        let mut config = DomeSyncConfig::default();
        config.tracking.poll_interval_s = 1e30;
        assert!(matches!(
            poll_config(&config),
            Err(AppError::Configuration(_))
        ));
        config.tracking.poll_interval_s = 30.0;
        assert_eq!(poll_config(&config).unwrap().period, Duration::from_secs(30));
    }

    #[test]
    fn bad_geometry_is_configuration_error() {
        let mut config = DomeSyncConfig::default();
        config.geometry.dome_radius = 0.0;
        assert!(matches!(
            build_controller(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
