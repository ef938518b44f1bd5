//! Configuration validation logic.

use crate::schema::{ActuatorDef, DomeSyncConfig, STATUS_FILE_LOCATION};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid location: {location} in {context}")]
    InvalidLocation { location: String, context: String },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Longest poll interval accepted, in seconds (one day).
pub const MAX_POLL_INTERVAL_S: f64 = 86_400.0;

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite"))
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

/// Whether `location` looks like `/Class/name` or names the status files.
pub fn is_location(location: &str) -> bool {
    if location == STATUS_FILE_LOCATION {
        return true;
    }
    let mut parts = location.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(""), Some(class), Some(name), None) if !class.is_empty() && !name.is_empty()
    )
}

fn location(context: &str, value: &str) -> Result<(), ValidationError> {
    if is_location(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocation {
            location: value.to_string(),
            context: context.to_string(),
        })
    }
}

pub fn validate_config(config: &DomeSyncConfig) -> Result<(), ValidationError> {
    if config.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    if config.device.trim().is_empty() {
        return Err(invalid("device", "\"\"", "must not be empty"));
    }
    if let Some(dome) = &config.dome {
        location("dome", dome)?;
    }
    location("site", &config.site)?;
    if config.site == STATUS_FILE_LOCATION {
        return Err(ValidationError::InvalidLocation {
            location: config.site.clone(),
            context: "site".to_string(),
        });
    }
    location("telescope", &config.telescope)?;
    if let Some(res) = config.az_resolution_deg {
        positive("az_resolution_deg", res)?;
    }

    let site = &config.site_location;
    finite("site_location.latitude_deg", site.latitude_deg)?;
    if !(-90.0..=90.0).contains(&site.latitude_deg) {
        return Err(invalid(
            "site_location.latitude_deg",
            site.latitude_deg,
            "must lie in [-90, 90]",
        ));
    }
    finite("site_location.longitude_deg", site.longitude_deg)?;
    if !(-180.0..=180.0).contains(&site.longitude_deg) {
        return Err(invalid(
            "site_location.longitude_deg",
            site.longitude_deg,
            "must lie in [-180, 180]",
        ));
    }

    let g = &config.geometry;
    positive("geometry.dome_radius", g.dome_radius)?;
    finite("geometry.dec_axis_height", g.dec_axis_height)?;
    finite("geometry.dec_axis_length", g.dec_axis_length)?;
    finite("geometry.dec_axis_offset", g.dec_axis_offset)?;
    if g.dec_axis_length < 0.0 {
        return Err(invalid(
            "geometry.dec_axis_length",
            g.dec_axis_length,
            "must be >= 0",
        ));
    }

    let t = &config.tracking;
    positive("tracking.poll_interval_s", t.poll_interval_s)?;
    if t.poll_interval_s > MAX_POLL_INTERVAL_S {
        return Err(invalid(
            "tracking.poll_interval_s",
            t.poll_interval_s,
            "must be at most 86400 s",
        ));
    }
    if !t.tolerance_deg.is_finite() || t.tolerance_deg < 0.0 {
        return Err(invalid("tracking.tolerance_deg", t.tolerance_deg, "must be >= 0"));
    }
    positive("tracking.rotation_rate_deg_per_s", t.rotation_rate_deg_per_s)?;
    if t.cancel_slice_ms == 0 {
        return Err(invalid("tracking.cancel_slice_ms", 0, "must be positive"));
    }
    if let Some(limits) = &t.limits {
        finite("tracking.limits.min_deg", limits.min_deg)?;
        finite("tracking.limits.max_deg", limits.max_deg)?;
        if limits.min_deg > limits.max_deg {
            return Err(invalid(
                "tracking.limits",
                format!("{}..{}", limits.min_deg, limits.max_deg),
                "min must not exceed max",
            ));
        }
    }

    if let ActuatorDef::Relay {
        switch,
        increase_channel,
        decrease_channel,
        ..
    } = &config.actuator
    {
        if increase_channel == decrease_channel {
            return Err(invalid(
                "actuator.decrease_channel",
                decrease_channel,
                "must differ from increase_channel",
            ));
        }
        if let Some(switch) = switch {
            location("actuator.switch", switch)?;
        }
    } else if config.dome.as_deref() == Some(STATUS_FILE_LOCATION) {
        return Err(ValidationError::Unsupported {
            feature: "closed_loop actuator with status-file dome".to_string(),
            reason: "a status file can report azimuth but cannot slew".to_string(),
        });
    }

    let sim = &config.simulation;
    finite("simulation.ra_hours", sim.ra_hours)?;
    finite("simulation.dec_deg", sim.dec_deg)?;
    finite("simulation.dome_az_deg", sim.dome_az_deg)?;
    if let Some(res) = sim.dome_resolution_deg {
        positive("simulation.dome_resolution_deg", res)?;
    }

    Ok(())
}
