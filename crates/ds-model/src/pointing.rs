//! Telescope pointing snapshots.

/// Altitude/azimuth of the optical axis plus the hour angle it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    /// Altitude above the horizon, degrees.
    pub alt_deg: f64,
    /// Compass azimuth, degrees from north through east.
    pub az_deg: f64,
    /// Hour angle in hours, negative east of the meridian.
    pub ha_hours: f64,
}

impl HorizontalPosition {
    pub fn new(alt_deg: f64, az_deg: f64, ha_hours: f64) -> Self {
        Self {
            alt_deg,
            az_deg,
            ha_hours,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.alt_deg.is_finite() && self.az_deg.is_finite() && self.ha_hours.is_finite()
    }
}

/// Where the telescope is looking, as reported by the mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelescopePointing {
    /// Right ascension (hours) and declination (degrees); needs a transform.
    Equatorial { ra_hours: f64, dec_deg: f64 },
    /// Already resolved against the site and sidereal time.
    Horizontal(HorizontalPosition),
}

impl TelescopePointing {
    pub fn equatorial(ra_hours: f64, dec_deg: f64) -> Self {
        Self::Equatorial { ra_hours, dec_deg }
    }

    pub fn horizontal(alt_deg: f64, az_deg: f64, ha_hours: f64) -> Self {
        Self::Horizontal(HorizontalPosition::new(alt_deg, az_deg, ha_hours))
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Self::Equatorial { ra_hours, dec_deg } => ra_hours.is_finite() && dec_deg.is_finite(),
            Self::Horizontal(pos) => pos.is_finite(),
        }
    }
}
