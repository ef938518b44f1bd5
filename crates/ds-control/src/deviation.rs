//! Target-versus-current comparison.

use crate::error::{ControlError, ControlResult};
use ds_core::map180;

/// How the miss between target and current azimuth is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviationPolicy {
    /// Plain `target - current`. Never crosses north: going from 10 to 350
    /// is a -340 degree move. Use for domes whose cabling forbids passing
    /// through zero.
    #[default]
    Signed,
    /// Shortest arc in `[-180, 180)`.
    ShortestPath,
}

impl DeviationPolicy {
    pub fn deviation(self, target_deg: f64, current_deg: f64) -> f64 {
        match self {
            DeviationPolicy::Signed => target_deg - current_deg,
            DeviationPolicy::ShortestPath => map180(target_deg - current_deg),
        }
    }
}

/// Soft azimuth limits applied to the target before comparing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzimuthLimits {
    pub min_deg: f64,
    pub max_deg: f64,
}

impl AzimuthLimits {
    /// # Errors
    ///
    /// Returns error if the bounds are non-finite or `min_deg > max_deg`.
    pub fn new(min_deg: f64, max_deg: f64) -> ControlResult<Self> {
        if !min_deg.is_finite() || !max_deg.is_finite() || min_deg > max_deg {
            return Err(ControlError::InvalidArg {
                what: "azimuth limits must be finite with min <= max",
            });
        }
        Ok(Self { min_deg, max_deg })
    }

    pub fn clamp(&self, az_deg: f64) -> f64 {
        if az_deg < self.min_deg {
            tracing::info!(az_deg, min = self.min_deg, "limiting dome track to minimum azimuth");
            self.min_deg
        } else if az_deg > self.max_deg {
            tracing::info!(az_deg, max = self.max_deg, "limiting dome track to maximum azimuth");
            self.max_deg
        } else {
            az_deg
        }
    }
}
