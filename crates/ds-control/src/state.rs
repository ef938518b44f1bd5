//! Long-lived tracking state.

use crate::actuator::Direction;
use ds_core::{AngularVelocity, as_deg_per_s};
use std::time::Duration;

/// Open-loop actuation phase.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrivePhase {
    #[default]
    Idle,
    Driving {
        direction: Direction,
        remaining: Duration,
    },
}

impl DrivePhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, DrivePhase::Idle)
    }
}

/// Everything the controller carries from one tick to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    /// Last measured dome azimuth, degrees.
    pub current_az: Option<f64>,
    /// Last computed target azimuth, degrees.
    pub target_az: Option<f64>,
    /// Last signed deviation, degrees.
    pub deviation: Option<f64>,
    /// Deadband half-width, degrees.
    pub tolerance_deg: f64,
    /// Assumed dome rotation rate for timed drives.
    pub rotation_rate: AngularVelocity,
    pub phase: DrivePhase,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub actuations: u64,
}

impl TrackingState {
    pub fn new(tolerance_deg: f64, rotation_rate: AngularVelocity) -> Self {
        Self {
            current_az: None,
            target_az: None,
            deviation: None,
            tolerance_deg,
            rotation_rate,
            phase: DrivePhase::Idle,
            ticks: 0,
            skipped_ticks: 0,
            actuations: 0,
        }
    }

    pub fn rotation_rate_deg_per_s(&self) -> f64 {
        as_deg_per_s(self.rotation_rate)
    }

    /// Whether a deviation falls inside the deadband.
    pub fn within_tolerance(&self, deviation_deg: f64) -> bool {
        deviation_deg.abs() <= self.tolerance_deg
    }
}
