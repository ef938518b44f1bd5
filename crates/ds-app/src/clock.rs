//! Sidereal clocks backed by the wall clock.

use chrono::{DateTime, Utc};
use ds_control::{DeviceResult, SiderealClock};
use ds_model::lst_rad;

/// Local mean sidereal time from the system clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSiderealClock {
    /// Site longitude, degrees, + east.
    pub longitude_east_deg: f64,
}

impl SystemSiderealClock {
    pub fn new(longitude_east_deg: f64) -> Self {
        Self { longitude_east_deg }
    }

    pub fn lst_at(&self, t: DateTime<Utc>) -> f64 {
        lst_rad(t, self.longitude_east_deg)
    }
}

impl SiderealClock for SystemSiderealClock {
    fn lst_rad(&self) -> DeviceResult<f64> {
        Ok(self.lst_at(Utc::now()))
    }
}

/// Clock frozen at one sidereal time, for what-if solves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSiderealClock(pub f64);

impl SiderealClock for FixedSiderealClock {
    fn lst_rad(&self) -> DeviceResult<f64> {
        Ok(self.0)
    }
}
