//! Wrapping helpers for hour angles and compass bearings.
//!
//! All helpers are total on finite input and return half-open ranges.
//! `rem_euclid` can round up to the modulus for tiny negative inputs, so the
//! upper bound is folded back explicitly.

use core::f64::consts::TAU;

fn wrap(value: f64, modulus: f64) -> f64 {
    let w = value.rem_euclid(modulus);
    if w >= modulus { 0.0 } else { w }
}

/// Map a time in hours to `[0, 24)`.
pub fn map24(hours: f64) -> f64 {
    wrap(hours, 24.0)
}

/// Map an hour angle to `[-12, 12)`.
pub fn map12(hours: f64) -> f64 {
    let h = map24(hours);
    if h >= 12.0 { h - 24.0 } else { h }
}

/// Map an angle in degrees to `[0, 360)`.
pub fn map360(deg: f64) -> f64 {
    wrap(deg, 360.0)
}

/// Map an angle in degrees to `[-180, 180)`.
pub fn map180(deg: f64) -> f64 {
    let a = map360(deg);
    if a >= 180.0 { a - 360.0 } else { a }
}

/// Map an angle in radians to `[0, 2pi)`.
pub fn map_tau(rad: f64) -> f64 {
    wrap(rad, TAU)
}

#[inline]
pub fn hours_to_rad(hours: f64) -> f64 {
    hours * core::f64::consts::PI / 12.0
}

#[inline]
pub fn rad_to_hours(rad: f64) -> f64 {
    rad * 12.0 / core::f64::consts::PI
}
