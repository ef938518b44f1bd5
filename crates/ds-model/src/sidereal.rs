//! Mean sidereal time from the wall clock.
//!
//! Uses the IAU 1982 GMST polynomial evaluated at 0h UT, then advances by the
//! sidereal rate through the day. Good to well under a second over decades.

use chrono::{DateTime, Timelike, Utc};
use ds_core::{hours_to_rad, map24};

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;
const SIDEREAL_RATE: f64 = 1.002_737_909;

/// Julian date of an instant.
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

fn ut_hours(t: DateTime<Utc>) -> f64 {
    f64::from(t.hour())
        + f64::from(t.minute()) / 60.0
        + f64::from(t.second()) / 3600.0
        + f64::from(t.nanosecond()) / 3.6e12
}

/// Greenwich mean sidereal time in hours, `[0, 24)`.
pub fn gmst_hours(t: DateTime<Utc>) -> f64 {
    let ut = ut_hours(t);
    let jd0 = julian_date(t) - ut / 24.0;
    let tu = (jd0 - J2000_JD) / 36_525.0;
    let t0 = 24_110.548_41 / 3600.0 + (8_640_184.812_866 / 3600.0) * tu
        + (0.093_104 / 3600.0) * tu * tu
        - (6.2e-6 / 3600.0) * tu * tu * tu;
    map24(map24(t0) + ut * SIDEREAL_RATE)
}

/// Local mean sidereal time in hours for an east-positive longitude.
pub fn lmst_hours(t: DateTime<Utc>, longitude_east_deg: f64) -> f64 {
    map24(gmst_hours(t) + longitude_east_deg / 15.0)
}

/// Local mean sidereal time in radians, the form the azimuth model consumes.
pub fn lst_rad(t: DateTime<Utc>, longitude_east_deg: f64) -> f64 {
    hours_to_rad(lmst_hours(t, longitude_east_deg))
}
