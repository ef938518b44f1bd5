//! Equatorial to horizontal conversion.

use crate::pointing::{HorizontalPosition, TelescopePointing};
use ds_core::{hours_to_rad, map12, map24, map360, rad_to_hours};

/// Converts a pointing into altitude, azimuth and hour angle for a site.
pub trait CoordinateTransform {
    /// # Arguments
    ///
    /// * `ra_hours` - Right ascension in hours
    /// * `dec_deg` - Declination in degrees
    /// * `latitude_deg` - Signed site latitude, + north
    /// * `lst_rad` - Local sidereal time in radians
    fn to_horizontal(
        &self,
        ra_hours: f64,
        dec_deg: f64,
        latitude_deg: f64,
        lst_rad: f64,
    ) -> HorizontalPosition;

    /// Resolve any pointing; horizontal pointings pass through.
    fn resolve(
        &self,
        pointing: &TelescopePointing,
        latitude_deg: f64,
        lst_rad: f64,
    ) -> HorizontalPosition {
        match *pointing {
            TelescopePointing::Equatorial { ra_hours, dec_deg } => {
                self.to_horizontal(ra_hours, dec_deg, latitude_deg, lst_rad)
            }
            TelescopePointing::Horizontal(pos) => pos,
        }
    }
}

/// Plain spherical-trig transform: no refraction, precession or nutation.
///
/// Accurate enough for aiming a slit several degrees wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalTransform;

impl SphericalTransform {
    /// Hour angle in `[-12, 12)` hours.
    pub fn hour_angle(ra_hours: f64, lst_rad: f64) -> f64 {
        map12(map24(rad_to_hours(lst_rad) - ra_hours))
    }

    /// Inverse of the horizon transform: full horizontal position, with the
    /// hour angle recovered from altitude and azimuth, plus the declination.
    pub fn from_alt_az(
        alt_deg: f64,
        az_deg: f64,
        latitude_deg: f64,
    ) -> (HorizontalPosition, f64) {
        let alt = alt_deg.to_radians();
        let az = az_deg.to_radians();
        let phi = latitude_deg.to_radians();

        let sin_dec = alt.sin() * phi.sin() + alt.cos() * phi.cos() * az.cos();
        let dec = sin_dec.clamp(-1.0, 1.0).asin();
        let ha = (-az.sin() * alt.cos())
            .atan2(alt.sin() * phi.cos() - alt.cos() * phi.sin() * az.cos());

        (
            HorizontalPosition {
                alt_deg,
                az_deg: map360(az_deg),
                ha_hours: map12(rad_to_hours(ha)),
            },
            dec.to_degrees(),
        )
    }
}

impl CoordinateTransform for SphericalTransform {
    fn to_horizontal(
        &self,
        ra_hours: f64,
        dec_deg: f64,
        latitude_deg: f64,
        lst_rad: f64,
    ) -> HorizontalPosition {
        let ha_hours = Self::hour_angle(ra_hours, lst_rad);
        let ha = hours_to_rad(ha_hours);
        let phi = latitude_deg.to_radians();
        let dec = dec_deg.to_radians();

        let sin_alt = phi.sin() * dec.sin() + phi.cos() * dec.cos() * ha.cos();
        let alt = sin_alt.clamp(-1.0, 1.0).asin();
        let az = (-dec.cos() * ha.sin())
            .atan2(dec.sin() * phi.cos() - phi.sin() * dec.cos() * ha.cos());

        HorizontalPosition {
            alt_deg: alt.to_degrees(),
            az_deg: map360(az.to_degrees()),
            ha_hours,
        }
    }
}
