//! Dome azimuth solver.
//!
//! The optical axis leaves a reference point fixed to the mount and travels
//! along the telescope pointing direction until it hits the dome sphere. The
//! shutter must face the azimuth of that hit point, seen from the dome center.
//!
//! The hit distance is refined with a fixed number of passes: each pass moves
//! the candidate along the axis by the amount its radius misses the dome.
//! When the mount offset is small against the dome radius this contracts very
//! quickly, so no residual test is made.

use crate::geometry::{Hemisphere, MountGeometry, MountType};
use crate::pointing::{HorizontalPosition, TelescopePointing};
use crate::transform::{CoordinateTransform, SphericalTransform};
use core::f64::consts::{PI, TAU};
use ds_core::{hours_to_rad, map12, map360, map_tau};
use nalgebra::Vector3;

/// Refinement passes used when the caller has no preference.
pub const DEFAULT_ITERATIONS: usize = 10;

/// How the southern hemisphere result is turned back into a compass bearing.
///
/// Both add half a turn; they differ only in whether the shift happens
/// before or after the radian-to-degree conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SouthernFlip {
    /// Add pi to the raw angle, then convert.
    #[default]
    Radians,
    /// Convert, then add 180 degrees.
    Degrees,
}

impl SouthernFlip {
    fn bearing_deg(self, zeta: f64, hemisphere: Hemisphere) -> f64 {
        match (hemisphere, self) {
            (Hemisphere::North, _) => map360(zeta.to_degrees()),
            (Hemisphere::South, SouthernFlip::Radians) => map360(map_tau(zeta + PI).to_degrees()),
            (Hemisphere::South, SouthernFlip::Degrees) => map360(zeta.to_degrees() + 180.0),
        }
    }
}

/// Solved shutter azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomeAzimuth {
    /// Compass azimuth in `[0, 360)`.
    pub degrees: f64,
    /// Set when the solver gave up and returned the telescope azimuth.
    pub fallback: bool,
}

/// Stateless dome azimuth solver for one mount.
#[derive(Debug, Clone)]
pub struct AzimuthModel<T = SphericalTransform> {
    geometry: MountGeometry,
    transform: T,
    southern_flip: SouthernFlip,
}

impl AzimuthModel<SphericalTransform> {
    pub fn new(geometry: MountGeometry) -> Self {
        Self::with_transform(geometry, SphericalTransform)
    }
}

impl<T: CoordinateTransform> AzimuthModel<T> {
    pub fn with_transform(geometry: MountGeometry, transform: T) -> Self {
        Self {
            geometry,
            transform,
            southern_flip: SouthernFlip::default(),
        }
    }

    pub fn with_southern_flip(mut self, flip: SouthernFlip) -> Self {
        self.southern_flip = flip;
        self
    }

    pub fn geometry(&self) -> &MountGeometry {
        &self.geometry
    }

    /// Dome azimuth in degrees for the given pointing.
    ///
    /// # Arguments
    ///
    /// * `pointing` - Current telescope pointing
    /// * `lst_rad` - Local sidereal time in radians (ignored for horizontal pointings)
    /// * `iterations` - Refinement passes; zero is treated as one
    pub fn solve(&self, pointing: &TelescopePointing, lst_rad: f64, iterations: usize) -> f64 {
        self.solve_detailed(pointing, lst_rad, iterations).degrees
    }

    /// Like [`solve`](Self::solve) but also reports whether the fallback fired.
    pub fn solve_detailed(
        &self,
        pointing: &TelescopePointing,
        lst_rad: f64,
        iterations: usize,
    ) -> DomeAzimuth {
        let pos = self
            .transform
            .resolve(pointing, self.geometry.site_latitude_deg(), lst_rad);
        self.solve_horizontal(&pos, iterations)
    }

    /// Solve from an already resolved altitude/azimuth/hour angle.
    pub fn solve_horizontal(&self, pos: &HorizontalPosition, iterations: usize) -> DomeAzimuth {
        let hemisphere = self.geometry.hemisphere();
        let origin = self.reference_point(pos.ha_hours);

        // Telescope azimuth measured from the elevated pole.
        let tel_az = match hemisphere {
            Hemisphere::North => pos.az_deg.to_radians(),
            Hemisphere::South => map_tau(pos.az_deg.to_radians() - PI),
        };
        let tel_alt = pos.alt_deg.to_radians();
        let direction = Vector3::new(
            tel_alt.cos() * tel_az.sin(),
            tel_alt.cos() * tel_az.cos(),
            tel_alt.sin(),
        );

        let hit = self.intersect_dome(&origin, &direction, iterations);

        let zeta = hit.x.atan2(hit.y);
        if !zeta.is_finite() || zeta <= -TAU || zeta >= TAU {
            tracing::warn!(
                zeta,
                telescope_az = pos.az_deg,
                "dome azimuth outside expected domain, using telescope azimuth"
            );
            return DomeAzimuth {
                degrees: map360(pos.az_deg),
                fallback: true,
            };
        }

        DomeAzimuth {
            degrees: self.southern_flip.bearing_deg(zeta, hemisphere),
            fallback: false,
        }
    }

    /// Point on the optical axis fixed to the mount, in dome coordinates.
    pub fn reference_point(&self, ha_hours: f64) -> Vector3<f64> {
        let g = &self.geometry;
        match g.mount_type() {
            MountType::AltAz | MountType::Fork => {
                Vector3::new(0.0, g.dec_axis_offset(), g.dec_axis_height())
            }
            MountType::GermanEquatorial => {
                let phi = dec_axis_rotation(ha_hours, g.hemisphere());
                let theta = g.polar_axis_elevation();
                let l = g.dec_axis_length();
                Vector3::new(
                    l * phi.sin(),
                    -l * phi.cos() * theta.sin() + g.dec_axis_offset(),
                    l * phi.cos() * theta.cos() + g.dec_axis_height(),
                )
            }
        }
    }

    fn intersect_dome(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        iterations: usize,
    ) -> Vector3<f64> {
        let radius = self.geometry.dome_radius();
        let mut d = 0.0;
        let mut r = radius;
        let mut point = origin + direction * radius;
        for _ in 0..iterations.max(1) {
            d -= r - radius;
            point = origin + direction * (radius + d);
            r = point.norm();
        }
        point
    }
}

/// Rotation of the dec axis about the polar axis, radians.
///
/// Zero with the tube over the mount and the counterweight down, +90 degrees
/// with the axis horizontal and the tube toward `+x`. Which side of the pier
/// the tube sits on flips with the sign of the hour angle.
pub fn dec_axis_rotation(ha_hours: f64, hemisphere: Hemisphere) -> f64 {
    let ha = map12(ha_hours);
    let west = ha > 0.0;
    let hours = match (hemisphere, west) {
        (Hemisphere::North, true) => 6.0 - ha,
        (Hemisphere::North, false) => -(6.0 + ha),
        (Hemisphere::South, true) => -(6.0 - ha),
        (Hemisphere::South, false) => 6.0 + ha,
    };
    hours_to_rad(hours)
}
