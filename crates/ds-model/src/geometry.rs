//! Fixed mount and dome geometry.

use crate::error::{ModelError, ModelResult};
use ds_core::{ensure_finite, ensure_in_range, ensure_positive};

/// Mount family. Only the German equatorial moves its optical axis with hour
/// angle; the others sit at a fixed offset from the dome center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountType {
    AltAz,
    Fork,
    #[default]
    GermanEquatorial,
}

/// Which celestial pole is above the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// The equator itself counts as north.
    pub fn from_latitude(latitude_deg: f64) -> Self {
        if latitude_deg >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    pub fn is_south(self) -> bool {
        self == Hemisphere::South
    }
}

/// Mount placement inside the dome.
///
/// Lengths may use any unit as long as all four agree. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountGeometry {
    site_latitude_deg: f64,
    dome_radius: f64,
    dec_axis_height: f64,
    dec_axis_length: f64,
    dec_axis_offset: f64,
    mount_type: MountType,
}

impl MountGeometry {
    /// Create a German equatorial geometry.
    ///
    /// # Arguments
    ///
    /// * `site_latitude_deg` - Signed latitude, + north, in `[-90, 90]`
    /// * `dome_radius` - Dome radius, must be positive
    /// * `dec_axis_height` - Height of the polar/dec axis intersection above the dome equator
    /// * `dec_axis_length` - Distance from the polar axis to the optical axis
    /// * `dec_axis_offset` - Offset of the polar axis from the dome center toward the pole
    ///
    /// # Errors
    ///
    /// Returns error if any value is non-finite, the latitude is out of range
    /// or the dome radius is not positive.
    pub fn new(
        site_latitude_deg: f64,
        dome_radius: f64,
        dec_axis_height: f64,
        dec_axis_length: f64,
        dec_axis_offset: f64,
    ) -> ModelResult<Self> {
        ensure_in_range(site_latitude_deg, -90.0, 90.0, "site_latitude")?;
        ensure_positive(dome_radius, "dome_radius")?;
        ensure_finite(dec_axis_height, "dec_axis_height")?;
        ensure_finite(dec_axis_length, "dec_axis_length")?;
        ensure_finite(dec_axis_offset, "dec_axis_offset")?;
        if dec_axis_length < 0.0 {
            return Err(ModelError::InvalidGeometry {
                what: format!("dec_axis_length must be non-negative, got {dec_axis_length}"),
            });
        }
        Ok(Self {
            site_latitude_deg,
            dome_radius,
            dec_axis_height,
            dec_axis_length,
            dec_axis_offset,
            mount_type: MountType::default(),
        })
    }

    /// Use a different mount family.
    pub fn with_mount_type(mut self, mount_type: MountType) -> Self {
        self.mount_type = mount_type;
        self
    }

    pub fn site_latitude_deg(&self) -> f64 {
        self.site_latitude_deg
    }

    pub fn dome_radius(&self) -> f64 {
        self.dome_radius
    }

    pub fn dec_axis_height(&self) -> f64 {
        self.dec_axis_height
    }

    pub fn dec_axis_length(&self) -> f64 {
        self.dec_axis_length
    }

    pub fn dec_axis_offset(&self) -> f64 {
        self.dec_axis_offset
    }

    pub fn mount_type(&self) -> MountType {
        self.mount_type
    }

    pub fn hemisphere(&self) -> Hemisphere {
        Hemisphere::from_latitude(self.site_latitude_deg)
    }

    /// Elevation of the polar axis in radians; the same in both hemispheres.
    pub fn polar_axis_elevation(&self) -> f64 {
        self.site_latitude_deg.abs().to_radians()
    }

    /// Largest distance of the optical axis reference point from the dome
    /// center, as a fraction of the dome radius.
    pub fn offset_ratio(&self) -> f64 {
        (self.dec_axis_length + self.dec_axis_offset.abs() + self.dec_axis_height.abs())
            / self.dome_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_geometry() {
        let g = MountGeometry::new(38.3334, 147.0, 0.0, 49.2, 0.0).unwrap();
        assert_eq!(g.hemisphere(), Hemisphere::North);
        assert_eq!(g.mount_type(), MountType::GermanEquatorial);
        assert!((g.offset_ratio() - 49.2 / 147.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_radius() {
        assert!(MountGeometry::new(38.0, 0.0, 0.0, 0.6, 0.2).is_err());
        assert!(MountGeometry::new(38.0, -1.75, 0.0, 0.6, 0.2).is_err());
        assert!(MountGeometry::new(38.0, f64::NAN, 0.0, 0.6, 0.2).is_err());
    }

    #[test]
    fn rejects_bad_latitude() {
        assert!(MountGeometry::new(91.0, 1.75, 0.0, 0.6, 0.2).is_err());
        assert!(MountGeometry::new(-90.5, 1.75, 0.0, 0.6, 0.2).is_err());
    }

    #[test]
    fn rejects_negative_dec_length() {
        let err = MountGeometry::new(10.0, 1.75, 0.0, -0.6, 0.2).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeometry { .. }));
    }

    #[test]
    fn equator_is_north() {
        assert_eq!(Hemisphere::from_latitude(0.0), Hemisphere::North);
        assert!(Hemisphere::from_latitude(-27.8).is_south());
    }

    #[test]
    fn polar_axis_elevation_is_symmetric() {
        let n = MountGeometry::new(27.8, 1.75, 0.0, 0.6, 0.24).unwrap();
        let s = MountGeometry::new(-27.8, 1.75, 0.0, 0.6, 0.24).unwrap();
        assert_eq!(n.polar_axis_elevation(), s.polar_axis_elevation());
    }
}
