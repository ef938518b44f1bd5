//! Dome azimuth model for off-axis telescope mounts.
//!
//! A telescope whose optical axis does not pass through the dome's rotation
//! center needs the shutter at a different azimuth than the telescope's own.
//! This crate solves for that azimuth from the mount geometry and the current
//! pointing.
//!
//! # Frames
//!
//! The dome frame has `z` up and `y` toward the elevated celestial pole (north
//! for `+lat`, south for `-lat`); `x` completes a right-handed system, so it
//! points east in the north and west in the south. The solver works in this
//! frame and converts back to a compass bearing at the end.
//!
//! The horizon transform and sidereal clock here are the small closed-form
//! versions needed to run the model standalone; callers with a proper
//! ephemeris plug in their own [`CoordinateTransform`].

pub mod azimuth;
pub mod error;
pub mod geometry;
pub mod pointing;
pub mod sidereal;
pub mod transform;

pub use azimuth::{AzimuthModel, DEFAULT_ITERATIONS, DomeAzimuth, SouthernFlip};
pub use error::{ModelError, ModelResult};
pub use geometry::{Hemisphere, MountGeometry, MountType};
pub use pointing::{HorizontalPosition, TelescopePointing};
pub use sidereal::{gmst_hours, julian_date, lmst_hours, lst_rad};
pub use transform::{CoordinateTransform, SphericalTransform};
