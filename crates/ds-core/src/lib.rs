//! ds-core: shared foundation for domesync.
//!
//! Contains:
//! - units (uom angle/time types + constructors)
//! - numeric (finite/positive/range checks)
//! - angle (wrapping helpers for hours and degrees)
//! - error (shared error types)

pub mod angle;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use angle::*;
pub use error::{DsError, DsResult};
pub use numeric::*;
pub use units::*;
