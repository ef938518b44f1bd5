//! Dome tracking control loop.
//!
//! Each tick reads the telescope pointing and the dome azimuth, asks the
//! azimuth model where the shutter should be, and moves the dome when the
//! miss exceeds a deadband.
//!
//! # Actuation
//!
//! - **Closed loop**: the dome positions itself; the controller only sends
//!   `slew_to_az` and respects `is_slewing`.
//! - **Relay**: two power channels turn the dome motor on in either
//!   direction. There is no position feedback during the move, so the drive
//!   time is computed from a calibrated rotation rate. The wait can be
//!   cancelled and the energized channel is released on every exit path.
//!
//! Device failures during one tick skip that tick only. Relay faults are
//! hard errors and stop the loop.

pub mod actuator;
pub mod cancel;
pub mod controller;
pub mod deviation;
pub mod devices;
pub mod error;
pub mod poll;
pub mod state;

pub use actuator::{Actuation, Direction, DriveReport, RelayChannels, RelayDriver};
pub use cancel::CancelToken;
pub use controller::{RunSummary, TickOutcome, TrackingController, TrackingSettings};
pub use deviation::{AzimuthLimits, DeviationPolicy};
pub use devices::{
    AzimuthSensor, DeviceError, DeviceResult, DomeDevice, RelaySwitch, SiderealClock,
    TelescopeSource,
};
pub use error::{ControlError, ControlResult};
pub use poll::{MAX_POLL_PERIOD, PollClock, PollConfig};
pub use state::{DrivePhase, TrackingState};
