//! Application service layer for domesync.
//!
//! Turns a validated configuration into running collaborators and exposes the
//! operations the command line needs: one-shot solves, model sweeps, the
//! tracking loop, and the dome pass-through facade.

pub mod clock;
pub mod dome_sync;
pub mod error;
pub mod runtime;
pub mod sim;
pub mod solve_service;
pub mod status_files;

// Re-export key types for convenience
pub use clock::{FixedSiderealClock, SystemSiderealClock};
pub use dome_sync::DomeSync;
pub use error::{AppError, AppResult};
pub use runtime::{
    Resolved, build_actuation, build_controller, build_dome, build_geometry, build_model,
    build_settings, build_telescope, poll_config, resolve_location,
};
pub use sim::{DomeMotion, SimulatedDome, SimulatedRelay, SimulatedTelescope, shared_motion};
pub use solve_service::{
    MAX_SWEEP_ROWS, SolveRequest, SolveResponse, SweepOptions, SweepRow, solve, sweep,
};
pub use status_files::{StatusFileAzimuth, StatusFileTelescope, parse_azimuth, parse_telcoords};

use std::path::Path;

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> AppResult<ds_config::DomeSyncConfig> {
    if !path.exists() {
        return Err(AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(ds_config::load(path)?)
}
