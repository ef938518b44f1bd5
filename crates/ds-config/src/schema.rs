//! Configuration schema definitions.
//!
//! Every field has a default so a minimal file only names what differs from
//! the reference installation (147 inch dome, German equatorial mount).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location string that resolves to the legacy plain-text status files.
pub const STATUS_FILE_LOCATION: &str = "status-file";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomeSyncConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of this sync instance, reported in metadata.
    #[serde(default = "default_device")]
    pub device: String,
    /// Dome location. Unset means a simulated dome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dome: Option<String>,
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_telescope")]
    pub telescope: String,
    /// Azimuth sensor resolution, degrees. Unset means ask the dome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az_resolution_deg: Option<f64>,
    #[serde(default)]
    pub site_location: SiteDef,
    #[serde(default)]
    pub geometry: GeometryDef,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub tracking: TrackingDef,
    #[serde(default)]
    pub actuator: ActuatorDef,
    #[serde(default)]
    pub status_files: StatusFilesDef,
    #[serde(default)]
    pub simulation: SimulationDef,
}

impl Default for DomeSyncConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            device: default_device(),
            dome: None,
            site: default_site(),
            telescope: default_telescope(),
            az_resolution_deg: None,
            site_location: SiteDef::default(),
            geometry: GeometryDef::default(),
            solver: SolverDef::default(),
            tracking: TrackingDef::default(),
            actuator: ActuatorDef::default(),
            status_files: StatusFilesDef::default(),
            simulation: SimulationDef::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteDef {
    /// Signed latitude, degrees, + north.
    #[serde(default = "default_latitude")]
    pub latitude_deg: f64,
    /// Signed longitude, degrees, + east.
    #[serde(default = "default_longitude")]
    pub longitude_deg: f64,
}

impl Default for SiteDef {
    fn default() -> Self {
        Self {
            latitude_deg: default_latitude(),
            longitude_deg: default_longitude(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MountTypeDef {
    AltAz,
    Fork,
    #[default]
    GermanEquatorial,
}

/// Mount and dome dimensions. Lengths share one unit; only ratios matter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometryDef {
    #[serde(default)]
    pub mount_type: MountTypeDef,
    #[serde(default = "default_dome_radius")]
    pub dome_radius: f64,
    #[serde(default)]
    pub dec_axis_height: f64,
    #[serde(default = "default_dec_axis_length")]
    pub dec_axis_length: f64,
    #[serde(default)]
    pub dec_axis_offset: f64,
}

impl Default for GeometryDef {
    fn default() -> Self {
        Self {
            mount_type: MountTypeDef::default(),
            dome_radius: default_dome_radius(),
            dec_axis_height: 0.0,
            dec_axis_length: default_dec_axis_length(),
            dec_axis_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SouthernFlipDef {
    #[default]
    Radians,
    Degrees,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub southern_flip: SouthernFlipDef,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            southern_flip: SouthernFlipDef::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviationPolicyDef {
    #[default]
    Signed,
    ShortestPath,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsDef {
    pub min_deg: f64,
    pub max_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingDef {
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: f64,
    #[serde(default = "default_tolerance_deg")]
    pub tolerance_deg: f64,
    #[serde(default = "default_rotation_rate")]
    pub rotation_rate_deg_per_s: f64,
    #[serde(default)]
    pub deviation: DeviationPolicyDef,
    /// Soft azimuth limits; absent means disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsDef>,
    #[serde(default = "default_cancel_slice_ms")]
    pub cancel_slice_ms: u64,
}

impl Default for TrackingDef {
    fn default() -> Self {
        Self {
            poll_interval_s: default_poll_interval_s(),
            tolerance_deg: default_tolerance_deg(),
            rotation_rate_deg_per_s: default_rotation_rate(),
            deviation: DeviationPolicyDef::default(),
            limits: None,
            cancel_slice_ms: default_cancel_slice_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActuatorDef {
    /// The dome positions itself.
    #[default]
    ClosedLoop,
    /// Timed drives through a two-outlet power switch.
    Relay {
        /// Relay location. Unset means a simulated switch.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        switch: Option<String>,
        #[serde(default = "default_increase_channel")]
        increase_channel: u8,
        #[serde(default = "default_decrease_channel")]
        decrease_channel: u8,
        /// Check the energized outlet each slice during a drive.
        #[serde(default = "default_true")]
        monitor: bool,
    },
}

/// Plain-text status files written by the observatory's other processes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusFilesDef {
    /// Holds "ra dec" (hours, degrees).
    #[serde(default = "default_telcoords_path")]
    pub telcoords: PathBuf,
    /// Holds the dome azimuth in degrees.
    #[serde(default = "default_dome_azimuth_path")]
    pub dome_azimuth: PathBuf,
}

impl Default for StatusFilesDef {
    fn default() -> Self {
        Self {
            telcoords: default_telcoords_path(),
            dome_azimuth: default_dome_azimuth_path(),
        }
    }
}

/// Starting state for simulated devices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    #[serde(default)]
    pub ra_hours: f64,
    #[serde(default = "default_sim_dec")]
    pub dec_deg: f64,
    #[serde(default)]
    pub dome_az_deg: f64,
    /// Azimuth step reported by the simulated dome; unset reports none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dome_resolution_deg: Option<f64>,
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self {
            ra_hours: 0.0,
            dec_deg: default_sim_dec(),
            dome_az_deg: 0.0,
            dome_resolution_deg: None,
        }
    }
}

fn default_version() -> u32 {
    crate::migrate::LATEST_VERSION
}

fn default_device() -> String {
    "Virtual".to_string()
}

fn default_site() -> String {
    "/Site/0".to_string()
}

fn default_telescope() -> String {
    "/Telescope/0".to_string()
}

fn default_latitude() -> f64 {
    38.3334
}

fn default_longitude() -> f64 {
    -85.5289
}

fn default_dome_radius() -> f64 {
    147.0
}

fn default_dec_axis_length() -> f64 {
    49.2
}

fn default_iterations() -> usize {
    10
}

fn default_poll_interval_s() -> f64 {
    1.0
}

fn default_tolerance_deg() -> f64 {
    5.0
}

fn default_rotation_rate() -> f64 {
    2.5
}

fn default_cancel_slice_ms() -> u64 {
    50
}

fn default_increase_channel() -> u8 {
    2
}

fn default_decrease_channel() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_telcoords_path() -> PathBuf {
    PathBuf::from("/usr/local/observatory/status/telcoords")
}

fn default_dome_azimuth_path() -> PathBuf {
    PathBuf::from("/usr/local/observatory/status/domeazimuth")
}

fn default_sim_dec() -> f64 {
    30.0
}
