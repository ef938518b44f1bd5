//! Position source backed by plain-text status files.
//!
//! Other observatory processes keep two files current:
//! - `telcoords`: right ascension in hours and declination in degrees,
//!   separated by whitespace
//! - `domeazimuth`: the dome azimuth in degrees
//!
//! Both are re-read on every call. A missing file is a transient failure; so
//! is a file caught mid-write.

use ds_control::{AzimuthSensor, DeviceError, DeviceResult, TelescopeSource};
use ds_model::TelescopePointing;
use std::path::{Path, PathBuf};

/// Only the head of each file is parsed.
const MAX_READ: usize = 256;

fn read_head(device: &str, path: &Path) -> DeviceResult<String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DeviceError::unreachable(device, format!("{}: {e}", path.display())))?;
    let mut end = content.len().min(MAX_READ);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    Ok(content[..end].to_string())
}

fn parse_number(device: &str, field: &str, text: Option<&str>) -> DeviceResult<f64> {
    let text = text.ok_or_else(|| DeviceError::invalid_data(device, format!("missing {field}")))?;
    let value: f64 = text
        .parse()
        .map_err(|_| DeviceError::invalid_data(device, format!("bad {field}: {text:?}")))?;
    if !value.is_finite() {
        return Err(DeviceError::invalid_data(device, format!("non-finite {field}")));
    }
    Ok(value)
}

/// Parse `"ra dec"` into a pointing.
pub fn parse_telcoords(content: &str) -> DeviceResult<TelescopePointing> {
    let mut fields = content.split_whitespace();
    let ra_hours = parse_number("telcoords", "ra", fields.next())?;
    let dec_deg = parse_number("telcoords", "dec", fields.next())?;
    if !(-90.0..=90.0).contains(&dec_deg) {
        return Err(DeviceError::invalid_data(
            "telcoords",
            format!("dec {dec_deg} outside [-90, 90]"),
        ));
    }
    Ok(TelescopePointing::equatorial(ra_hours, dec_deg))
}

/// Parse a single azimuth in degrees.
pub fn parse_azimuth(content: &str) -> DeviceResult<f64> {
    parse_number("domeazimuth", "azimuth", content.split_whitespace().next())
}

/// Telescope pointing from the `telcoords` file.
#[derive(Debug, Clone)]
pub struct StatusFileTelescope {
    path: PathBuf,
}

impl StatusFileTelescope {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TelescopeSource for StatusFileTelescope {
    fn pointing(&mut self) -> DeviceResult<TelescopePointing> {
        parse_telcoords(&read_head("telcoords", &self.path)?)
    }
}

/// Dome azimuth from the `domeazimuth` file.
#[derive(Debug, Clone)]
pub struct StatusFileAzimuth {
    path: PathBuf,
    resolution: Option<f64>,
}

impl StatusFileAzimuth {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolution: None,
        }
    }

    pub fn with_resolution(mut self, resolution_deg: f64) -> Self {
        self.resolution = Some(resolution_deg);
        self
    }
}

impl AzimuthSensor for StatusFileAzimuth {
    fn az(&mut self) -> DeviceResult<f64> {
        parse_azimuth(&read_head("domeazimuth", &self.path)?)
    }

    fn az_resolution(&self) -> Option<f64> {
        self.resolution
    }
}
