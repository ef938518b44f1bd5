//! Collaborator interfaces consumed by the controller.
//!
//! Implementations are resolved once at startup and handed to the controller
//! as trait objects. All calls may fail; the controller treats a failure as a
//! skipped tick unless it happens while a relay is energized.

use ds_model::TelescopePointing;
use thiserror::Error;

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error("{device} unreachable: {message}")]
    Unreachable { device: String, message: String },

    #[error("{device} returned invalid data: {message}")]
    InvalidData { device: String, message: String },

    #[error("{device} does not support {operation}")]
    Unsupported {
        device: String,
        operation: &'static str,
    },
}

impl DeviceError {
    pub fn unreachable(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            device: device.into(),
            message: message.into(),
        }
    }

    pub fn invalid_data(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            device: device.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(device: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            device: device.into(),
            operation,
        }
    }
}

/// Local sidereal time source for the site.
pub trait SiderealClock {
    /// Current local sidereal time in radians.
    fn lst_rad(&self) -> DeviceResult<f64>;
}

/// Mount reporting where the telescope points.
pub trait TelescopeSource {
    fn pointing(&mut self) -> DeviceResult<TelescopePointing>;
}

/// Anything that can report the current shutter azimuth in degrees.
pub trait AzimuthSensor {
    fn az(&mut self) -> DeviceResult<f64>;

    /// Smallest azimuth step the sensor can resolve, if known.
    fn az_resolution(&self) -> Option<f64> {
        None
    }
}

/// Dome that positions itself.
///
/// Shutter and flap controls are forwarded untouched by the sync layer.
pub trait DomeDevice: AzimuthSensor {
    fn slew_to_az(&mut self, az_deg: f64) -> DeviceResult<()>;
    fn is_slewing(&mut self) -> DeviceResult<bool>;
    fn abort_slew(&mut self) -> DeviceResult<()>;

    fn open_slit(&mut self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("dome", "open_slit"))
    }
    fn close_slit(&mut self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("dome", "close_slit"))
    }
    fn is_slit_open(&mut self) -> DeviceResult<bool> {
        Err(DeviceError::unsupported("dome", "is_slit_open"))
    }
    fn open_flap(&mut self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("dome", "open_flap"))
    }
    fn close_flap(&mut self) -> DeviceResult<()> {
        Err(DeviceError::unsupported("dome", "close_flap"))
    }
    fn is_flap_open(&mut self) -> DeviceResult<bool> {
        Err(DeviceError::unsupported("dome", "is_flap_open"))
    }

    /// Key/value pairs describing the device, for image headers and logs.
    fn metadata(&mut self) -> DeviceResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// Networked power switch driving the dome motor.
pub trait RelaySwitch {
    /// Check that the switch answers and is in a usable state.
    ///
    /// `Err` means it could not be reached; `Ok(false)` means it answered but
    /// failed the check.
    fn verify(&mut self) -> DeviceResult<bool>;
    fn on(&mut self, channel: u8) -> DeviceResult<()>;
    fn off(&mut self, channel: u8) -> DeviceResult<()>;
    /// Whether the channel is energized.
    fn status(&mut self, channel: u8) -> DeviceResult<bool>;
}

impl<T: SiderealClock + ?Sized> SiderealClock for Box<T> {
    fn lst_rad(&self) -> DeviceResult<f64> {
        (**self).lst_rad()
    }
}

impl<T: TelescopeSource + ?Sized> TelescopeSource for Box<T> {
    fn pointing(&mut self) -> DeviceResult<TelescopePointing> {
        (**self).pointing()
    }
}

impl<T: AzimuthSensor + ?Sized> AzimuthSensor for Box<T> {
    fn az(&mut self) -> DeviceResult<f64> {
        (**self).az()
    }

    fn az_resolution(&self) -> Option<f64> {
        (**self).az_resolution()
    }
}

impl<T: RelaySwitch + ?Sized> RelaySwitch for Box<T> {
    fn verify(&mut self) -> DeviceResult<bool> {
        (**self).verify()
    }

    fn on(&mut self, channel: u8) -> DeviceResult<()> {
        (**self).on(channel)
    }

    fn off(&mut self, channel: u8) -> DeviceResult<()> {
        (**self).off(channel)
    }

    fn status(&mut self, channel: u8) -> DeviceResult<bool> {
        (**self).status(channel)
    }
}
