//! Dome facade that aims the slit with the azimuth model.
//!
//! Looks like an ordinary dome to callers. Slews go to the model azimuth for
//! the telescope's current pointing instead of the requested angle; every
//! other call is forwarded to the real dome untouched.

use crate::clock::SystemSiderealClock;
use crate::error::AppResult;
use crate::runtime::{build_dome, build_model, build_telescope};
use ds_config::schema::DomeSyncConfig;
use ds_control::{
    AzimuthSensor, DeviceError, DeviceResult, DomeDevice, SiderealClock, TelescopeSource,
};
use ds_model::{
    AzimuthModel, CoordinateTransform, DomeAzimuth, SphericalTransform, TelescopePointing,
};

pub struct DomeSync<T = SphericalTransform> {
    name: String,
    model: AzimuthModel<T>,
    iterations: usize,
    clock: Box<dyn SiderealClock>,
    telescope: Box<dyn TelescopeSource>,
    dome: Box<dyn DomeDevice>,
    az_resolution: Option<f64>,
}

impl DomeSync {
    /// Resolve the dome, telescope and site named in `config`.
    pub fn from_config(config: &DomeSyncConfig) -> AppResult<Self> {
        Ok(Self::new(
            config.device.clone(),
            build_model(config)?,
            config.solver.iterations,
            Box::new(SystemSiderealClock::new(config.site_location.longitude_deg)),
            build_telescope(config)?,
            build_dome(config)?,
        )
        .with_az_resolution(config.az_resolution_deg))
    }
}

impl<T: CoordinateTransform> DomeSync<T> {
    pub fn new(
        name: impl Into<String>,
        model: AzimuthModel<T>,
        iterations: usize,
        clock: Box<dyn SiderealClock>,
        telescope: Box<dyn TelescopeSource>,
        dome: Box<dyn DomeDevice>,
    ) -> Self {
        Self {
            name: name.into(),
            model,
            iterations,
            clock,
            telescope,
            dome,
            az_resolution: None,
        }
    }

    /// Override the resolution the dome reports. `None` keeps the dome's.
    pub fn with_az_resolution(mut self, resolution_deg: Option<f64>) -> Self {
        self.az_resolution = resolution_deg;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model azimuth for the telescope's current pointing.
    pub fn dome_target(&mut self) -> DeviceResult<DomeAzimuth> {
        let pointing = self.telescope.pointing()?;
        let lst = match pointing {
            TelescopePointing::Equatorial { .. } => self.clock.lst_rad()?,
            TelescopePointing::Horizontal(_) => 0.0,
        };
        Ok(self.model.solve_detailed(&pointing, lst, self.iterations))
    }
}

impl<T: CoordinateTransform> AzimuthSensor for DomeSync<T> {
    fn az(&mut self) -> DeviceResult<f64> {
        self.dome.az()
    }

    fn az_resolution(&self) -> Option<f64> {
        self.az_resolution.or_else(|| self.dome.az_resolution())
    }
}

impl<T: CoordinateTransform> DomeDevice for DomeSync<T> {
    /// Slew to where the telescope needs the slit. `requested_az` is ignored.
    fn slew_to_az(&mut self, requested_az: f64) -> DeviceResult<()> {
        let target = self.dome_target()?;
        if !target.degrees.is_finite() {
            return Err(DeviceError::invalid_data(&self.name, "model azimuth not finite"));
        }
        tracing::info!(
            requested_az,
            target = target.degrees,
            fallback = target.fallback,
            "slewing dome to model azimuth"
        );
        self.dome.slew_to_az(target.degrees)
    }

    fn is_slewing(&mut self) -> DeviceResult<bool> {
        self.dome.is_slewing()
    }

    fn abort_slew(&mut self) -> DeviceResult<()> {
        self.dome.abort_slew()
    }

    fn open_slit(&mut self) -> DeviceResult<()> {
        self.dome.open_slit()
    }

    fn close_slit(&mut self) -> DeviceResult<()> {
        self.dome.close_slit()
    }

    fn is_slit_open(&mut self) -> DeviceResult<bool> {
        self.dome.is_slit_open()
    }

    fn open_flap(&mut self) -> DeviceResult<()> {
        self.dome.open_flap()
    }

    fn close_flap(&mut self) -> DeviceResult<()> {
        self.dome.close_flap()
    }

    fn is_flap_open(&mut self) -> DeviceResult<bool> {
        self.dome.is_flap_open()
    }

    fn metadata(&mut self) -> DeviceResult<Vec<(String, String)>> {
        self.dome.metadata()
    }
}
