//! Simulated devices for running without hardware.
//!
//! The dome is a rate-limited rotator. It either chases a slew target along
//! the shorter arc (closed loop) or turns at full rate while a motor relay is
//! energized (open loop). Position is integrated lazily from wall-clock time
//! whenever it is read.

use ds_control::{
    AzimuthSensor, DeviceError, DeviceResult, DomeDevice, RelayChannels, RelaySwitch,
    TelescopeSource,
};
use ds_core::{map180, map360};
use ds_model::TelescopePointing;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Instant;

/// Rotation state shared by the simulated dome and its relay.
#[derive(Debug, Clone)]
pub struct DomeMotion {
    az_deg: f64,
    rate_deg_per_s: f64,
    target: Option<f64>,
    /// -1, 0 or +1 while a relay holds the motor on.
    motor: f64,
    last: Instant,
}

impl DomeMotion {
    pub fn new(az_deg: f64, rate_deg_per_s: f64) -> Self {
        Self::new_at(az_deg, rate_deg_per_s, Instant::now())
    }

    pub fn new_at(az_deg: f64, rate_deg_per_s: f64, now: Instant) -> Self {
        Self {
            az_deg: map360(az_deg),
            rate_deg_per_s: rate_deg_per_s.abs(),
            target: None,
            motor: 0.0,
            last: now,
        }
    }

    /// Integrate motion up to `now`.
    pub fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        let reach = self.rate_deg_per_s * dt;
        if let Some(target) = self.target {
            let remaining = map180(target - self.az_deg);
            if remaining.abs() <= reach {
                self.az_deg = map360(target);
                self.target = None;
            } else {
                self.az_deg = map360(self.az_deg + reach.copysign(remaining));
            }
        } else {
            self.az_deg = map360(self.az_deg + self.motor * reach);
        }
    }

    pub fn az_deg(&self) -> f64 {
        self.az_deg
    }

    pub fn is_slewing(&self) -> bool {
        self.target.is_some()
    }

    pub fn slew_to(&mut self, az_deg: f64, now: Instant) {
        self.advance(now);
        self.target = Some(map360(az_deg));
    }

    pub fn stop(&mut self, now: Instant) {
        self.advance(now);
        self.target = None;
        self.motor = 0.0;
    }

    pub fn set_motor(&mut self, motor: f64, now: Instant) {
        self.advance(now);
        self.target = None;
        self.motor = motor.clamp(-1.0, 1.0);
    }
}

pub type SharedMotion = Rc<RefCell<DomeMotion>>;

pub fn shared_motion(az_deg: f64, rate_deg_per_s: f64) -> SharedMotion {
    Rc::new(RefCell::new(DomeMotion::new(az_deg, rate_deg_per_s)))
}

/// Simulated dome with slit and flap.
#[derive(Debug)]
pub struct SimulatedDome {
    name: String,
    motion: SharedMotion,
    resolution: Option<f64>,
    slit_open: bool,
    flap_open: bool,
}

impl SimulatedDome {
    pub fn new(name: impl Into<String>, motion: SharedMotion) -> Self {
        Self {
            name: name.into(),
            motion,
            resolution: None,
            slit_open: false,
            flap_open: false,
        }
    }

    /// Report azimuth quantized to `resolution_deg`.
    pub fn with_resolution(mut self, resolution_deg: f64) -> Self {
        self.resolution = Some(resolution_deg);
        self
    }

    pub fn motion(&self) -> SharedMotion {
        self.motion.clone()
    }
}

impl AzimuthSensor for SimulatedDome {
    fn az(&mut self) -> DeviceResult<f64> {
        let mut motion = self.motion.borrow_mut();
        motion.advance(Instant::now());
        let az = motion.az_deg();
        Ok(match self.resolution {
            Some(step) if step > 0.0 => map360((az / step).round() * step),
            _ => az,
        })
    }

    fn az_resolution(&self) -> Option<f64> {
        self.resolution
    }
}

impl DomeDevice for SimulatedDome {
    fn slew_to_az(&mut self, az_deg: f64) -> DeviceResult<()> {
        if !az_deg.is_finite() {
            return Err(DeviceError::invalid_data(&self.name, "non-finite slew target"));
        }
        self.motion.borrow_mut().slew_to(az_deg, Instant::now());
        Ok(())
    }

    fn is_slewing(&mut self) -> DeviceResult<bool> {
        let mut motion = self.motion.borrow_mut();
        motion.advance(Instant::now());
        Ok(motion.is_slewing())
    }

    fn abort_slew(&mut self) -> DeviceResult<()> {
        self.motion.borrow_mut().stop(Instant::now());
        Ok(())
    }

    fn open_slit(&mut self) -> DeviceResult<()> {
        self.slit_open = true;
        Ok(())
    }

    fn close_slit(&mut self) -> DeviceResult<()> {
        self.slit_open = false;
        Ok(())
    }

    fn is_slit_open(&mut self) -> DeviceResult<bool> {
        Ok(self.slit_open)
    }

    fn open_flap(&mut self) -> DeviceResult<()> {
        self.flap_open = true;
        Ok(())
    }

    fn close_flap(&mut self) -> DeviceResult<()> {
        self.flap_open = false;
        Ok(())
    }

    fn is_flap_open(&mut self) -> DeviceResult<bool> {
        Ok(self.flap_open)
    }

    fn metadata(&mut self) -> DeviceResult<Vec<(String, String)>> {
        let az = self.az()?;
        Ok(vec![
            ("DOME_MDL".to_string(), format!("Simulated {}", self.name)),
            ("DOME_AZ".to_string(), format!("{az:.2}")),
            ("DOME_SLT".to_string(), self.slit_open.to_string()),
        ])
    }
}

/// Simulated two-outlet power switch wired to a simulated dome motor.
#[derive(Debug)]
pub struct SimulatedRelay {
    motion: SharedMotion,
    channels: RelayChannels,
    energized: BTreeSet<u8>,
}

impl SimulatedRelay {
    pub fn new(motion: SharedMotion, channels: RelayChannels) -> Self {
        Self {
            motion,
            channels,
            energized: BTreeSet::new(),
        }
    }

    fn update_motor(&self) {
        let up = self.energized.contains(&self.channels.increase);
        let down = self.energized.contains(&self.channels.decrease);
        let motor = match (up, down) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        self.motion.borrow_mut().set_motor(motor, Instant::now());
    }
}

impl RelaySwitch for SimulatedRelay {
    fn verify(&mut self) -> DeviceResult<bool> {
        Ok(true)
    }

    fn on(&mut self, channel: u8) -> DeviceResult<()> {
        self.energized.insert(channel);
        self.update_motor();
        Ok(())
    }

    fn off(&mut self, channel: u8) -> DeviceResult<()> {
        self.energized.remove(&channel);
        self.update_motor();
        Ok(())
    }

    fn status(&mut self, channel: u8) -> DeviceResult<bool> {
        Ok(self.energized.contains(&channel))
    }
}

/// Telescope holding a fixed equatorial position, as if tracking.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedTelescope {
    pointing: TelescopePointing,
}

impl SimulatedTelescope {
    pub fn new(ra_hours: f64, dec_deg: f64) -> Self {
        Self {
            pointing: TelescopePointing::equatorial(ra_hours, dec_deg),
        }
    }
}

impl TelescopeSource for SimulatedTelescope {
    fn pointing(&mut self) -> DeviceResult<TelescopePointing> {
        Ok(self.pointing)
    }
}
