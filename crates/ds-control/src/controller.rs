//! Tracking controller: one decision per tick.

use crate::actuator::{Actuation, Direction};
use crate::cancel::{CancelToken, DEFAULT_SLICE};
use crate::deviation::{AzimuthLimits, DeviationPolicy};
use crate::devices::{DeviceError, SiderealClock, TelescopeSource};
use crate::error::{ControlError, ControlResult};
use crate::poll::{PollClock, PollConfig};
use crate::state::TrackingState;
use ds_core::{AngularVelocity, as_deg_per_s, as_s, deg, deg_per_s, sweep_time};
use ds_model::{
    AzimuthModel, CoordinateTransform, DEFAULT_ITERATIONS, DomeAzimuth, SphericalTransform,
    TelescopePointing,
};
use std::time::{Duration, Instant};

/// Tuning for the tracking loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Solver refinement passes.
    pub iterations: usize,
    /// Deadband half-width, degrees.
    pub tolerance_deg: f64,
    /// Calibrated dome rotation rate for timed relay drives.
    pub rotation_rate: AngularVelocity,
    pub policy: DeviationPolicy,
    pub limits: Option<AzimuthLimits>,
    /// Granularity of cancellation checks between ticks.
    pub cancel_slice: Duration,
    /// Known sensor resolution, degrees. Unset means ask the sensor.
    pub az_resolution_deg: Option<f64>,
}

impl TrackingSettings {
    /// # Errors
    ///
    /// Returns error if the tolerance is negative or the rate is not positive.
    pub fn new(tolerance_deg: f64, rotation_rate_deg_per_s: f64) -> ControlResult<Self> {
        let settings = Self {
            tolerance_deg,
            rotation_rate: deg_per_s(rotation_rate_deg_per_s),
            ..Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_policy(mut self, policy: DeviationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: AzimuthLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_cancel_slice(mut self, slice: Duration) -> Self {
        self.cancel_slice = slice;
        self
    }

    pub fn with_az_resolution(mut self, resolution_deg: f64) -> Self {
        self.az_resolution_deg = Some(resolution_deg);
        self
    }

    /// # Errors
    ///
    /// Returns `Configuration` describing the first bad field.
    pub fn validate(&self) -> ControlResult<()> {
        if !self.tolerance_deg.is_finite() || self.tolerance_deg < 0.0 {
            return Err(ControlError::Configuration {
                what: format!("tolerance must be >= 0 degrees, got {}", self.tolerance_deg),
            });
        }
        let rate = as_deg_per_s(self.rotation_rate);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ControlError::Configuration {
                what: format!("rotation rate must be positive, got {rate} deg/s"),
            });
        }
        Ok(())
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            tolerance_deg: 5.0,
            rotation_rate: deg_per_s(2.5),
            policy: DeviationPolicy::default(),
            limits: None,
            cancel_slice: DEFAULT_SLICE,
            az_resolution_deg: None,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Miss within the deadband; nothing moved.
    InDeadband { target: f64, deviation: f64 },
    /// Closed-loop slew commanded.
    Slewed { target: f64 },
    /// Closed-loop dome still moving from an earlier command.
    SlewInProgress,
    /// Relay drive finished or was cut short by cancellation.
    Drove {
        direction: Direction,
        duration: Duration,
        completed: bool,
    },
    /// A device failed this tick; tracking continues next tick.
    Skipped(DeviceError),
}

impl TickOutcome {
    pub fn is_actuation(&self) -> bool {
        matches!(self, TickOutcome::Slewed { .. } | TickOutcome::Drove { .. })
    }
}

/// Totals for one call to [`TrackingController::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub actuations: u64,
    pub skipped: u64,
    pub cancelled: bool,
}

/// Keeps the dome slit on the telescope.
pub struct TrackingController<T = SphericalTransform> {
    model: AzimuthModel<T>,
    settings: TrackingSettings,
    clock: Box<dyn SiderealClock>,
    telescope: Box<dyn TelescopeSource>,
    actuation: Actuation,
    state: TrackingState,
    cancel: CancelToken,
}

impl<T: CoordinateTransform> TrackingController<T> {
    /// Build a controller around resolved collaborators.
    ///
    /// The sensor resolution comes from the settings, or from the sensor when
    /// the settings leave it unset. If it is coarser than the tolerance, the
    /// tolerance is raised to match so the deadband can be met.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the settings are invalid.
    pub fn new(
        model: AzimuthModel<T>,
        mut settings: TrackingSettings,
        clock: Box<dyn SiderealClock>,
        telescope: Box<dyn TelescopeSource>,
        actuation: Actuation,
    ) -> ControlResult<Self> {
        settings.validate()?;
        let resolution = settings
            .az_resolution_deg
            .or_else(|| actuation.az_resolution());
        if let Some(resolution) = resolution
            && resolution.is_finite()
            && resolution > settings.tolerance_deg
        {
            tracing::warn!(
                tolerance_deg = settings.tolerance_deg,
                resolution_deg = resolution,
                "tolerance finer than azimuth resolution, raising tolerance"
            );
            settings.tolerance_deg = resolution;
        }
        let state = TrackingState::new(settings.tolerance_deg, settings.rotation_rate);
        Ok(Self {
            model,
            settings,
            clock,
            telescope,
            actuation,
            state,
            cancel: CancelToken::new(),
        })
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    pub fn model(&self) -> &AzimuthModel<T> {
        &self.model
    }

    pub fn actuation(&self) -> &Actuation {
        &self.actuation
    }

    pub fn actuation_mut(&mut self) -> &mut Actuation {
        &mut self.actuation
    }

    /// Dome azimuth the slit should face right now, after soft limits.
    ///
    /// # Errors
    ///
    /// Returns `TransientDevice` if the telescope or clock cannot be read.
    pub fn target_az(&mut self) -> ControlResult<DomeAzimuth> {
        let pointing = self.telescope.pointing()?;
        if !pointing.is_finite() {
            return Err(DeviceError::invalid_data("telescope", "non-finite pointing").into());
        }
        let lst = match pointing {
            TelescopePointing::Equatorial { .. } => self.clock.lst_rad()?,
            TelescopePointing::Horizontal(_) => 0.0,
        };
        let mut solved = self
            .model
            .solve_detailed(&pointing, lst, self.settings.iterations);
        if let Some(limits) = self.settings.limits {
            solved.degrees = limits.clamp(solved.degrees);
        }
        Ok(solved)
    }

    /// Run one poll cycle.
    ///
    /// Transient device failures are logged and reported as
    /// [`TickOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns `ActuationFault` after a relay fault. Both channels are off.
    pub fn tick(&mut self) -> ControlResult<TickOutcome> {
        self.state.ticks += 1;
        match self.decide_and_act() {
            Ok(outcome) => Ok(outcome),
            Err(ControlError::TransientDevice(e)) => {
                self.state.skipped_ticks += 1;
                tracing::warn!(error = %e, tick = self.state.ticks, "skipping dome tracking cycle");
                Ok(TickOutcome::Skipped(e))
            }
            Err(e) => {
                self.actuation.make_safe();
                tracing::error!(error = %e, "dome tracking stopped");
                Err(e)
            }
        }
    }

    fn decide_and_act(&mut self) -> ControlResult<TickOutcome> {
        let solved = self.target_az()?;
        let target = solved.degrees;
        let current = self.actuation.read_az()?;
        if !current.is_finite() {
            return Err(DeviceError::invalid_data("dome", "non-finite azimuth").into());
        }

        let deviation = self.settings.policy.deviation(target, current);
        self.state.current_az = Some(current);
        self.state.target_az = Some(target);
        self.state.deviation = Some(deviation);

        if self.state.within_tolerance(deviation) {
            tracing::debug!(target, current, deviation, "dome within tolerance");
            return Ok(TickOutcome::InDeadband { target, deviation });
        }

        match &mut self.actuation {
            Actuation::ClosedLoop(dome) => {
                if dome.is_slewing()? {
                    tracing::debug!(target, "dome still slewing");
                    return Ok(TickOutcome::SlewInProgress);
                }
                dome.slew_to_az(target)?;
                self.state.actuations += 1;
                tracing::info!(target, current, deviation, "dome slew commanded");
                Ok(TickOutcome::Slewed { target })
            }
            Actuation::Relay { driver, .. } => {
                let Some(direction) = Direction::from_deviation(deviation) else {
                    return Ok(TickOutcome::InDeadband { target, deviation });
                };
                let seconds = as_s(sweep_time(deg(deviation.abs()), self.state.rotation_rate));
                let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
                    ControlError::Configuration {
                        what: format!("drive time of {seconds} s is not representable"),
                    }
                })?;
                tracing::info!(
                    target,
                    current,
                    deviation,
                    ?direction,
                    seconds,
                    "driving dome"
                );
                let report =
                    driver.drive(direction, duration, &self.cancel, &mut self.state.phase)?;
                self.state.actuations += 1;
                Ok(TickOutcome::Drove {
                    direction,
                    duration,
                    completed: report.completed,
                })
            }
        }
    }

    /// Tick on the poll period until cancelled, faulted, or `max_ticks`
    /// ticks have run.
    ///
    /// The wait between ticks is cancellable. A drive cut short by
    /// cancellation ends the run.
    ///
    /// # Errors
    ///
    /// Returns the first hard error from [`tick`](Self::tick).
    pub fn run(&mut self, poll: PollConfig, max_ticks: Option<u64>) -> ControlResult<RunSummary> {
        let mut clock = PollClock::new(poll, Instant::now());
        let mut summary = RunSummary::default();
        tracing::info!(
            period_s = poll.period.as_secs_f64(),
            tolerance_deg = self.state.tolerance_deg,
            open_loop = self.actuation.is_open_loop(),
            "dome tracking started"
        );

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if max_ticks.is_some_and(|n| summary.ticks >= n) {
                break;
            }
            let wait = clock.time_until_tick(Instant::now());
            if !wait.is_zero() && !self.cancel.sleep(wait, self.settings.cancel_slice) {
                summary.cancelled = true;
                break;
            }

            let started = Instant::now();
            let outcome = self.tick()?;
            summary.ticks += 1;
            if outcome.is_actuation() {
                summary.actuations += 1;
            }
            match outcome {
                TickOutcome::Skipped(_) => summary.skipped += 1,
                TickOutcome::Drove {
                    completed: false, ..
                } => {
                    summary.cancelled = true;
                    break;
                }
                _ => {}
            }
            clock.advance(started, Instant::now());
        }

        self.actuation.make_safe();
        tracing::info!(
            ticks = summary.ticks,
            actuations = summary.actuations,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "dome tracking stopped"
        );
        Ok(summary)
    }
}
