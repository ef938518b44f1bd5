//! Dome actuation: closed-loop slews and timed relay drives.
//!
//! A relay drive is open loop. Nothing reports the dome position while the
//! motor runs, so the drive time comes from a calibrated rotation rate and any
//! slip shows up only on the next tick's azimuth reading.
//!
//! Relay invariants:
//! - at most one channel is energized at any instant
//! - the energized channel is released on every exit path, including
//!   cancellation, faults and unwinding
//! - after a fault both channels are forced off before the error is returned

use crate::cancel::{CancelToken, DEFAULT_SLICE};
use crate::devices::{AzimuthSensor, DeviceResult, DomeDevice, RelaySwitch};
use crate::error::{ControlError, ControlResult};
use crate::state::DrivePhase;
use std::time::{Duration, Instant};

/// Direction of a relay drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// `None` for a zero deviation.
    pub fn from_deviation(deviation_deg: f64) -> Option<Self> {
        if deviation_deg > 0.0 {
            Some(Direction::Increase)
        } else if deviation_deg < 0.0 {
            Some(Direction::Decrease)
        } else {
            None
        }
    }
}

/// Relay outlets wired to the dome motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChannels {
    pub increase: u8,
    pub decrease: u8,
}

impl RelayChannels {
    /// # Errors
    ///
    /// Returns error if both directions share one outlet.
    pub fn new(increase: u8, decrease: u8) -> ControlResult<Self> {
        if increase == decrease {
            return Err(ControlError::InvalidArg {
                what: "increase and decrease relay channels must differ",
            });
        }
        Ok(Self { increase, decrease })
    }

    pub fn channel(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Increase => self.increase,
            Direction::Decrease => self.decrease,
        }
    }

    pub fn opposite(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Increase => self.decrease,
            Direction::Decrease => self.increase,
        }
    }
}

impl Default for RelayChannels {
    fn default() -> Self {
        Self {
            increase: 2,
            decrease: 1,
        }
    }
}

/// What a finished relay drive did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveReport {
    pub direction: Direction,
    pub requested: Duration,
    pub elapsed: Duration,
    /// False when the drive was cut short by cancellation.
    pub completed: bool,
}

/// Holds one energized channel; switches it off when dropped.
struct Energized<'a, R: RelaySwitch> {
    relay: &'a mut R,
    channel: u8,
    armed: bool,
}

impl<'a, R: RelaySwitch> Energized<'a, R> {
    fn on(relay: &'a mut R, channel: u8) -> DeviceResult<Self> {
        relay.on(channel)?;
        Ok(Self {
            relay,
            channel,
            armed: true,
        })
    }

    fn status(&mut self) -> DeviceResult<bool> {
        self.relay.status(self.channel)
    }

    fn release(mut self) -> DeviceResult<()> {
        self.armed = false;
        self.relay.off(self.channel)
    }
}

impl<R: RelaySwitch> Drop for Energized<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.relay.off(self.channel) {
            Ok(()) => tracing::warn!(channel = self.channel, "relay released on abnormal exit"),
            Err(e) => tracing::error!(
                channel = self.channel,
                error = %e,
                "failed to release relay on abnormal exit"
            ),
        }
    }
}

/// Timed open-loop driver over a two-channel relay.
#[derive(Debug)]
pub struct RelayDriver<R> {
    relay: R,
    channels: RelayChannels,
    slice: Duration,
    monitor: bool,
}

impl<R: RelaySwitch> RelayDriver<R> {
    pub fn new(relay: R, channels: RelayChannels) -> Self {
        Self {
            relay,
            channels,
            slice: DEFAULT_SLICE,
            monitor: true,
        }
    }

    /// Granularity of cancellation checks during a drive.
    pub fn with_slice(mut self, slice: Duration) -> Self {
        self.slice = if slice.is_zero() { DEFAULT_SLICE } else { slice };
        self
    }

    /// Poll the energized channel's status each slice and fault if it drops.
    pub fn with_monitoring(mut self, monitor: bool) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn channels(&self) -> RelayChannels {
        self.channels
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut R {
        &mut self.relay
    }

    /// Run the motor in `direction` for `duration`.
    ///
    /// `phase` moves to `Driving` while the relay is energized and is always
    /// back to `Idle` when this returns.
    ///
    /// # Errors
    ///
    /// - `TransientDevice` if the switch cannot be reached for verification;
    ///   nothing was energized.
    /// - `ActuationFault` if the switch fails verification, a command fails,
    ///   or the channel drops out mid-drive. Both channels are forced off.
    /// - `Configuration` if `duration` is too long to schedule.
    pub fn drive(
        &mut self,
        direction: Direction,
        duration: Duration,
        cancel: &CancelToken,
        phase: &mut DrivePhase,
    ) -> ControlResult<DriveReport> {
        if !phase.is_idle() {
            return Err(ControlError::ActuationFault {
                what: "drive requested while another drive is active".to_string(),
            });
        }
        if Instant::now().checked_add(duration).is_none() {
            return Err(ControlError::Configuration {
                what: format!("drive time of {} s is too long", duration.as_secs_f64()),
            });
        }

        match self.relay.verify() {
            Ok(true) => {}
            Ok(false) => {
                self.force_all_off();
                return Err(ControlError::ActuationFault {
                    what: "relay switch failed verification".to_string(),
                });
            }
            Err(e) => return Err(ControlError::TransientDevice(e)),
        }

        let result = self.energized_drive(direction, duration, cancel, phase);
        *phase = DrivePhase::Idle;
        if result.is_err() {
            self.force_all_off();
        }
        result
    }

    fn energized_drive(
        &mut self,
        direction: Direction,
        duration: Duration,
        cancel: &CancelToken,
        phase: &mut DrivePhase,
    ) -> ControlResult<DriveReport> {
        let channel = self.channels.channel(direction);
        let opposite = self.channels.opposite(direction);

        self.relay.off(opposite).map_err(|e| ControlError::ActuationFault {
            what: format!("could not release channel {opposite} before drive: {e}"),
        })?;

        let mut guard =
            Energized::on(&mut self.relay, channel).map_err(|e| ControlError::ActuationFault {
                what: format!("could not energize channel {channel}: {e}"),
            })?;
        tracing::info!(
            channel,
            ?direction,
            seconds = duration.as_secs_f64(),
            "relay energized"
        );

        let start = Instant::now();
        let deadline = start
            .checked_add(duration)
            .ok_or_else(|| ControlError::Configuration {
                what: format!("drive time of {} s is too long", duration.as_secs_f64()),
            })?;
        let completed = loop {
            let now = Instant::now();
            if now >= deadline {
                break true;
            }
            if cancel.is_cancelled() {
                break false;
            }
            *phase = DrivePhase::Driving {
                direction,
                remaining: deadline - now,
            };
            if self.monitor {
                match guard.status() {
                    Ok(true) => {}
                    Ok(false) => {
                        return Err(ControlError::ActuationFault {
                            what: format!("channel {channel} dropped out mid-drive"),
                        });
                    }
                    Err(e) => {
                        return Err(ControlError::ActuationFault {
                            what: format!("lost relay status mid-drive: {e}"),
                        });
                    }
                }
            }
            std::thread::sleep(self.slice.min(deadline - now));
        };
        let elapsed = start.elapsed();

        guard.release().map_err(|e| ControlError::ActuationFault {
            what: format!("could not release channel {channel}: {e}"),
        })?;

        if completed {
            tracing::info!(channel, seconds = elapsed.as_secs_f64(), "relay released");
        } else {
            tracing::warn!(
                channel,
                seconds = elapsed.as_secs_f64(),
                "relay drive cancelled"
            );
        }

        Ok(DriveReport {
            direction,
            requested: duration,
            elapsed,
            completed,
        })
    }

    /// Switch both channels off, logging rather than returning failures.
    pub fn force_all_off(&mut self) {
        for channel in [self.channels.increase, self.channels.decrease] {
            if let Err(e) = self.relay.off(channel) {
                tracing::error!(channel, error = %e, "failed to force relay channel off");
            }
        }
    }
}

/// How the controller moves the dome.
pub enum Actuation {
    /// The dome positions itself and reports its own azimuth.
    ClosedLoop(Box<dyn DomeDevice>),
    /// Timed relay drives; azimuth comes from a separate sensor.
    Relay {
        sensor: Box<dyn AzimuthSensor>,
        driver: RelayDriver<Box<dyn RelaySwitch>>,
    },
}

impl Actuation {
    pub fn read_az(&mut self) -> DeviceResult<f64> {
        match self {
            Actuation::ClosedLoop(dome) => dome.az(),
            Actuation::Relay { sensor, .. } => sensor.az(),
        }
    }

    pub fn az_resolution(&self) -> Option<f64> {
        match self {
            Actuation::ClosedLoop(dome) => dome.az_resolution(),
            Actuation::Relay { sensor, .. } => sensor.az_resolution(),
        }
    }

    pub fn is_open_loop(&self) -> bool {
        matches!(self, Actuation::Relay { .. })
    }

    /// Leave the actuator safe: relay channels off. Closed-loop domes are
    /// left where they are.
    pub fn make_safe(&mut self) {
        if let Actuation::Relay { driver, .. } = self {
            driver.force_all_off();
        }
    }
}

impl std::fmt::Debug for Actuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actuation::ClosedLoop(_) => f.write_str("Actuation::ClosedLoop"),
            Actuation::Relay { driver, .. } => f
                .debug_struct("Actuation::Relay")
                .field("channels", &driver.channels())
                .finish(),
        }
    }
}
