//! Poll cadence for the tracking loop.
//!
//! Ticks are scheduled on a fixed period. A tick that overruns (a long relay
//! drive) does not cause a burst of catch-up ticks; the schedule restarts
//! from the time the overrun tick finished.

use crate::error::{ControlError, ControlResult};
use std::time::{Duration, Instant};

/// Longest accepted poll period: one day.
pub const MAX_POLL_PERIOD: Duration = Duration::from_secs(86_400);

/// Poll configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Time between tick starts.
    pub period: Duration,
}

impl PollConfig {
    /// # Errors
    ///
    /// Returns error if `period_s` is not positive or exceeds
    /// [`MAX_POLL_PERIOD`].
    pub fn new(period_s: f64) -> ControlResult<Self> {
        if !period_s.is_finite() || period_s <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "poll period must be positive",
            });
        }
        let period = Duration::try_from_secs_f64(period_s)
            .ok()
            .filter(|p| *p <= MAX_POLL_PERIOD && !p.is_zero())
            .ok_or(ControlError::InvalidArg {
                what: "poll period must be between one nanosecond and one day",
            })?;
        Ok(Self { period })
    }

    /// Create a poll configuration from frequency in Hz.
    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "poll frequency must be positive",
            });
        }
        Self::new(1.0 / freq_hz)
    }

    pub fn frequency(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }
}

impl Default for PollConfig {
    /// One tick per second.
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

/// Tracks when the next tick is due.
#[derive(Debug, Clone, PartialEq)]
pub struct PollClock {
    pub config: PollConfig,
    pub next_tick: Instant,
}

impl PollClock {
    /// The first tick is due immediately.
    pub fn new(config: PollConfig, now: Instant) -> Self {
        Self {
            config,
            next_tick: now,
        }
    }

    pub fn should_tick(&self, now: Instant) -> bool {
        now >= self.next_tick
    }

    /// Schedule the tick after the one that started at `started`.
    ///
    /// If that slot has already passed by `now`, the next tick is due at `now`.
    pub fn advance(&mut self, started: Instant, now: Instant) {
        self.next_tick = match started.checked_add(self.config.period) {
            Some(next) if next >= now => next,
            _ => now,
        };
    }

    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }
}
