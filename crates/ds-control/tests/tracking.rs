//! Tracking controller behavior against scripted devices.

use ds_control::{
    Actuation, AzimuthLimits, AzimuthSensor, CancelToken, ControlError, DeviationPolicy,
    DeviceError, DeviceResult, Direction, DomeDevice, PollConfig, RelayChannels, RelayDriver,
    RelaySwitch, SiderealClock, TelescopeSource, TickOutcome, TrackingController,
    TrackingSettings,
};
use ds_model::{AzimuthModel, MountGeometry, TelescopePointing};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

struct FixedClock;

impl SiderealClock for FixedClock {
    fn lst_rad(&self) -> DeviceResult<f64> {
        Ok(1.0)
    }
}

/// Replays queued readings, then repeats the last good pointing.
struct ScriptedTelescope {
    queue: VecDeque<DeviceResult<TelescopePointing>>,
    last: TelescopePointing,
}

impl ScriptedTelescope {
    fn pointing_at(az_deg: f64) -> Self {
        Self {
            queue: VecDeque::new(),
            last: TelescopePointing::horizontal(30.0, az_deg, 0.0),
        }
    }

    fn then(mut self, reading: DeviceResult<TelescopePointing>) -> Self {
        self.queue.push_back(reading);
        self
    }
}

impl TelescopeSource for ScriptedTelescope {
    fn pointing(&mut self) -> DeviceResult<TelescopePointing> {
        match self.queue.pop_front() {
            Some(reading) => {
                if let Ok(p) = &reading
                    && p.is_finite()
                {
                    self.last = *p;
                }
                reading
            }
            None => Ok(self.last),
        }
    }
}

#[derive(Default)]
struct DomeLog {
    az: f64,
    slewing: bool,
    slews: Vec<f64>,
}

struct SharedDome {
    log: Rc<RefCell<DomeLog>>,
    resolution: Option<f64>,
}

impl AzimuthSensor for SharedDome {
    fn az(&mut self) -> DeviceResult<f64> {
        Ok(self.log.borrow().az)
    }

    fn az_resolution(&self) -> Option<f64> {
        self.resolution
    }
}

impl DomeDevice for SharedDome {
    fn slew_to_az(&mut self, az_deg: f64) -> DeviceResult<()> {
        let mut log = self.log.borrow_mut();
        log.slews.push(az_deg);
        log.slewing = true;
        Ok(())
    }

    fn is_slewing(&mut self) -> DeviceResult<bool> {
        Ok(self.log.borrow().slewing)
    }

    fn abort_slew(&mut self) -> DeviceResult<()> {
        self.log.borrow_mut().slewing = false;
        Ok(())
    }
}

struct FixedSensor(f64);

impl AzimuthSensor for FixedSensor {
    fn az(&mut self) -> DeviceResult<f64> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct RelayLog {
    energized: [bool; 8],
    commands: Vec<String>,
    verify_fails: bool,
    panic_on_status: bool,
    status_polls: usize,
    /// After this many status polls the energized channel drops out.
    drop_out_after: Option<usize>,
    /// After this many status polls the switch stops answering.
    unreachable_after: Option<usize>,
}

impl RelayLog {
    fn all_off(&self) -> bool {
        self.energized.iter().all(|on| !on)
    }

    fn energize_count(&self) -> usize {
        self.commands.iter().filter(|c| c.starts_with("on")).count()
    }
}

struct SharedRelay(Rc<RefCell<RelayLog>>);

impl RelaySwitch for SharedRelay {
    fn verify(&mut self) -> DeviceResult<bool> {
        Ok(!self.0.borrow().verify_fails)
    }

    fn on(&mut self, channel: u8) -> DeviceResult<()> {
        let mut log = self.0.borrow_mut();
        let other_on = log
            .energized
            .iter()
            .enumerate()
            .any(|(ch, on)| *on && ch != channel as usize);
        assert!(!other_on, "two channels energized at once");
        log.energized[channel as usize] = true;
        log.commands.push(format!("on {channel}"));
        Ok(())
    }

    fn off(&mut self, channel: u8) -> DeviceResult<()> {
        let mut log = self.0.borrow_mut();
        log.energized[channel as usize] = false;
        log.commands.push(format!("off {channel}"));
        Ok(())
    }

    fn status(&mut self, channel: u8) -> DeviceResult<bool> {
        let mut log = self.0.borrow_mut();
        if log.panic_on_status {
            drop(log);
            panic!("relay firmware crashed");
        }
        log.status_polls += 1;
        if log.unreachable_after.is_some_and(|n| log.status_polls > n) {
            return Err(DeviceError::unreachable("switch", "no reply"));
        }
        if log.drop_out_after.is_some_and(|n| log.status_polls > n) {
            log.energized[channel as usize] = false;
        }
        Ok(log.energized[channel as usize])
    }
}

/// Geometry with the optical axis through the dome center: target equals
/// telescope azimuth.
fn centered_model() -> AzimuthModel {
    AzimuthModel::new(MountGeometry::new(38.33, 147.0, 0.0, 0.0, 0.0).unwrap())
}

fn closed_loop(
    telescope_az: f64,
    dome_az: f64,
    settings: TrackingSettings,
) -> (TrackingController, Rc<RefCell<DomeLog>>) {
    let log = Rc::new(RefCell::new(DomeLog {
        az: dome_az,
        ..Default::default()
    }));
    let dome = SharedDome {
        log: log.clone(),
        resolution: None,
    };
    let controller = TrackingController::new(
        centered_model(),
        settings,
        Box::new(FixedClock),
        Box::new(ScriptedTelescope::pointing_at(telescope_az)),
        Actuation::ClosedLoop(Box::new(dome)),
    )
    .unwrap();
    (controller, log)
}

fn relay(
    telescope: ScriptedTelescope,
    dome_az: f64,
    settings: TrackingSettings,
) -> (TrackingController, Rc<RefCell<RelayLog>>) {
    let log = Rc::new(RefCell::new(RelayLog::default()));
    let driver = RelayDriver::new(
        Box::new(SharedRelay(log.clone())) as Box<dyn RelaySwitch>,
        RelayChannels::default(),
    )
    .with_slice(Duration::from_millis(2));
    let controller = TrackingController::new(
        centered_model(),
        settings,
        Box::new(FixedClock),
        Box::new(telescope),
        Actuation::Relay {
            sensor: Box::new(FixedSensor(dome_az)),
            driver,
        },
    )
    .unwrap();
    (controller, log)
}

fn fast_settings() -> TrackingSettings {
    TrackingSettings::new(5.0, 1000.0).unwrap()
}

#[test]
fn deadband_means_no_motion() {
    let (mut ctl, log) = closed_loop(183.0, 180.0, TrackingSettings::default());
    let outcome = ctl.tick().unwrap();
    assert!(matches!(outcome, TickOutcome::InDeadband { .. }));
    assert!(log.borrow().slews.is_empty());

    let (mut ctl, log) = relay(ScriptedTelescope::pointing_at(177.0), 180.0, fast_settings());
    assert!(matches!(ctl.tick().unwrap(), TickOutcome::InDeadband { .. }));
    assert!(log.borrow().commands.is_empty());
}

#[test]
fn closed_loop_slews_then_waits_for_dome() {
    let (mut ctl, log) = closed_loop(200.0, 180.0, TrackingSettings::default());
    match ctl.tick().unwrap() {
        TickOutcome::Slewed { target } => assert!((target - 200.0).abs() < 1e-6),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(ctl.tick().unwrap(), TickOutcome::SlewInProgress);
    assert_eq!(log.borrow().slews.len(), 1);
    assert_eq!(ctl.state().actuations, 1);
}

#[test]
fn one_timed_drive_per_excursion() {
    let (mut ctl, log) = relay(ScriptedTelescope::pointing_at(200.0), 180.0, fast_settings());
    match ctl.tick().unwrap() {
        TickOutcome::Drove {
            direction,
            duration,
            completed,
        } => {
            assert_eq!(direction, Direction::Increase);
            assert!(completed);
            // 20 degrees at 1000 deg/s
            let expected = 20.0 / 1000.0;
            assert!((duration.as_secs_f64() - expected).abs() < 1e-6);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let log = log.borrow();
    assert_eq!(log.energize_count(), 1);
    assert_eq!(log.commands, vec!["off 1", "on 2", "off 2"]);
    assert!(log.all_off());
    assert!(ctl.state().phase.is_idle());
}

#[test]
fn wraparound_follows_policy() {
    let (mut signed, log) = relay(ScriptedTelescope::pointing_at(350.0), 10.0, fast_settings());
    match signed.tick().unwrap() {
        TickOutcome::Drove { direction, .. } => assert_eq!(direction, Direction::Increase),
        other => panic!("unexpected outcome {other:?}"),
    }
    let dev = signed.state().deviation.unwrap();
    assert!((dev - 340.0).abs() < 1e-6, "deviation = {dev}");
    assert_eq!(log.borrow().commands[1], "on 2");

    let (mut shortest, log) = relay(
        ScriptedTelescope::pointing_at(350.0),
        10.0,
        fast_settings().with_policy(DeviationPolicy::ShortestPath),
    );
    match shortest.tick().unwrap() {
        TickOutcome::Drove { direction, .. } => assert_eq!(direction, Direction::Decrease),
        other => panic!("unexpected outcome {other:?}"),
    }
    let dev = shortest.state().deviation.unwrap();
    assert!((dev + 20.0).abs() < 1e-6, "deviation = {dev}");
    assert_eq!(log.borrow().commands[1], "on 1");
}

#[test]
fn transient_failure_skips_one_tick() {
    let telescope = ScriptedTelescope::pointing_at(180.0)
        .then(Err(DeviceError::unreachable("telescope", "timeout")))
        .then(Ok(TelescopePointing::horizontal(f64::NAN, 10.0, 0.0)));
    let (mut ctl, log) = relay(telescope, 180.0, fast_settings());

    assert!(matches!(ctl.tick().unwrap(), TickOutcome::Skipped(_)));
    assert!(matches!(ctl.tick().unwrap(), TickOutcome::Skipped(_)));
    assert!(matches!(ctl.tick().unwrap(), TickOutcome::InDeadband { .. }));
    assert_eq!(ctl.state().skipped_ticks, 2);
    assert_eq!(ctl.state().ticks, 3);
    assert!(log.borrow().commands.is_empty());
}

#[test]
fn run_keeps_polling_through_failures() {
    let telescope = ScriptedTelescope::pointing_at(180.0)
        .then(Err(DeviceError::unreachable("telescope", "timeout")));
    let (mut ctl, _log) = relay(telescope, 180.0, fast_settings());
    let summary = ctl
        .run(PollConfig::new(0.001).unwrap(), Some(3))
        .unwrap();
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.actuations, 0);
    assert!(!summary.cancelled);
}

#[test]
fn failed_verify_is_a_hard_fault() {
    let (mut ctl, log) = relay(ScriptedTelescope::pointing_at(250.0), 180.0, fast_settings());
    log.borrow_mut().verify_fails = true;
    log.borrow_mut().energized[2] = true;

    let err = ctl.tick().unwrap_err();
    assert!(matches!(err, ControlError::ActuationFault { .. }));
    assert!(log.borrow().all_off());
    assert_eq!(log.borrow().energize_count(), 0);
}

/// A drive of 70 degrees at 10 deg/s, long enough for several status polls.
fn long_drive() -> (TrackingController, Rc<RefCell<RelayLog>>) {
    relay(
        ScriptedTelescope::pointing_at(250.0),
        180.0,
        TrackingSettings::new(5.0, 10.0).unwrap(),
    )
}

#[test]
fn channel_dropping_out_mid_drive_is_a_fault() {
    let (mut ctl, log) = long_drive();
    log.borrow_mut().drop_out_after = Some(3);

    let start = Instant::now();
    let err = ctl.tick().unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(5));
    match err {
        ControlError::ActuationFault { what } => assert!(what.contains("dropped out"), "{what}"),
        other => panic!("unexpected error {other:?}"),
    }
    let log = log.borrow();
    assert!(log.all_off());
    assert_eq!(log.energize_count(), 1);
    assert!(log.commands.iter().any(|c| c == "off 1"));
    assert!(log.commands.iter().any(|c| c == "off 2"));
    assert!(ctl.state().phase.is_idle());
}

#[test]
fn lost_status_mid_drive_is_a_fault() {
    let (mut ctl, log) = long_drive();
    log.borrow_mut().unreachable_after = Some(2);

    let err = ctl.tick().unwrap_err();
    assert!(matches!(err, ControlError::ActuationFault { .. }), "{err:?}");
    assert!(!err.is_transient());
    let log = log.borrow();
    assert!(log.all_off());
    let on = log.commands.iter().position(|c| c == "on 2").unwrap();
    assert!(log.commands[on..].iter().any(|c| c == "off 2"));
    assert!(log.commands[on..].iter().any(|c| c == "off 1"));
    assert!(ctl.state().phase.is_idle());
}

#[test]
fn cancellation_mid_drive_releases_relay() {
    // 90 degrees at 1 deg/s would take a minute and a half.
    let settings = TrackingSettings::new(5.0, 1.0).unwrap();
    let (mut ctl, log) = relay(ScriptedTelescope::pointing_at(270.0), 180.0, settings);
    let token = ctl.cancel_token();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(40));
        token.cancel();
    });

    let start = Instant::now();
    let outcome = ctl.tick().unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
    canceller.join().unwrap();

    assert!(matches!(
        outcome,
        TickOutcome::Drove {
            completed: false,
            ..
        }
    ));
    assert!(log.borrow().all_off());
    assert!(ctl.state().phase.is_idle());
}

#[test]
fn run_stops_when_cancelled_between_ticks() {
    let token = CancelToken::new();
    let (ctl, _log) = relay(ScriptedTelescope::pointing_at(180.0), 180.0, fast_settings());
    let mut ctl = ctl.with_cancel_token(token.clone());
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        token.cancel();
    });
    let summary = ctl.run(PollConfig::new(60.0).unwrap(), None).unwrap();
    canceller.join().unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.ticks, 1);
}

#[test]
fn panic_during_drive_still_releases_relay() {
    let (mut ctl, log) = relay(ScriptedTelescope::pointing_at(250.0), 180.0, fast_settings());
    log.borrow_mut().panic_on_status = true;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ctl.tick()));
    assert!(result.is_err());
    let log = log.borrow();
    assert!(log.all_off());
    assert_eq!(log.commands.last().map(String::as_str), Some("off 2"));
}

#[test]
fn soft_limits_clamp_target_before_deviation() {
    let limits = AzimuthLimits::new(0.0, 270.0).unwrap();
    let (mut ctl, log) = relay(
        ScriptedTelescope::pointing_at(300.0),
        200.0,
        fast_settings().with_limits(limits),
    );
    match ctl.tick().unwrap() {
        TickOutcome::Drove {
            direction,
            duration,
            completed,
        } => {
            assert_eq!(direction, Direction::Increase);
            assert!(completed);
            // 70 degrees to the limit, not 100 to the telescope.
            assert!((duration.as_secs_f64() - 70.0 / 1000.0).abs() < 1e-6);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(ctl.state().target_az, Some(270.0));
    let dev = ctl.state().deviation.unwrap();
    assert!((dev - 70.0).abs() < 1e-6, "deviation = {dev}");
    assert!(log.borrow().all_off());

    // Parked at the limit: nothing more to do.
    let (mut ctl, _log) = relay(
        ScriptedTelescope::pointing_at(300.0),
        268.0,
        fast_settings().with_limits(limits),
    );
    assert!(matches!(ctl.tick().unwrap(), TickOutcome::InDeadband { .. }));
}

#[test]
fn coarse_sensor_raises_tolerance() {
    let log = Rc::new(RefCell::new(DomeLog {
        az: 180.0,
        ..Default::default()
    }));
    let dome = SharedDome {
        log,
        resolution: Some(8.0),
    };
    let mut ctl = TrackingController::new(
        centered_model(),
        TrackingSettings::default(),
        Box::new(FixedClock),
        Box::new(ScriptedTelescope::pointing_at(187.0)),
        Actuation::ClosedLoop(Box::new(dome)),
    )
    .unwrap();
    assert_eq!(ctl.state().tolerance_deg, 8.0);
    assert!(matches!(ctl.tick().unwrap(), TickOutcome::InDeadband { .. }));
}

#[test]
fn equatorial_pointing_uses_sidereal_clock() {
    let telescope =
        ScriptedTelescope::pointing_at(0.0).then(Ok(TelescopePointing::equatorial(3.0, 20.0)));
    let (mut ctl, _log) = relay(telescope, 0.0, TrackingSettings::new(360.0, 1.0).unwrap());
    let target = ctl.target_az().unwrap();
    assert!(!target.fallback);
    assert!((0.0..360.0).contains(&target.degrees));
}
