use std::time::Duration;

use citydrive_common::FrameOutput;
use citydrive_input::InputSampler;

use crate::camera::{CameraRig, CameraState};
use crate::config::{ConfigError, DriveConfig};
use crate::log::DriveLog;
use crate::vehicle::{VehicleController, VehicleState};

/// Fixed-timestep accumulator.
///
/// Frame time only decides how many ticks run; each tick is the same size,
/// so vehicle speed does not depend on the display refresh rate.
#[derive(Debug, Clone)]
pub struct TickDriver {
    interval: Duration,
    accumulator: Duration,
    max_ticks_per_frame: u32,
}

impl TickDriver {
    pub fn new(interval: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time carried over toward the next tick.
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Add `elapsed` and return the number of ticks now due.
    ///
    /// When more than `max_ticks_per_frame` ticks are owed (after a stall),
    /// the excess whole ticks are dropped instead of replayed.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        self.accumulator += elapsed;
        let interval = self.interval.as_nanos();
        let owed = self.accumulator.as_nanos() / interval;
        let remainder = self.accumulator.as_nanos() % interval;
        let due = owed.min(self.max_ticks_per_frame as u128) as u32;
        if owed > due as u128 {
            tracing::debug!(dropped = (owed - due as u128) as u64, "tick backlog dropped");
        }
        self.accumulator = Duration::from_nanos(remainder as u64);
        due
    }
}

/// End-of-session report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub ticks: u64,
    /// Total path length driven, in world units.
    pub distance: f64,
    pub final_state: VehicleState,
}

/// One driving session: the single owner of input, vehicle and camera state.
///
/// Every tick runs sample -> step -> follow in that order. Dropping or ending
/// the session drops its `InputSampler`, which releases all held keys.
#[derive(Debug)]
pub struct Session {
    sampler: InputSampler,
    controller: VehicleController,
    rig: CameraRig,
    driver: TickDriver,
    vehicle: VehicleState,
    camera: CameraState,
    log: DriveLog,
    record_log: bool,
    tick: u64,
    distance: f64,
}

impl Session {
    /// Validate the configuration and start at the initial vehicle state.
    pub fn start(config: DriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let DriveConfig {
            vehicle,
            camera,
            bindings,
            max_catch_up_ticks,
            record_log,
        } = config;
        let interval = Duration::from_millis(vehicle.tick_interval_ms);
        let controller = VehicleController::new(vehicle)?;
        let initial = VehicleState::INITIAL;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "session started");
        Ok(Self {
            sampler: InputSampler::new(bindings),
            controller,
            camera: camera.settled(&initial),
            rig: camera,
            driver: TickDriver::new(interval, max_catch_up_ticks),
            vehicle: initial,
            log: DriveLog::new(initial),
            record_log,
            tick: 0,
            distance: 0.0,
        })
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.sampler.on_key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.sampler.on_key_up(key)
    }

    pub fn release_keys(&mut self) {
        self.sampler.release_all();
    }

    pub fn sampler(&self) -> &InputSampler {
        &self.sampler
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn controller(&self) -> &VehicleController {
        &self.controller
    }

    pub fn drive_log(&self) -> &DriveLog {
        &self.log
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Run exactly one tick with the currently held controls.
    pub fn tick(&mut self) -> FrameOutput {
        let control = self.sampler.sample();
        if self.record_log {
            self.log.record(control);
        }
        let next = self.controller.step(control, &self.vehicle);
        self.distance += next.position.distance(self.vehicle.position);
        self.vehicle = next;
        self.camera = self.rig.follow(&self.vehicle, self.camera.position);
        self.tick += 1;
        tracing::trace!(
            tick = self.tick,
            speed = self.vehicle.speed,
            steering = self.vehicle.steering,
            heading = self.vehicle.heading,
            "tick"
        );
        self.output()
    }

    /// Account for `elapsed` frame time, running every tick that is due.
    /// Returns the latest output even when no tick ran.
    pub fn frame(&mut self, elapsed: Duration) -> FrameOutput {
        let _span = tracing::trace_span!("frame").entered();
        let due = self.driver.advance(elapsed);
        for _ in 0..due {
            self.tick();
        }
        self.output()
    }

    /// Current state in renderer form.
    pub fn output(&self) -> FrameOutput {
        FrameOutput {
            tick: self.tick,
            vehicle: self.vehicle.pose(),
            camera: self.camera.pose(),
            speed: self.vehicle.speed,
            steering: self.vehicle.steering,
        }
    }

    /// Put the vehicle back at the start; held keys stay held.
    pub fn reset(&mut self) {
        self.vehicle = VehicleState::INITIAL;
        self.camera = self.rig.settled(&self.vehicle);
        self.log.clear(self.vehicle);
        self.driver.reset();
        self.tick = 0;
        self.distance = 0.0;
        tracing::debug!("session reset");
    }

    /// Tear down the session and report what happened.
    pub fn end(self) -> SessionSummary {
        let summary = SessionSummary {
            ticks: self.tick,
            distance: self.distance,
            final_state: self.vehicle,
        };
        tracing::info!(
            ticks = summary.ticks,
            distance = summary.distance,
            "session ended"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VehicleConfig;

    fn session() -> Session {
        Session::start(DriveConfig::default()).unwrap()
    }

    #[test]
    fn start_rejects_invalid_config() {
        let config = DriveConfig {
            vehicle: VehicleConfig {
                acceleration: -1.0,
                ..VehicleConfig::default()
            },
            ..DriveConfig::default()
        };
        assert!(matches!(
            Session::start(config),
            Err(ConfigError::NotPositive {
                field: "acceleration",
                ..
            })
        ));
    }

    #[test]
    fn starts_parked_with_settled_camera() {
        let s = session();
        let out = s.output();
        assert_eq!(out.tick, 0);
        assert_eq!(*s.vehicle(), VehicleState::INITIAL);
        assert_eq!(out.camera.look_at, VehicleState::INITIAL.position);
        assert_eq!(out.camera.position, s.rig().desired_position(s.vehicle()));
    }

    #[test]
    fn tick_uses_held_keys() {
        let mut s = session();
        s.key_down("W");
        for _ in 0..20 {
            s.tick();
        }
        assert_eq!(s.vehicle().speed, 0.2);
        assert_eq!(s.tick_count(), 20);
        assert_eq!(s.drive_log().len(), 20);
        s.key_up("w");
        s.tick();
        assert!(s.vehicle().speed < 0.2);
    }

    #[test]
    fn tick_driver_counts_whole_intervals() {
        let mut d = TickDriver::new(Duration::from_millis(16), 8);
        assert_eq!(d.advance(Duration::from_millis(10)), 0);
        assert_eq!(d.advance(Duration::from_millis(10)), 1);
        assert_eq!(d.pending(), Duration::from_millis(4));
        assert_eq!(d.advance(Duration::from_millis(28)), 2);
        assert_eq!(d.pending(), Duration::ZERO);
    }

    #[test]
    fn tick_driver_caps_backlog() {
        let mut d = TickDriver::new(Duration::from_millis(16), 8);
        assert_eq!(d.advance(Duration::from_secs(1)), 8);
        assert!(d.pending() < Duration::from_millis(16));
    }

    #[test]
    fn simulation_independent_of_refresh_rate() {
        // One simulated second at 60 Hz and at 144 Hz (both ~integral ms).
        let mut slow = session();
        let mut fast = session();
        slow.key_down("w");
        fast.key_down("w");
        for _ in 0..60 {
            slow.frame(Duration::from_micros(16_667));
        }
        for _ in 0..144 {
            fast.frame(Duration::from_micros(6_944));
        }
        let diff = slow.tick_count() as i64 - fast.tick_count() as i64;
        assert!(diff.abs() <= 1, "tick counts {} vs {}", slow.tick_count(), fast.tick_count());
        assert_eq!(slow.tick_count(), 62);
    }

    #[test]
    fn frame_without_due_tick_keeps_state() {
        let mut s = session();
        s.key_down("w");
        let out = s.frame(Duration::from_millis(5));
        assert_eq!(out.tick, 0);
        assert_eq!(out.speed, 0.0);
    }

    #[test]
    fn camera_trails_vehicle() {
        let mut s = session();
        s.key_down("w");
        for _ in 0..200 {
            s.tick();
        }
        let out = s.output();
        assert!(out.camera.position.z < out.vehicle.position.z);
        assert_eq!(out.camera.look_at, out.vehicle.position);
    }

    #[test]
    fn session_log_replays() {
        let mut s = session();
        s.key_down("w");
        for _ in 0..30 {
            s.tick();
        }
        s.key_down("a");
        for _ in 0..50 {
            s.tick();
        }
        s.release_keys();
        for _ in 0..10 {
            s.tick();
        }
        let replayed = s.drive_log().replay(s.controller());
        assert_eq!(replayed.state_hash(), s.vehicle().state_hash());
    }

    #[test]
    fn unrecorded_session_keeps_log_empty() {
        let mut s = Session::start(DriveConfig {
            record_log: false,
            ..DriveConfig::default()
        })
        .unwrap();
        s.key_down("w");
        for _ in 0..100 {
            s.tick();
        }
        assert!(s.drive_log().is_empty());
        assert_eq!(s.tick_count(), 100);
        assert_eq!(s.vehicle().speed, 0.2);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut s = session();
        s.key_down("w");
        for _ in 0..10 {
            s.tick();
        }
        s.reset();
        assert_eq!(*s.vehicle(), VehicleState::INITIAL);
        assert_eq!(s.tick_count(), 0);
        assert!(s.drive_log().is_empty());
        // Keys survive a reset.
        assert!(s.sampler().sample().forward);
    }

    #[test]
    fn end_reports_summary() {
        let mut s = session();
        s.key_down("w");
        for _ in 0..20 {
            s.tick();
        }
        let summary = s.end();
        assert_eq!(summary.ticks, 20);
        assert!(summary.distance > 0.0);
        assert_eq!(summary.final_state.speed, 0.2);
    }
}
