use citydrive_common::VehiclePose;
use citydrive_input::ControlState;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, VehicleConfig};

/// Kinematic state of the single vehicle. These four fields are the whole
/// state: stepping a restored copy gives the same result as the live one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: DVec3,
    /// Yaw in radians, 0 = facing +z. Unbounded.
    pub heading: f64,
    /// World units per tick; negative while reversing.
    pub speed: f64,
    /// Normalized steering in [-1, 1], positive = left.
    pub steering: f64,
}

impl VehicleState {
    /// Session start: parked at the origin, wheels resting on the ground plane.
    pub const INITIAL: VehicleState = VehicleState {
        position: DVec3::new(0.0, 0.5, 0.0),
        heading: 0.0,
        speed: 0.0,
        steering: 0.0,
    };

    pub fn pose(&self) -> VehiclePose {
        VehiclePose {
            position: self.position,
            heading: self.heading,
        }
    }

    /// Unit vector the vehicle drives along.
    pub fn direction(&self) -> DVec3 {
        DVec3::new(self.heading.sin(), 0.0, self.heading.cos())
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.heading.is_finite()
            && self.speed.is_finite()
            && self.steering.is_finite()
    }

    /// FNV-1a over the bit patterns of every field. Equal hashes mean
    /// bit-identical states, which is what replay comparison needs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |v: f64| {
            for b in v.to_le_bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(self.position.x);
        mix(self.position.y);
        mix(self.position.z);
        mix(self.heading);
        mix(self.speed);
        mix(self.steering);
        h
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Discrete-time driving model for one vehicle.
///
/// Stateless apart from its validated constants; `step` is a pure function of
/// the control snapshot and the incoming state.
#[derive(Debug, Clone)]
pub struct VehicleController {
    config: VehicleConfig,
}

impl VehicleController {
    /// Validate the constants once; a controller never runs with bad tuning.
    pub fn new(config: VehicleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Advance one tick.
    ///
    /// The tick moves the vehicle with the speed, steering and heading it
    /// started with, then applies the control input to speed and steering
    /// for the next tick.
    pub fn step(&self, control: ControlState, state: &VehicleState) -> VehicleState {
        let c = &self.config;

        let mut heading = state.heading;
        if state.speed.abs() > c.steering_speed_threshold {
            heading += state.steering * (state.speed / c.max_speed) * c.steering_to_heading_gain;
        }

        let mut position = state.position;
        position.x += state.heading.sin() * state.speed;
        position.z += state.heading.cos() * state.speed;

        VehicleState {
            position,
            heading,
            speed: self.next_speed(control, state.speed),
            steering: self.next_steering(control, state.steering),
        }
    }

    fn next_speed(&self, control: ControlState, speed: f64) -> f64 {
        let c = &self.config;
        if control.forward {
            let next = (speed + c.acceleration).min(c.max_speed);
            approach_limit(next, c.max_speed, c.acceleration)
        } else if control.backward {
            let next = (speed - c.acceleration).max(c.min_speed());
            approach_limit(next, c.min_speed(), c.acceleration)
        } else {
            approach_zero(speed, c.deceleration)
        }
    }

    fn next_steering(&self, control: ControlState, steering: f64) -> f64 {
        let c = &self.config;
        if control.left {
            let rate = if steering < 0.0 {
                c.steering_rate_boosted
            } else {
                c.steering_rate
            };
            (steering + rate).min(1.0)
        } else if control.right {
            let rate = if steering > 0.0 {
                c.steering_rate_boosted
            } else {
                c.steering_rate
            };
            (steering - rate).max(-1.0)
        } else {
            approach_zero(steering, c.steering_return_rate)
        }
    }
}

impl Default for VehicleController {
    fn default() -> Self {
        Self {
            config: VehicleConfig::default(),
        }
    }
}

/// Land on `limit` exactly when the remaining gap is rounding error from
/// accumulating `step`.
fn approach_limit(value: f64, limit: f64, step: f64) -> f64 {
    if (limit - value).abs() <= step * 1e-9 {
        limit
    } else {
        value
    }
}

/// Move `value` toward zero by `rate`, landing on exactly zero once within one step.
fn approach_zero(value: f64, rate: f64) -> f64 {
    if value.abs() <= rate {
        0.0
    } else {
        value - rate * value.signum()
    }
}
