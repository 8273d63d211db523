//! Driving kernel: vehicle kinematics, chase camera, fixed-timestep session.
//!
//! # Invariants
//! - `VehicleController::step` is pure with respect to its inputs.
//! - Speed stays within `[-max_speed * reverse_speed_factor, max_speed]`,
//!   steering within `[-1, 1]`, and the vehicle never leaves its ground height.
//! - Constants are validated once when a controller or session is created.
//! - Simulation ticks are fixed-size and decoupled from render frame rate.

pub mod camera;
pub mod config;
pub mod log;
pub mod session;
pub mod vehicle;

pub use camera::{CameraRig, CameraState, follow_camera};
pub use config::{ConfigError, DriveConfig, VehicleConfig};
pub use log::{DriveLog, ScriptError, parse_script};
pub use session::{Session, SessionSummary, TickDriver};
pub use vehicle::{VehicleController, VehicleState};
