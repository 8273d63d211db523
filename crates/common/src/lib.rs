//! Shared types for the driving demo.
//!
//! # Invariants
//! - Pose types carry no behaviour; the kernel produces them, renderers read them.

mod types;

pub use types::{CameraPose, FrameOutput, VehiclePose};
