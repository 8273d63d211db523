//! Driving input: keyboard keys mapped to logical controls.
//!
//! # Invariants
//! - The simulation consumes `ControlState` snapshots, never raw key events.
//! - Held-key state is owned by an `InputSampler` instance; there is no global.

pub mod bindings;
pub mod control;
pub mod sampler;

pub use bindings::KeyBindings;
pub use control::{Control, ControlState};
pub use sampler::InputSampler;
