//! wgpu render backend for the driving demo.
//!
//! Draws the floor grid and every scene box (city plus car) as lit,
//! instanced unit cubes, viewed through the chase camera.
//!
//! # Invariants
//! - Renderer never mutates simulation state.
//! - One draw call for all boxes; the instance buffer is rewritten per frame.

mod camera;
mod gpu;
mod shaders;

pub use camera::ChaseView;
pub use gpu::WgpuRenderer;
