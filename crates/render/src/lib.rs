//! Rendering adapter: renderer-agnostic interface plus the static city scene.
//!
//! # Invariants
//! - Renderers never mutate simulation state; they read `FrameOutput` only.
//! - The scene layout is deterministic; generating it twice yields the same boxes.
//!
//! Everything drawable is a colored unit cube with a model matrix, so any
//! backend that can draw instanced boxes can draw the whole demo.

mod renderer;
mod scene;

pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{CityScene, SceneBox, SceneLayer, car_boxes, rgb};
