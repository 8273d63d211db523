use std::fmt::Write;

use citydrive_common::FrameOutput;

use crate::scene::{CityScene, SceneLayer, car_boxes};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the static scene and one frame of simulation output and
/// produces something; it never feeds back into the simulation.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &CityScene, frame: &FrameOutput) -> Self::Output;
}

/// Human-readable frame dump for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list scene box counts per layer.
    pub with_scene: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self) -> Self {
        self.with_scene = true;
        self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &CityScene, frame: &FrameOutput) -> String {
        let mut out = String::new();
        let v = frame.vehicle.position;
        let c = frame.camera.position;
        let t = frame.camera.look_at;
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "tick={} speed={:.3} steering={:+.2} heading={:.3}rad",
            frame.tick, frame.speed, frame.steering, frame.vehicle.heading
        );
        let _ = writeln!(out, "  car    pos=({:.2}, {:.2}, {:.2})", v.x, v.y, v.z);
        let _ = writeln!(
            out,
            "  camera pos=({:.2}, {:.2}, {:.2}) look_at=({:.2}, {:.2}, {:.2})",
            c.x, c.y, c.z, t.x, t.y, t.z
        );
        if self.with_scene {
            let _ = writeln!(
                out,
                "  scene  boxes={} buildings={} ramps={} car_parts={}",
                scene.boxes().len(),
                scene.count(SceneLayer::Building) + scene.count(SceneLayer::Landmark),
                scene.count(SceneLayer::Ramp),
                car_boxes(&frame.vehicle).len()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citydrive_common::{CameraPose, VehiclePose};
    use glam::DVec3;

    fn frame() -> FrameOutput {
        FrameOutput {
            tick: 7,
            vehicle: VehiclePose {
                position: DVec3::new(1.0, 0.5, 2.0),
                heading: 0.25,
            },
            camera: CameraPose {
                position: DVec3::new(0.0, 3.5, -3.0),
                look_at: DVec3::new(1.0, 0.5, 2.0),
            },
            speed: 0.12,
            steering: -0.5,
        }
    }

    #[test]
    fn text_contains_frame_fields() {
        let scene = CityScene::generate();
        let out = DebugTextRenderer::new().render(&scene, &frame());
        assert!(out.contains("tick=7"));
        assert!(out.contains("speed=0.120"));
        assert!(out.contains("steering=-0.50"));
        assert!(out.contains("pos=(1.00, 0.50, 2.00)"));
        assert!(!out.contains("scene"));
    }

    #[test]
    fn scene_summary_optional() {
        let scene = CityScene::generate();
        let out = DebugTextRenderer::new().with_scene().render(&scene, &frame());
        assert!(out.contains("boxes=84"));
        assert!(out.contains("buildings=61"));
        assert!(out.contains("car_parts=6"));
    }
}
