use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI, TAU};

use citydrive_common::VehiclePose;
use glam::{Mat4, Quat, Vec3};

/// Convert a `0xRRGGBB` literal to linear-ish RGBA in [0, 1].
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

const PALETTE: [u32; 5] = [0x2b2d42, 0x8d99ae, 0x457b9d, 0xe63946, 0x1d3557];
const GROUND: u32 = 0x8d99ae;
const CAR_BODY: u32 = 0xe63946;
const CAR_CABIN: u32 = 0x457b9d;
const WHEEL: u32 = 0x2a2a2a;

/// What a box belongs to; lets backends and tools filter the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneLayer {
    Ground,
    Building,
    Landmark,
    Ramp,
    Vehicle,
}

/// A unit cube placed by `model` and tinted by `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBox {
    pub model: Mat4,
    pub color: [f32; 4],
    pub layer: SceneLayer,
}

impl SceneBox {
    fn new(model: Mat4, color: u32, layer: SceneLayer) -> Self {
        Self {
            model,
            color: rgb(color),
            layer,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }

    /// Lowest world-space y over the eight cube corners.
    pub fn min_y(&self) -> f32 {
        let mut min = f32::INFINITY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            );
            min = min.min(self.model.transform_point3(corner).y);
        }
        min
    }
}

/// The static city: ground slab, rings of buildings, a central tower and ramps.
#[derive(Debug, Clone)]
pub struct CityScene {
    boxes: Vec<SceneBox>,
    /// Edge length of the square ground plane.
    pub ground_size: f32,
}

impl CityScene {
    pub fn generate() -> Self {
        let ground_size = 100.0;
        let mut boxes = Vec::new();

        // Thin slab whose top face is the y = 0 driving plane.
        boxes.push(SceneBox::new(
            Mat4::from_scale_rotation_translation(
                Vec3::new(ground_size, 0.02, ground_size),
                Quat::IDENTITY,
                Vec3::new(0.0, -0.01, 0.0),
            ),
            GROUND,
            SceneLayer::Ground,
        ));

        for i in 0..20u32 {
            let angle = i as f32 / 20.0 * TAU;
            let radius = 15.0 + (i % 3) as f32 * 5.0;
            let size = Vec3::new(
                2.0 + (i % 3) as f32,
                3.0 + (i % 5) as f32 * 2.0,
                2.0 + ((i + 1) % 3) as f32,
            );
            boxes.push(upright(angle, radius, size, PALETTE[(i % 5) as usize], SceneLayer::Building));
        }

        boxes.push(SceneBox::new(
            Mat4::from_scale_rotation_translation(
                Vec3::new(3.0, 20.0, 3.0),
                Quat::IDENTITY,
                Vec3::new(0.0, 10.0, 0.0),
            ),
            0x1d3557,
            SceneLayer::Landmark,
        ));

        for i in 0..40u32 {
            let angle = i as f32 / 40.0 * TAU;
            let radius = 25.0 + (i % 5) as f32 * 3.0;
            let size = Vec3::new(1.5, 1.0 + (i % 3) as f32, 1.5);
            boxes.push(upright(angle, radius, size, GROUND, SceneLayer::Building));
        }

        for i in 0..8u32 {
            let angle = i as f32 / 8.0 * TAU;
            let position = Vec3::new(angle.sin() * 10.0, 0.0, angle.cos() * 10.0);
            let color = if i % 2 == 0 { 0xe63946 } else { 0x457b9d };
            boxes.extend(ramp(position, angle + PI, Vec3::ONE, color));
        }
        boxes.extend(ramp(Vec3::new(0.0, 0.0, 20.0), PI, Vec3::new(2.0, 1.5, 2.0), 0x1d3557));
        boxes.extend(ramp(Vec3::new(-20.0, 0.0, 0.0), FRAC_PI_2, Vec3::splat(2.0), 0xe63946));
        boxes.extend(ramp(Vec3::new(20.0, 0.0, 0.0), -FRAC_PI_2, Vec3::new(2.0, 1.8, 2.0), 0x457b9d));

        tracing::debug!(boxes = boxes.len(), "city scene generated");
        Self { boxes, ground_size }
    }

    pub fn boxes(&self) -> &[SceneBox] {
        &self.boxes
    }

    pub fn count(&self, layer: SceneLayer) -> usize {
        self.boxes.iter().filter(|b| b.layer == layer).count()
    }
}

/// Axis-aligned block on a ring, resting on the ground.
fn upright(angle: f32, radius: f32, size: Vec3, color: u32, layer: SceneLayer) -> SceneBox {
    let center = Vec3::new(angle.sin() * radius, size.y / 2.0, angle.cos() * radius);
    SceneBox::new(
        Mat4::from_scale_rotation_translation(size, Quat::IDENTITY, center),
        color,
        layer,
    )
}

/// Wedge ramp: a flat base slab plus a slab tilted up by 30 degrees.
fn ramp(position: Vec3, yaw: f32, scale: Vec3, color: u32) -> [SceneBox; 2] {
    let group = Mat4::from_scale_rotation_translation(scale, Quat::from_rotation_y(yaw), position);
    let base = group
        * Mat4::from_translation(Vec3::new(0.0, 0.05, 0.0))
        * Mat4::from_scale(Vec3::new(3.0, 0.1, 4.0));
    let slope = group
        * Mat4::from_translation(Vec3::new(0.0, 0.75, 1.0))
        * Mat4::from_rotation_x(-FRAC_PI_6)
        * Mat4::from_scale(Vec3::new(3.0, 0.1, 3.0));
    [
        SceneBox::new(base, color, SceneLayer::Ramp),
        SceneBox::new(slope, color, SceneLayer::Ramp),
    ]
}

/// Boxes making up the car at `pose`: body, cabin and four wheels.
pub fn car_boxes(pose: &VehiclePose) -> Vec<SceneBox> {
    let root = pose.model_matrix();
    let part = |offset: Vec3, size: Vec3, color: u32| {
        SceneBox::new(
            root * Mat4::from_translation(offset) * Mat4::from_scale(size),
            color,
            SceneLayer::Vehicle,
        )
    };
    let mut parts = vec![
        part(Vec3::ZERO, Vec3::new(1.5, 0.5, 3.0), CAR_BODY),
        part(Vec3::new(0.0, 0.5, -0.2), Vec3::new(1.2, 0.5, 1.5), CAR_CABIN),
    ];
    for (x, z) in [(-0.8, 0.7), (0.8, 0.7), (-0.8, -0.7), (0.8, -0.7)] {
        parts.push(part(Vec3::new(x, -0.25, z), Vec3::new(0.2, 0.6, 0.6), WHEEL));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn layer_counts() {
        let scene = CityScene::generate();
        assert_eq!(scene.count(SceneLayer::Ground), 1);
        assert_eq!(scene.count(SceneLayer::Building), 60);
        assert_eq!(scene.count(SceneLayer::Landmark), 1);
        assert_eq!(scene.count(SceneLayer::Ramp), 22);
        assert_eq!(scene.boxes().len(), 84);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = CityScene::generate();
        let b = CityScene::generate();
        assert_eq!(a.boxes(), b.boxes());
    }

    #[test]
    fn buildings_rest_on_ground() {
        let scene = CityScene::generate();
        for b in scene.boxes() {
            if matches!(b.layer, SceneLayer::Building | SceneLayer::Landmark) {
                assert!(b.min_y().abs() < 1e-4, "building floating at {}", b.min_y());
            }
        }
    }

    #[test]
    fn first_building_on_inner_ring() {
        let scene = CityScene::generate();
        let first = scene
            .boxes()
            .iter()
            .find(|b| b.layer == SceneLayer::Building)
            .unwrap();
        // i = 0: angle 0, radius 15, height 3.
        assert!((first.center() - Vec3::new(0.0, 1.5, 15.0)).length() < 1e-4);
        assert_eq!(first.color, rgb(0x2b2d42));
    }

    #[test]
    fn ramps_never_sink_below_ground() {
        let scene = CityScene::generate();
        for b in scene.boxes().iter().filter(|b| b.layer == SceneLayer::Ramp) {
            assert!(b.min_y() > -0.5);
        }
    }

    #[test]
    fn rgb_decodes_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0x00ff00)[1], 1.0);
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn car_follows_pose() {
        let pose = VehiclePose {
            position: DVec3::new(4.0, 0.5, -3.0),
            heading: 0.3,
        };
        let parts = car_boxes(&pose);
        assert_eq!(parts.len(), 6);
        assert!((parts[0].center() - Vec3::new(4.0, 0.5, -3.0)).length() < 1e-5);
        // Wheels reach just through the ground plane.
        for wheel in &parts[2..] {
            let bottom = wheel.min_y();
            assert!(bottom <= 0.0 && bottom > -0.1, "wheel bottom at {bottom}");
        }
    }
}
