use glam::{DVec3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Where the vehicle is and which way it faces, as handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    pub position: DVec3,
    /// Yaw in radians, 0 = facing +z.
    pub heading: f64,
}

impl VehiclePose {
    /// Model matrix for the vehicle body (yaw about +Y, then translate).
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(self.heading as f32),
            self.position.as_vec3(),
        )
    }
}

/// Viewpoint transform for the chase camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: DVec3,
    pub look_at: DVec3,
}

impl CameraPose {
    /// Unit vector from the eye toward the look target.
    /// Falls back to +z when the eye sits on the target.
    pub fn forward(&self) -> Vec3 {
        let dir = (self.look_at - self.position).as_vec3();
        if dir.length_squared() > f32::EPSILON {
            dir.normalize()
        } else {
            Vec3::Z
        }
    }
}

/// Everything the rendering collaborator needs for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub tick: u64,
    pub vehicle: VehiclePose,
    pub camera: CameraPose,
    /// Vehicle speed in world units per tick.
    pub speed: f64,
    /// Normalized steering input in [-1, 1].
    pub steering: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matrix_places_vehicle() {
        let pose = VehiclePose {
            position: DVec3::new(1.0, 0.5, -2.0),
            heading: 0.0,
        };
        let origin = pose.model_matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 0.5, -2.0)).length() < 1e-6);
    }

    #[test]
    fn heading_rotates_forward_axis() {
        let pose = VehiclePose {
            position: DVec3::ZERO,
            heading: std::f64::consts::FRAC_PI_2,
        };
        // Heading pi/2 turns +z toward +x.
        let fwd = pose.model_matrix().transform_vector3(Vec3::Z);
        assert!((fwd - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn camera_forward_points_at_target() {
        let cam = CameraPose {
            position: DVec3::new(0.0, 3.0, -5.0),
            look_at: DVec3::new(0.0, 3.0, 0.0),
        };
        assert!((cam.forward() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn camera_forward_degenerate_is_finite() {
        let cam = CameraPose {
            position: DVec3::ONE,
            look_at: DVec3::ONE,
        };
        assert_eq!(cam.forward(), Vec3::Z);
    }
}
