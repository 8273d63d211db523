use citydrive_common::CameraPose;
use glam::{Mat4, Vec3};

/// Projection parameters for the chase camera. The eye and target come from
/// the simulation each frame; only the lens lives here.
#[derive(Debug, Clone, Copy)]
pub struct ChaseView {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ChaseView {
    fn default() -> Self {
        Self {
            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl ChaseView {
    pub fn with_fov_degrees(fov_degrees: f32) -> Self {
        Self {
            fov: fov_degrees.to_radians(),
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self, pose: &CameraPose) -> Mat4 {
        let eye = pose.position.as_vec3();
        Mat4::look_at_rh(eye, eye + pose.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, pose: &CameraPose) -> Mat4 {
        self.projection_matrix() * self.view_matrix(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec3, Vec4Swizzles};

    fn pose() -> CameraPose {
        CameraPose {
            position: DVec3::new(0.0, 3.5, -5.0),
            look_at: DVec3::new(0.0, 0.5, 0.0),
        }
    }

    #[test]
    fn default_view_is_finite() {
        let vp = ChaseView::default().view_projection(&pose());
        assert!(vp.is_finite());
    }

    #[test]
    fn look_target_projects_to_screen_center() {
        let vp = ChaseView::default().view_projection(&pose());
        let clip = vp * Vec3::new(0.0, 0.5, 0.0).extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut view = ChaseView::with_fov_degrees(60.0);
        view.set_viewport(1280, 720);
        assert!((view.aspect - 16.0 / 9.0).abs() < 1e-6);
        view.set_viewport(100, 0);
        assert!(view.aspect.is_finite());
    }
}
