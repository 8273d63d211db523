use citydrive_common::CameraPose;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, in_range, positive};
use crate::vehicle::VehicleState;

/// Chase camera placement for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: DVec3,
    pub look_at: DVec3,
}

impl CameraState {
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            look_at: self.look_at,
        }
    }
}

/// Rigid chase rig: `distance` behind the vehicle, `height` above it, rotated
/// with the heading. Position eases toward the rig by `smoothing` per tick;
/// the look target does not ease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRig {
    pub distance: f64,
    pub height: f64,
    /// Fraction of the remaining gap closed each tick, in (0, 1].
    pub smoothing: f64,
    /// Vertical field of view used by renderers.
    pub fov_degrees: f64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            height: 3.0,
            smoothing: 0.1,
            fov_degrees: 75.0,
        }
    }
}

impl CameraRig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("camera.distance", self.distance, 0.0, f64::MAX)?;
        in_range("camera.height", self.height, f64::MIN, f64::MAX)?;
        positive("camera.smoothing", self.smoothing)?;
        in_range("camera.smoothing", self.smoothing, 0.0, 1.0)?;
        in_range("camera.fov_degrees", self.fov_degrees, 1.0, 179.0)?;
        Ok(())
    }

    /// Where the rig wants the camera for this vehicle state.
    pub fn desired_position(&self, vehicle: &VehicleState) -> DVec3 {
        let offset = DVec3::new(
            -vehicle.heading.sin() * self.distance,
            self.height,
            -vehicle.heading.cos() * self.distance,
        );
        vehicle.position + offset
    }

    /// Camera already settled on the rig; used at session start.
    pub fn settled(&self, vehicle: &VehicleState) -> CameraState {
        CameraState {
            position: self.desired_position(vehicle),
            look_at: vehicle.position,
        }
    }

    /// Ease from `previous` toward the rig position.
    pub fn follow(&self, vehicle: &VehicleState, previous: DVec3) -> CameraState {
        let desired = self.desired_position(vehicle);
        CameraState {
            // Written as an offset so previous == desired is an exact fixed point.
            position: previous + (desired - previous) * self.smoothing,
            look_at: vehicle.position,
        }
    }
}

/// Follow with the default rig geometry (5 behind, 3 above) and the given smoothing.
pub fn follow_camera(vehicle: &VehicleState, previous: DVec3, smoothing: f64) -> CameraState {
    CameraRig {
        smoothing,
        ..CameraRig::default()
    }
    .follow(vehicle, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn at(x: f64, z: f64, heading: f64) -> VehicleState {
        VehicleState {
            position: DVec3::new(x, 0.5, z),
            heading,
            ..VehicleState::INITIAL
        }
    }

    #[test]
    fn desired_is_behind_and_above() {
        let rig = CameraRig::default();
        let d = rig.desired_position(&VehicleState::INITIAL);
        assert!((d - DVec3::new(0.0, 3.5, -5.0)).length() < 1e-12);

        // Facing +x: camera sits on -x.
        let d = rig.desired_position(&at(0.0, 0.0, FRAC_PI_2));
        assert!((d - DVec3::new(-5.0, 3.5, 0.0)).length() < 1e-12);
    }

    #[test]
    fn settled_camera_is_fixed_point() {
        let rig = CameraRig::default();
        let vehicle = at(3.25, -7.5, 0.83);
        let settled = rig.settled(&vehicle);
        let next = follow_camera(&vehicle, settled.position, 0.1);
        assert_eq!(next.position, settled.position);
    }

    #[test]
    fn follow_closes_gap_by_smoothing() {
        let vehicle = VehicleState::INITIAL;
        let previous = DVec3::new(10.0, 3.5, -5.0);
        let cam = follow_camera(&vehicle, previous, 0.1);
        assert!((cam.position - DVec3::new(9.0, 3.5, -5.0)).length() < 1e-12);
    }

    #[test]
    fn look_at_is_unsmoothed_vehicle_position() {
        let vehicle = at(4.0, 2.0, 1.0);
        let cam = follow_camera(&vehicle, DVec3::new(100.0, 0.0, 100.0), 0.1);
        assert_eq!(cam.look_at, vehicle.position);
    }

    #[test]
    fn repeated_follow_converges() {
        let rig = CameraRig::default();
        let vehicle = at(1.0, 1.0, 2.0);
        let mut pos = DVec3::new(-20.0, 10.0, 20.0);
        for _ in 0..400 {
            pos = rig.follow(&vehicle, pos).position;
        }
        assert!((pos - rig.desired_position(&vehicle)).length() < 1e-9);
    }

    #[test]
    fn smoothing_one_snaps() {
        let vehicle = at(2.0, 2.0, 0.0);
        let cam = follow_camera(&vehicle, DVec3::ZERO, 1.0);
        assert!((cam.position - DVec3::new(2.0, 3.5, -3.0)).length() < 1e-12);
    }

    #[test]
    fn rig_validation() {
        CameraRig::default().validate().unwrap();
        let bad = CameraRig {
            smoothing: 1.5,
            ..CameraRig::default()
        };
        assert!(bad.validate().is_err());
        let bad = CameraRig {
            fov_degrees: 0.0,
            ..CameraRig::default()
        };
        assert!(bad.validate().is_err());
        let bad = CameraRig {
            distance: f64::INFINITY,
            ..CameraRig::default()
        };
        assert!(bad.validate().is_err());
    }
}
