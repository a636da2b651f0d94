use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::transform;

/// Camera with a position and three Euler angles in degrees.
///
/// The view matrix is derived, never edited directly: setters change the
/// position or angles and `update` recomputes the cached view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 4.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            view: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    pub fn set_eulers(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.pitch = pitch;
        self.yaw = yaw;
        self.roll = roll;
    }

    pub fn set_translation(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Camera-to-world transform: yaw, then pitch, then roll, then position.
    pub fn world_matrix(&self) -> Mat4 {
        transform::translation(self.position)
            * transform::yaw(self.yaw.to_radians())
            * transform::pitch(self.pitch.to_radians())
            * transform::roll(self.roll.to_radians())
    }

    /// Recompute the view matrix from position and angles.
    pub fn update(&mut self) {
        self.view = self.world_matrix().inverse();
    }

    /// The view matrix as of the last `update`.
    pub fn matrix(&self) -> Mat4 {
        self.view
    }

    /// Direction the camera looks along (its local -Z), from the current angles.
    pub fn forward(&self) -> Vec3 {
        self.world_matrix().transform_vector3(Vec3::NEG_Z).normalize()
    }
}

/// Perspective projection parameters and the matrix built from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fovy: std::f32::consts::FRAC_PI_4,
            aspect: 800.0 / 600.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        transform::perspective(self.fovy, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_on_positive_z() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 4.0));
        let origin_in_view = cam.matrix().transform_point3(Vec3::ZERO);
        assert!((origin_in_view - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-5);
    }

    #[test]
    fn view_is_stale_until_update() {
        let mut cam = Camera::default();
        let before = cam.matrix();
        cam.set_translation(Vec3::new(1.0, 0.0, 4.0));
        assert_eq!(cam.matrix(), before);
        cam.update();
        assert_ne!(cam.matrix(), before);
    }

    #[test]
    fn yaw_turns_forward_vector() {
        let mut cam = Camera::default();
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);
        cam.set_eulers(0.0, 90.0, 0.0);
        assert!((cam.forward() - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn view_inverts_world() {
        let mut cam = Camera::new(Vec3::new(0.5, -1.0, 3.0));
        cam.set_eulers(12.0, -30.0, 4.0);
        cam.update();
        let round_trip = cam.matrix() * cam.world_matrix();
        assert!(round_trip.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn projection_defaults() {
        let p = Projection::default();
        assert_eq!(p.near, 0.1);
        assert_eq!(p.far, 10.0);
        assert!(!p.matrix().col(0).x.is_nan());
    }
}
