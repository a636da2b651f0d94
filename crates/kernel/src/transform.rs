//! Column-major 4x4 matrix builders and the per-entity transform.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Number of floats in a flattened 4x4 matrix.
pub const MATRIX_FLOATS: usize = 16;

pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

pub fn translation(v: Vec3) -> Mat4 {
    Mat4::from_translation(v)
}

/// Right-handed perspective projection with a `[0, 1]` depth range.
pub fn perspective(fovy_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fovy_radians, aspect, near, far)
}

/// Rotation about X.
pub fn pitch(radians: f32) -> Mat4 {
    Mat4::from_rotation_x(radians)
}

/// Rotation about Y.
pub fn yaw(radians: f32) -> Mat4 {
    Mat4::from_rotation_y(radians)
}

/// Rotation about Z.
pub fn roll(radians: f32) -> Mat4 {
    Mat4::from_rotation_z(radians)
}

/// Rotate about `pivot`: move the pivot to the origin, apply yaw, then pitch,
/// then roll, and move back.
///
/// With column vectors the first applied operation is the rightmost operand,
/// so the product reads `T(pivot) * roll * pitch * yaw * T(-pivot)`.
pub fn euler_about(pivot: Vec3, pitch_rad: f32, yaw_rad: f32, roll_rad: f32) -> Mat4 {
    translation(pivot) * roll(roll_rad) * pitch(pitch_rad) * yaw(yaw_rad) * translation(-pivot)
}

/// Horizontal line in the y = 0 plane, offset along Z.
pub fn y0_plane_horizontal_line(z: f32) -> Mat4 {
    translation(Vec3::new(0.0, 0.0, z))
}

/// Vertical line in the y = 0 plane, offset along X.
pub fn y0_plane_vertical_line(x: f32) -> Mat4 {
    translation(Vec3::new(x, 0.0, 0.0))
}

/// Horizontal line in the z = 0 plane, offset along Y.
pub fn z0_plane_horizontal_line(y: f32) -> Mat4 {
    translation(Vec3::new(0.0, y, 0.0))
}

/// Write `matrices` into `out` in index order, 16 floats each.
///
/// `out` must already hold exactly `matrices.len() * 16` floats.
pub fn flatten_into(matrices: &[Mat4], out: &mut [f32]) {
    debug_assert_eq!(out.len(), matrices.len() * MATRIX_FLOATS);
    for (chunk, m) in out.chunks_exact_mut(MATRIX_FLOATS).zip(matrices) {
        chunk.copy_from_slice(&m.to_cols_array());
    }
}

/// The transform owned by a single entity.
///
/// Defaults to identity. The pivot is the point `set_eulers` rotates about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    matrix: Mat4,
    pivot: Vec3,
}

impl Default for EntityTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            pivot: Vec3::ZERO,
        }
    }
}

impl EntityTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pivot(pivot: Vec3) -> Self {
        Self {
            pivot,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// Replace the transform with a rotation about the pivot (radians).
    pub fn set_eulers(&mut self, pitch_rad: f32, yaw_rad: f32, roll_rad: f32) {
        self.matrix = euler_about(self.pivot, pitch_rad, yaw_rad, roll_rad);
    }

    /// Right-multiply by a translation (moves along the entity's local axes).
    pub fn set_position(&mut self, v: Vec3) {
        self.matrix *= translation(v);
    }

    /// Right-multiply by a non-uniform scale. A later `set_eulers` drops it.
    pub fn set_scale(&mut self, v: Vec3) {
        self.matrix *= Mat4::from_scale(v);
    }

    pub fn to_cols_array(&self) -> [f32; MATRIX_FLOATS] {
        self.matrix.to_cols_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn translation_is_stored_in_last_column() {
        let m = translation(Vec3::new(1.0, 2.0, 3.0));
        let cols = m.to_cols_array();
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let p = perspective(std::f32::consts::FRAC_PI_4, 800.0 / 600.0, 0.1, 10.0);
        let clip = p * glam::Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
        let clip = p * glam::Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn yaw_is_applied_before_pitch() {
        // yaw 90 sends +X to -Z, pitch 90 then sends -Z to +Y
        let m = euler_about(Vec3::ZERO, FRAC_PI_2, FRAC_PI_2, 0.0);
        let p = m.transform_point3(Vec3::X);
        assert!(approx(p, Vec3::Y), "{p}");
        // pitch first leaves +X alone, so the opposite order stops at -Z
        let q = (yaw(FRAC_PI_2) * pitch(FRAC_PI_2)).transform_point3(Vec3::X);
        assert!(approx(q, -Vec3::Z), "{q}");
    }

    #[test]
    fn euler_rotation_keeps_pivot_fixed() {
        let pivot = Vec3::new(1.0, 2.0, -3.0);
        let mut t = EntityTransform::with_pivot(pivot);
        t.set_eulers(0.3, 1.1, -0.7);
        assert!(approx(t.matrix().transform_point3(pivot), pivot));
    }

    #[test]
    fn set_eulers_replaces_previous_rotation() {
        let mut t = EntityTransform::new();
        t.set_eulers(1.0, 0.0, 0.0);
        t.set_eulers(0.0, 0.0, 0.0);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn set_position_right_multiplies() {
        let mut t = EntityTransform::new();
        t.set_eulers(0.0, FRAC_PI_2, 0.0);
        t.set_position(Vec3::X);
        // local +X is world -Z after a 90 degree yaw
        let origin = t.matrix().transform_point3(Vec3::ZERO);
        assert!(approx(origin, Vec3::new(0.0, 0.0, -1.0)), "{origin}");
    }

    #[test]
    fn set_scale_stretches_local_axes() {
        let mut t = EntityTransform::new();
        t.set_scale(Vec3::new(1.5, 1.0, 1.0));
        assert!(approx(t.matrix().transform_point3(Vec3::ONE), Vec3::new(1.5, 1.0, 1.0)));
        t.set_eulers(0.0, 0.0, 0.0);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn line_placements_offset_one_axis() {
        assert_eq!(y0_plane_horizontal_line(0.4).w_axis.z, 0.4);
        assert_eq!(y0_plane_vertical_line(-0.2).w_axis.x, -0.2);
        assert_eq!(z0_plane_horizontal_line(1.0).w_axis.y, 1.0);
    }

    #[test]
    fn flatten_writes_in_index_order() {
        let ms = [identity(), translation(Vec3::new(5.0, 6.0, 7.0))];
        let mut out = vec![0.0; 32];
        flatten_into(&ms, &mut out);
        assert_eq!(out[0], 1.0);
        assert_eq!(&out[28..31], &[5.0, 6.0, 7.0]);
    }
}
