use densim_common::CanvasSize;
use glam::{Vec2, Vec4};

use crate::KernelError;

/// Point count the compute and point shaders are built for.
pub const POINTS_COUNT: usize = 300;

/// Map a pixel position to normalized device coordinates.
///
/// `((pixel - size / 2) / size) * 2` per axis: the canvas center maps to the
/// origin and the corners to `(+-1, +-1)`. Y keeps the pixel orientation
/// (down is positive).
pub fn pixel_to_ndc(canvas: CanvasSize, pixel: Vec2) -> Vec2 {
    let size = canvas.as_vec2();
    (pixel - size / 2.0) / size * 2.0
}

/// Fixed set of 2D points stored as `(x, y, 0, 0)` in NDC.
///
/// The layer only owns the initial layout and the flat host mirror. The
/// compute pass moves the points on the GPU; the host copy is never read back.
#[derive(Debug, Clone)]
pub struct DensityLayer {
    points: Vec<Vec4>,
    mirror: Vec<f32>,
}

impl DensityLayer {
    /// Build from pixel-space points. Exactly `expected` points are required.
    pub fn from_pixels(canvas: CanvasSize, pixels: &[Vec2], expected: usize) -> Result<Self, KernelError> {
        if pixels.len() != expected {
            return Err(KernelError::LengthMismatch {
                what: "density points",
                expected,
                actual: pixels.len(),
            });
        }
        let points = pixels
            .iter()
            .map(|p| {
                let ndc = pixel_to_ndc(canvas, *p);
                Vec4::new(ndc.x, ndc.y, 0.0, 0.0)
            })
            .collect();
        let mut layer = Self {
            points,
            mirror: Vec::new(),
        };
        layer.refresh_mirror();
        Ok(layer)
    }

    pub fn points(&self) -> &[Vec4] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Re-flatten the host points into the mirror.
    pub fn refresh_mirror(&mut self) {
        self.mirror.clear();
        self.mirror.extend(self.points.iter().flat_map(|p| p.to_array()));
    }

    /// Flat mirror, 4 floats per point.
    pub fn mirror(&self) -> &[f32] {
        &self.mirror
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: CanvasSize = CanvasSize::new(800, 600);

    #[test]
    fn center_maps_to_origin() {
        assert_eq!(pixel_to_ndc(CANVAS, Vec2::new(400.0, 300.0)), Vec2::ZERO);
    }

    #[test]
    fn corners_map_to_unit_square() {
        assert_eq!(pixel_to_ndc(CANVAS, Vec2::ZERO), Vec2::new(-1.0, -1.0));
        assert_eq!(pixel_to_ndc(CANVAS, Vec2::new(800.0, 600.0)), Vec2::new(1.0, 1.0));
        assert_eq!(pixel_to_ndc(CANVAS, Vec2::new(800.0, 0.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn mapping_is_invertible() {
        let p = Vec2::new(123.0, 456.0);
        let ndc = pixel_to_ndc(CANVAS, p);
        let back = (ndc / 2.0) * CANVAS.as_vec2() + CANVAS.as_vec2() / 2.0;
        assert!((back - p).length() < 1e-3);
    }

    #[test]
    fn layer_flattens_xy00() {
        let layer = DensityLayer::from_pixels(CANVAS, &[Vec2::new(400.0, 300.0), Vec2::ZERO], 2).unwrap();
        assert_eq!(layer.mirror(), &[0.0, 0.0, 0.0, 0.0, -1.0, -1.0, 0.0, 0.0]);
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let err = DensityLayer::from_pixels(CANVAS, &[Vec2::ZERO], POINTS_COUNT).unwrap_err();
        assert!(matches!(
            err,
            KernelError::LengthMismatch {
                expected: POINTS_COUNT,
                actual: 1,
                ..
            }
        ));
    }
}
