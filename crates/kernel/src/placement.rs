//! Seeded random layouts. Callers own the generator so runs are reproducible.

use densim_common::CanvasSize;
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use crate::density::CUBE_SCALE;

/// `count` positions uniformly inside the cube `[-bound/2, bound/2]^3`.
pub fn random_cube_positions<R: Rng + ?Sized>(rng: &mut R, count: usize, bound: f32) -> Vec<Vec3> {
    let half = bound / 2.0;
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.random::<f32>() * bound - half,
                rng.random::<f32>() * bound - half,
                rng.random::<f32>() * bound - half,
            )
        })
        .collect()
}

/// One scaled cube transform per position.
pub fn cube_transforms(positions: &[Vec3]) -> Vec<Mat4> {
    positions
        .iter()
        .map(|p| Mat4::from_translation(*p) * Mat4::from_scale(Vec3::splat(CUBE_SCALE)))
        .collect()
}

/// `count` pixel positions uniformly inside the canvas.
pub fn random_pixel_points<R: Rng + ?Sized>(rng: &mut R, canvas: CanvasSize, count: usize) -> Vec<Vec2> {
    let size = canvas.as_vec2();
    (0..count)
        .map(|_| Vec2::new(rng.random::<f32>() * size.x, rng.random::<f32>() * size.y))
        .collect()
}
