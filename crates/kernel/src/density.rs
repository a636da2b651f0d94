//! Smoothed density and the discrete heat-map used to color density cubes.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::KernelError;
use crate::instances::InstanceGroup;

/// Upper bounds (exclusive) and colors of the density buckets, ascending.
/// A density at or above the last bound falls into [`TERMINAL_BUCKET`].
///
/// Alpha is 0 throughout; the surface is configured opaque, so it never
/// reaches the screen.
pub const DENSITY_BUCKETS: [(f32, [f32; 4]); 8] = [
    (0.1, [0.0, 0.0, 1.0, 0.0]),
    (0.4, [0.2, 0.2, 1.0, 0.0]),
    (0.8, [0.4, 0.4, 1.0, 0.0]),
    (1.2, [0.6, 0.6, 1.0, 0.0]),
    (1.6, [0.8, 0.6, 1.0, 0.0]),
    (2.0, [1.0, 0.4, 0.8, 0.0]),
    (2.4, [1.0, 0.2, 0.4, 0.0]),
    (2.8, [1.0, 0.1, 0.2, 0.0]),
];

/// Color for densities `>= 2.8`.
pub const TERMINAL_BUCKET: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// Total number of buckets, terminal included.
pub const BUCKET_COUNT: usize = DENSITY_BUCKETS.len() + 1;

/// Index of the first bucket whose bound is strictly greater than `density`.
pub fn bucket_index(density: f32) -> usize {
    DENSITY_BUCKETS
        .iter()
        .position(|(bound, _)| density < *bound)
        .unwrap_or(DENSITY_BUCKETS.len())
}

pub fn color_for_density(density: f32) -> Vec4 {
    let color = DENSITY_BUCKETS
        .get(bucket_index(density))
        .map_or(TERMINAL_BUCKET, |(_, c)| *c);
    Vec4::from_array(color)
}

/// Radially symmetric falloff `max(0, r^2 - d^2)^3 / (pi r^8 / 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingKernel {
    pub radius: f32,
    pub mass: f32,
}

impl Default for SmoothingKernel {
    fn default() -> Self {
        Self {
            radius: 5.0,
            mass: 1.0,
        }
    }
}

impl SmoothingKernel {
    pub fn volume(&self) -> f32 {
        std::f32::consts::PI * self.radius.powi(8) / 4.0
    }

    pub fn influence(&self, distance: f32) -> f32 {
        let value = (self.radius * self.radius - distance * distance).max(0.0);
        value.powi(3) / self.volume()
    }

    /// Sum of `mass * influence` over every reference position.
    pub fn density(&self, sample: Vec3, positions: &[Vec3]) -> f32 {
        positions
            .iter()
            .map(|p| self.mass * self.influence(p.distance(sample)))
            .sum()
    }
}

/// Scale applied to every cube instance.
pub const CUBE_SCALE: f32 = 0.1;

/// A static cubic grid of cubes, each colored once by the density at its position.
///
/// Colors are computed at construction and never change. No physics runs on
/// this group.
#[derive(Debug, Clone)]
pub struct CubeDensityInstances {
    group: InstanceGroup,
    densities: Vec<f32>,
}

impl CubeDensityInstances {
    /// Place `spacing^3` cubes on a unit grid centered on the origin and color
    /// them from the density of `references`.
    ///
    /// Density is sampled at the unshifted grid index `(x, y, z)`, while the
    /// cube itself is drawn at `(x, y, z) - spacing / 2`.
    pub fn new(spacing: u32, references: &[Vec3], kernel: &SmoothingKernel) -> Result<Self, KernelError> {
        let half = Vec3::splat(spacing as f32 / 2.0);
        let scale = Mat4::from_scale(Vec3::splat(CUBE_SCALE));
        let count = (spacing as usize).pow(3);
        let mut transforms = Vec::with_capacity(count);
        let mut densities = Vec::with_capacity(count);
        for x in 0..spacing {
            for y in 0..spacing {
                for z in 0..spacing {
                    let cell = Vec3::new(x as f32, y as f32, z as f32);
                    transforms.push(Mat4::from_translation(cell - half) * scale);
                    densities.push(kernel.density(cell, references));
                }
            }
        }
        let colors = densities.iter().map(|d| color_for_density(*d)).collect();

        tracing::debug!(
            instances = densities.len(),
            references = references.len(),
            "density cube colors computed"
        );
        Ok(Self {
            group: InstanceGroup::with_colors(transforms, colors)?,
            densities,
        })
    }

    pub fn group(&self) -> &InstanceGroup {
        &self.group
    }

    /// Density sampled for each instance, in index order.
    pub fn densities(&self) -> &[f32] {
        &self.densities
    }

    /// Instance count per bucket.
    pub fn histogram(&self) -> [usize; BUCKET_COUNT] {
        let mut counts = [0; BUCKET_COUNT];
        for d in &self.densities {
            counts[bucket_index(*d)] += 1;
        }
        counts
    }
}
