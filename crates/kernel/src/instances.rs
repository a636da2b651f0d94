use glam::{Mat4, Vec3, Vec4};

use crate::KernelError;
use crate::transform::{MATRIX_FLOATS, flatten_into};

/// Number of floats per RGBA color.
pub const COLOR_FLOATS: usize = 4;

/// A fixed-size group of instances sharing one mesh.
///
/// Holds `N` transforms, `N` velocities (zero at construction) and optionally
/// `N` colors, plus flat host mirrors of the transforms and colors that are
/// uploaded verbatim to the GPU. `N` never changes after construction.
#[derive(Debug, Clone)]
pub struct InstanceGroup {
    transforms: Vec<Mat4>,
    velocities: Vec<Vec3>,
    colors: Option<Vec<Vec4>>,
    transform_mirror: Vec<f32>,
    color_mirror: Vec<f32>,
}

impl InstanceGroup {
    pub fn new(transforms: Vec<Mat4>) -> Result<Self, KernelError> {
        if transforms.is_empty() {
            return Err(KernelError::EmptyGroup);
        }
        let n = transforms.len();
        let mut group = Self {
            transforms,
            velocities: vec![Vec3::ZERO; n],
            colors: None,
            transform_mirror: vec![0.0; n * MATRIX_FLOATS],
            color_mirror: Vec::new(),
        };
        group.refresh_transforms();
        Ok(group)
    }

    pub fn with_colors(transforms: Vec<Mat4>, colors: Vec<Vec4>) -> Result<Self, KernelError> {
        let mut group = Self::new(transforms)?;
        group.set_colors(colors)?;
        Ok(group)
    }

    /// Attach or replace the per-instance colors.
    pub fn set_colors(&mut self, colors: Vec<Vec4>) -> Result<(), KernelError> {
        if colors.len() != self.len() {
            return Err(KernelError::LengthMismatch {
                what: "colors",
                expected: self.len(),
                actual: colors.len(),
            });
        }
        self.color_mirror = colors.iter().flat_map(|c| c.to_array()).collect();
        self.colors = Some(colors);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> Option<&[Vec4]> {
        self.colors.as_deref()
    }

    /// Transforms and velocities together, for in-place integration.
    ///
    /// Slices, so the length can't change; call `refresh_transforms` after.
    pub fn states_mut(&mut self) -> (&mut [Mat4], &mut [Vec3]) {
        (&mut self.transforms, &mut self.velocities)
    }

    /// Re-flatten every transform into the mirror, in index order.
    pub fn refresh_transforms(&mut self) {
        flatten_into(&self.transforms, &mut self.transform_mirror);
    }

    /// Flat transform mirror, 16 floats per instance.
    pub fn transform_mirror(&self) -> &[f32] {
        &self.transform_mirror
    }

    /// Flat color mirror, 4 floats per instance. Empty when the group has no colors.
    pub fn color_mirror(&self) -> &[f32] {
        &self.color_mirror
    }
}
