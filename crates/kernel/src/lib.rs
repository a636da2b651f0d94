//! Simulation kernel: host-side state for every instance group, the camera,
//! and the numerical pieces (gravity integration, smoothing kernel).
//!
//! # Invariants
//! - Matrices are column-major with column-vector convention (glam); nothing
//!   here transposes before handing data to the GPU.
//! - Instance groups have a fixed length `N` chosen at construction. The
//!   transform, velocity and optional color sequences always share that length.
//! - Every host array that is mirrored to the GPU is kept flat (`&[f32]`) in
//!   index order, ready for a byte-exact upload.
//! - Nothing in this crate draws randomness from ambient sources; callers pass
//!   a seeded generator.

pub mod axis_lines;
pub mod camera;
pub mod density;
pub mod density_layer;
pub mod instances;
pub mod physics;
pub mod placement;
pub mod transform;

pub use axis_lines::AxisLines;
pub use camera::{Camera, Projection};
pub use density::{CubeDensityInstances, DENSITY_BUCKETS, SmoothingKernel};
pub use density_layer::{DensityLayer, POINTS_COUNT};
pub use instances::InstanceGroup;
pub use physics::{CubeInstances, FrameClock, GravityParams};
pub use transform::EntityTransform;

/// Errors from kernel construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("instance group must not be empty")]
    EmptyGroup,
    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}
