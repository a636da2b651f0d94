//! Mesh data producers: the static mesh table and `.obj` model import.
//!
//! Everything here is pure data. Meshes are flat `xyz` position lists (three
//! floats per vertex) with an optional `u16` triangle index list; the renderer
//! uploads them once and never mutates them.

mod mesh;
mod obj;

pub use mesh::{
    AXIS_HALF_LENGTH, AXIS_WIDTH, CUBE_MODEL_Z, CUBE_SIDE, cube_faces, x_axis_quad, y_axis_quad,
    z_axis_quad,
};
pub use obj::{ParsedObj, load_obj, parse_obj};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: vertex has {found} coordinates, expected at least 3")]
    ShortVertex { line: usize, found: usize },
    #[error("line {line}: invalid face index {token:?}")]
    InvalidIndex { line: usize, token: String },
    #[error("index {index} does not fit a 16-bit index buffer")]
    IndexOverflow { index: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: usize, vertex_count: usize },
}

/// A static triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    /// Flat `xyz` positions, three floats per vertex.
    pub positions: Vec<f32>,
    /// Triangle list indices. `None` means non-indexed drawing.
    pub indices: Option<Vec<u16>>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: None,
        }
    }

    pub fn indexed(name: impl Into<String>, positions: Vec<f32>, indices: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: Some(indices),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    pub fn index_count(&self) -> Option<u32> {
        self.indices.as_ref().map(|i| i.len() as u32)
    }
}
