use std::path::Path;

use densim_common::{CanvasSize, Color};
use densim_kernel::{GravityParams, POINTS_COUNT, Projection, SmoothingKernel};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default maximum size of a uniform buffer binding.
pub const MAX_UNIFORM_BYTES: usize = 64 * 1024;

const MATRIX_BYTES: usize = 64;
const COLOR_BYTES: usize = 16;

/// Errors from loading or validating a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything that shapes a run. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub canvas: CanvasSize,
    /// Seed for cube placement and the initial density points.
    pub seed: u64,
    pub cube_count: usize,
    /// Cubes start inside `[-bound/2, bound/2]^3`.
    pub cube_bound: f32,
    /// Density grid edge length; the grid holds `spacing^3` cubes.
    pub density_spacing: u32,
    pub axis_line_count: usize,
    pub axis_line_spacing: f32,
    pub gravity: GravityParams,
    pub kernel: SmoothingKernel,
    /// Paint every falling cube this color. `None` keeps the mesh color.
    pub cube_color: Option<Color>,
    pub points_count: usize,
    pub camera_position: Vec3,
    pub projection: Projection,
    pub clear_color: Color,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            seed: 0,
            cube_count: 100,
            cube_bound: 4.0,
            density_spacing: 10,
            axis_line_count: 20,
            axis_line_spacing: 0.2,
            gravity: GravityParams::default(),
            kernel: SmoothingKernel::default(),
            cube_color: None,
            points_count: POINTS_COUNT,
            camera_position: Vec3::new(0.0, 0.0, 4.0),
            projection: Projection::default(),
            clear_color: Color::rgba(0.3, 0.3, 0.3, 1.0),
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded sim config");
        Ok(config)
    }

    pub fn density_cube_count(&self) -> usize {
        (self.density_spacing as usize).pow(3)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("canvas.width", self.canvas.width as usize),
            ("canvas.height", self.canvas.height as usize),
            ("cube_count", self.cube_count),
            ("density_spacing", self.density_spacing as usize),
            ("axis_line_count", self.axis_line_count),
            ("points_count", self.points_count),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        if self.kernel.radius.is_nan() || self.kernel.radius <= 0.0 {
            return Err(invalid("kernel.radius", format!("{} is not positive", self.kernel.radius)));
        }

        let arrays = [
            ("cube_count", self.cube_count * MATRIX_BYTES),
            ("cube_count", self.cube_count * COLOR_BYTES),
            ("density_spacing", self.density_cube_count() * MATRIX_BYTES),
            ("density_spacing", self.density_cube_count() * COLOR_BYTES),
            ("axis_line_count", self.axis_line_count * MATRIX_BYTES),
        ];
        for (field, bytes) in arrays {
            if bytes > MAX_UNIFORM_BYTES {
                return Err(invalid(
                    field,
                    format!("uniform array of {bytes} bytes exceeds {MAX_UNIFORM_BYTES}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
