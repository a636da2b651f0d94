use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::action::{Action, Axis};

/// Per-keypress increments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSteps {
    /// Camera rotation per press, degrees.
    pub camera_degrees: f32,
    /// Camera translation per press.
    pub camera_translation: f32,
    /// Model rotation per press, radians.
    pub model_radians: f32,
}

impl Default for RigSteps {
    fn default() -> Self {
        Self {
            camera_degrees: 4.0,
            camera_translation: 0.3,
            model_radians: 0.05,
        }
    }
}

/// Accumulated camera and model pose, as the shell sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub steps: RigSteps,
    /// Camera (pitch, yaw, roll) in degrees.
    pub camera_eulers: Vec3,
    pub camera_position: Vec3,
    /// Model (pitch, yaw, roll) in radians.
    pub model_eulers: Vec3,
}

impl CameraRig {
    pub fn new(camera_position: Vec3) -> Self {
        Self {
            steps: RigSteps::default(),
            camera_eulers: Vec3::ZERO,
            camera_position,
            model_eulers: Vec3::ZERO,
        }
    }

    pub fn with_steps(mut self, steps: RigSteps) -> Self {
        self.steps = steps;
        self
    }

    /// Fold one action into the pose. Returns `true` if the model moved
    /// (the camera always counts as changed).
    pub fn apply(&mut self, action: Action) -> bool {
        tracing::trace!(?action, "rig action");
        match action {
            Action::RotateModel(axis) => {
                bump(&mut self.model_eulers, axis, self.steps.model_radians);
                true
            }
            Action::RotateCamera(axis) => {
                bump(&mut self.camera_eulers, axis, self.steps.camera_degrees);
                false
            }
            Action::MoveCamera(dir) => {
                self.camera_position += dir * self.steps.camera_translation;
                false
            }
        }
    }
}

fn bump(eulers: &mut Vec3, axis: Axis, step: f32) {
    match axis {
        Axis::Pitch => eulers.x += step,
        Axis::Yaw => eulers.y += step,
        Axis::Roll => eulers.z += step,
    }
}
