//! Renderer-agnostic frame orchestration.
//!
//! # Invariants
//! - Each frame records exactly three passes in order: compute, scene, points.
//! - Uploads recorded during a frame are written after that frame is
//!   submitted, so they feed the next frame and never the current one.
//! - `Sim::init` and `Sim::render` never return errors to the host; failures
//!   are logged and degrade to no-ops.
//! - Entities and buffers are created once during init; only their contents
//!   change per frame.

mod backend;
mod config;
mod entity;
mod frame;
mod recording;
mod scene;
mod sim;

pub use backend::{BackendProvider, FrameError, GpuBackend, InitError};
pub use config::{ConfigError, MAX_UNIFORM_BYTES, SimConfig};
pub use entity::{
    AxisLinesEntity, CubesEntity, DensityCubesEntity, Entity, EntityBase, EntityParams, MeshEntity,
    PARAMS_INSTANCE_COLORS, SceneEntity,
};
pub use frame::{
    BindGroupKind, BufferSlot, Command, FramePlan, LoadOp, MeshKind, PassKind, PassRecording, PipelineKind,
    ResourceKey, Upload,
};
pub use recording::{DispatchHook, RecordingBackend, RecordingProvider, describe_plan};
pub use scene::{BufferRole, BufferSpec, InstanceCounts, MODEL_SCALE, MeshSpec, Scene, SceneLayout};
pub use sim::Sim;
