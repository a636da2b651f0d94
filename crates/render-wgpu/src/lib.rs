//! wgpu backend for the density simulation.
//!
//! Replays [`densim_render::FramePlan`]s: a compute pass that moves the
//! points and then writes the density texture, a scene pass with the
//! background quad and instanced entities, and a points overlay pass.
//!
//! # Invariants
//! - Every resource is created once from a [`densim_render::SceneLayout`].
//! - Uploads are written only after the frame's command buffer is submitted.
//! - A lost or outdated surface is reconfigured and the frame dropped.

mod gpu;
mod pipelines;
mod provider;
mod shaders;

pub use gpu::WgpuBackend;
pub use provider::WgpuProvider;
pub use shaders::{BACKGROUND_SHADER, FIELD_SHADER, POINTS_SHADER, SCENE_SHADER, specialize};
