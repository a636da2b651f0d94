use std::future::Future;

use densim_kernel::KernelError;

use crate::frame::{BufferSlot, FramePlan, ResourceKey};
use crate::scene::SceneLayout;

/// Why initialization did not reach the ready state.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("device request failed: {0}")]
    RequestDevice(String),
    #[error("surface setup failed: {0}")]
    Surface(String),
    #[error("scene build failed: {0}")]
    Scene(#[from] KernelError),
    #[error("layout has no buffer for {0:?}")]
    MissingBuffer(BufferSlot),
}

/// Why a frame was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("missing resource {0:?}")]
    MissingResource(ResourceKey),
    #[error("upload of {len} bytes overflows {slot:?} ({capacity} bytes)")]
    UploadOverflow {
        slot: BufferSlot,
        len: usize,
        capacity: usize,
    },
    #[error("surface lost")]
    SurfaceLost,
    #[error("surface outdated")]
    SurfaceOutdated,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
}

/// Something that can replay a [`FramePlan`].
///
/// `submit` records every pass into one command buffer, submits it, and only
/// then writes the plan's uploads in order.
pub trait GpuBackend {
    /// Whether the resource was created.
    fn contains(&self, key: ResourceKey) -> bool;

    fn submit(&mut self, plan: &FramePlan) -> Result<(), FrameError>;

    /// Surface size changed. Backends without a surface ignore it.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Acquires a device and builds every resource a [`SceneLayout`] names.
pub trait BackendProvider {
    type Backend: GpuBackend;

    fn acquire(self, layout: &SceneLayout) -> impl Future<Output = Result<Self::Backend, InitError>>;
}
