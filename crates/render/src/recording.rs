//! A backend that records plans instead of talking to a GPU.
//!
//! Used by the CLI to print frames and by tests to check pass order and
//! upload contents. Buffers are plain byte vectors keyed by slot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::future::Future;

use crate::backend::{BackendProvider, FrameError, GpuBackend, InitError};
use crate::frame::{BufferSlot, Command, FramePlan, ResourceKey};
use crate::scene::SceneLayout;

/// Called once per `Dispatch` command, standing in for the compute shader.
pub type DispatchHook = Box<dyn FnMut(&mut BTreeMap<BufferSlot, Vec<u8>>)>;

pub struct RecordingBackend {
    keys: BTreeSet<ResourceKey>,
    buffers: BTreeMap<BufferSlot, Vec<u8>>,
    plans: Vec<FramePlan>,
    on_dispatch: Option<DispatchHook>,
    surface_size: Option<(u32, u32)>,
}

impl RecordingBackend {
    pub fn from_layout(layout: &SceneLayout) -> Self {
        Self {
            keys: layout.required_keys().into_iter().collect(),
            buffers: layout
                .buffers
                .iter()
                .map(|b| (b.slot, b.initial.clone()))
                .collect(),
            plans: Vec::new(),
            on_dispatch: None,
            surface_size: None,
        }
    }

    pub fn set_dispatch_hook(&mut self, hook: DispatchHook) {
        self.on_dispatch = Some(hook);
    }

    /// Forget a resource, as if creating it had failed.
    pub fn remove(&mut self, key: ResourceKey) {
        self.keys.remove(&key);
        if let ResourceKey::Buffer(slot) = key {
            self.buffers.remove(&slot);
        }
    }

    pub fn plans(&self) -> &[FramePlan] {
        &self.plans
    }

    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.plans.last()
    }

    pub fn buffer(&self, slot: BufferSlot) -> Option<&[u8]> {
        self.buffers.get(&slot).map(Vec::as_slice)
    }

    /// Buffer contents as floats.
    pub fn floats(&self, slot: BufferSlot) -> Option<Vec<f32>> {
        self.buffer(slot)
            .map(|bytes| bytes.chunks_exact(4).map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect())
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }
}

impl GpuBackend for RecordingBackend {
    fn contains(&self, key: ResourceKey) -> bool {
        self.keys.contains(&key)
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), FrameError> {
        for upload in &plan.uploads {
            let capacity = self
                .buffers
                .get(&upload.slot)
                .map(Vec::len)
                .ok_or(FrameError::MissingResource(ResourceKey::Buffer(upload.slot)))?;
            if upload.bytes.len() > capacity {
                return Err(FrameError::UploadOverflow {
                    slot: upload.slot,
                    len: upload.bytes.len(),
                    capacity,
                });
            }
        }

        // submitted work runs before any of this frame's uploads land
        if let Some(hook) = self.on_dispatch.as_mut() {
            let dispatches = plan
                .passes
                .iter()
                .flat_map(|p| &p.commands)
                .filter(|c| matches!(c, Command::Dispatch { .. }))
                .count();
            for _ in 0..dispatches {
                hook(&mut self.buffers);
            }
        }

        for upload in &plan.uploads {
            if let Some(buffer) = self.buffers.get_mut(&upload.slot) {
                buffer[..upload.bytes.len()].copy_from_slice(&upload.bytes);
            }
        }
        self.plans.push(plan.clone());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_size = Some((width, height));
    }
}

/// Hands out a [`RecordingBackend`], or fails like a machine without a GPU.
#[derive(Default)]
pub struct RecordingProvider {
    no_adapter: bool,
    on_dispatch: Option<DispatchHook>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_adapter() -> Self {
        Self {
            no_adapter: true,
            on_dispatch: None,
        }
    }

    pub fn with_dispatch_hook(mut self, hook: DispatchHook) -> Self {
        self.on_dispatch = Some(hook);
        self
    }
}

impl BackendProvider for RecordingProvider {
    type Backend = RecordingBackend;

    fn acquire(self, layout: &SceneLayout) -> impl Future<Output = Result<RecordingBackend, InitError>> {
        let result = if self.no_adapter {
            Err(InitError::NoAdapter)
        } else {
            let mut backend = RecordingBackend::from_layout(layout);
            backend.on_dispatch = self.on_dispatch;
            Ok(backend)
        };
        std::future::ready(result)
    }
}

/// Human-readable dump of a plan.
pub fn describe_plan(plan: &FramePlan) -> String {
    let mut out = String::new();
    for pass in &plan.passes {
        let _ = writeln!(
            out,
            "pass {:?} load={:?} depth={} ({} commands)",
            pass.kind,
            pass.load,
            pass.depth,
            pass.commands.len()
        );
        for command in &pass.commands {
            let _ = writeln!(out, "  {command:?}");
        }
    }
    let _ = writeln!(out, "uploads: {}", plan.uploads.len());
    for upload in &plan.uploads {
        let _ = writeln!(out, "  {:?} {} bytes", upload.slot, upload.bytes.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{MeshKind, PassRecording};
    use crate::scene::{BufferRole, BufferSpec, InstanceCounts};
    use densim_common::{CanvasSize, Color};

    fn tiny_layout() -> SceneLayout {
        SceneLayout {
            canvas: CanvasSize::new(16, 16),
            clear_color: Color::rgba(0.0, 0.0, 0.0, 1.0),
            counts: InstanceCounts {
                x_lines: 0,
                z_lines: 0,
                cubes: 0,
                density_cubes: 0,
                points: 1,
            },
            buffers: vec![BufferSpec {
                slot: BufferSlot::Points,
                role: BufferRole::Storage,
                initial: vec![0; 16],
            }],
            meshes: Vec::new(),
            entities: vec![MeshKind::YAxis],
        }
    }

    #[test]
    fn uploads_land_after_dispatch() {
        let mut backend = RecordingBackend::from_layout(&tiny_layout());
        backend.set_dispatch_hook(Box::new(|buffers| {
            if let Some(points) = buffers.get_mut(&BufferSlot::Points) {
                points.fill(0xff);
            }
        }));
        let mut plan = FramePlan::new();
        let mut compute = PassRecording::compute();
        compute.dispatch(2, 2, 1);
        plan.push_pass(compute);
        plan.upload(BufferSlot::Points, &[1.0, 2.0, 3.0, 4.0]);

        backend.submit(&plan).unwrap();
        assert_eq!(backend.floats(BufferSlot::Points), Some(vec![1.0, 2.0, 3.0, 4.0]));
        assert_eq!(backend.plans().len(), 1);
    }

    #[test]
    fn oversized_upload_is_rejected_before_anything_changes() {
        let mut backend = RecordingBackend::from_layout(&tiny_layout());
        let mut plan = FramePlan::new();
        plan.upload(BufferSlot::Points, &[0.0; 5]);
        let err = backend.submit(&plan).unwrap_err();
        assert!(matches!(err, FrameError::UploadOverflow { len: 20, capacity: 16, .. }));
        assert!(backend.plans().is_empty());
    }

    #[test]
    fn removed_key_is_reported_missing() {
        let mut backend = RecordingBackend::from_layout(&tiny_layout());
        let key = ResourceKey::Buffer(BufferSlot::Points);
        assert!(backend.contains(key));
        backend.remove(key);
        assert!(!backend.contains(key));
        assert!(backend.buffer(BufferSlot::Points).is_none());
    }

    #[test]
    fn provider_without_adapter_fails() {
        let result = pollster::block_on(RecordingProvider::without_adapter().acquire(&tiny_layout()));
        assert!(matches!(result, Err(InitError::NoAdapter)));
        let ok = pollster::block_on(RecordingProvider::new().acquire(&tiny_layout()));
        assert!(ok.is_ok());
    }

    #[test]
    fn describe_lists_passes_and_uploads() {
        let mut plan = FramePlan::new();
        plan.push_pass(PassRecording::compute());
        plan.upload(BufferSlot::Camera, &[0.0; 16]);
        let text = describe_plan(&plan);
        assert!(text.contains("pass Compute"));
        assert!(text.contains("Camera 64 bytes"));
    }
}
