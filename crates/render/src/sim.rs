//! The frame orchestrator.

use densim_assets::Mesh;
use densim_kernel::{Camera, Projection};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::backend::{BackendProvider, GpuBackend};
use crate::config::SimConfig;
use crate::entity::Entity;
use crate::frame::{
    BindGroupKind, BufferSlot, FramePlan, LoadOp, MeshKind, PassKind, PassRecording, PipelineKind, ResourceKey,
};
use crate::scene::Scene;

/// Vertices in the full-screen quad and in each point quad.
const QUAD_VERTICES: u32 = 6;

/// Invocations per workgroup of the point motion dispatch.
const DRIFT_WORKGROUP: u32 = 64;

enum SimState<B> {
    Uninitialized,
    Ready(Ready<B>),
}

struct Ready<B> {
    backend: B,
    scene: Scene,
    required: Vec<ResourceKey>,
}

/// Owns the camera, the scene and the backend, and turns `render(time)` calls
/// into frame plans.
///
/// Starts uninitialized. [`Sim::init`] moves it to ready once; until then
/// every call except the camera setters is a logged no-op.
pub struct Sim<B> {
    config: SimConfig,
    model: Option<Mesh>,
    camera: Camera,
    projection: Projection,
    state: SimState<B>,
    frames: u64,
}

impl<B: GpuBackend> Sim<B> {
    pub fn new(config: SimConfig) -> Self {
        Self {
            camera: Camera::new(config.camera_position),
            projection: config.projection,
            config,
            model: None,
            state: SimState::Uninitialized,
            frames: 0,
        }
    }

    /// Add an imported model to the scene built by `init`.
    pub fn with_model(mut self, mesh: Mesh) -> Self {
        self.model = Some(mesh);
        self
    }

    /// Validate the config, build the scene, then acquire a backend for it.
    ///
    /// On failure the sim stays uninitialized and the cause is logged; the
    /// host may call `init` again. Once ready, further calls are ignored.
    pub async fn init<P>(&mut self, provider: P)
    where
        P: BackendProvider<Backend = B>,
    {
        if self.is_ready() {
            tracing::warn!("sim already initialized, ignoring init");
            return;
        }

        if let Err(err) = self.config.validate() {
            tracing::warn!(%err, "invalid config, staying uninitialized");
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let scene = match Scene::build(&self.config, &mut rng, self.model.clone()) {
            Ok(scene) => scene,
            Err(err) => {
                tracing::warn!(%err, "scene build failed, staying uninitialized");
                return;
            }
        };
        self.camera.update();
        let layout = scene.layout(&self.camera, &self.projection);

        match provider.acquire(&layout).await {
            Ok(backend) => {
                tracing::info!(
                    entities = layout.entities.len(),
                    buffers = layout.buffers.len(),
                    "sim ready"
                );
                self.state = SimState::Ready(Ready {
                    backend,
                    scene,
                    required: layout.required_keys(),
                });
            }
            Err(err) => tracing::warn!(%err, "backend init failed, staying uninitialized"),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SimState::Ready(_))
    }

    /// Record and submit one frame. Never fails; problems are logged and the
    /// frame is dropped.
    pub fn render(&mut self, time_ms: f64) {
        let SimState::Ready(ready) = &mut self.state else {
            tracing::debug!(time_ms, "render before init, skipping");
            return;
        };
        if let Some(missing) = ready.required.iter().find(|k| !ready.backend.contains(**k)) {
            tracing::warn!(?missing, "missing resource, skipping frame");
            return;
        }

        self.camera.update();
        let plan = record_frame(&mut ready.scene, &self.camera, &self.projection, time_ms);
        match ready.backend.submit(&plan) {
            Ok(()) => self.frames += 1,
            Err(err) => tracing::warn!(%err, "frame dropped"),
        }
    }

    /// Degrees. Takes effect on the next `render`.
    pub fn set_camera_eulers(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.camera.set_eulers(pitch, yaw, roll);
    }

    pub fn set_camera_translation(&mut self, position: Vec3) {
        self.camera.set_translation(position);
    }

    /// Radians. No-op when there is no model or the sim is not ready.
    pub fn set_model_eulers(&mut self, pitch: f32, yaw: f32, roll: f32) {
        match self.scene_mut().and_then(|s| s.entity_mut(MeshKind::Model)) {
            Some(model) => model.set_eulers(pitch, yaw, roll),
            None => tracing::debug!("no model to rotate"),
        }
    }

    /// Track a new surface size. The projection aspect follows; canvas-space
    /// math keeps the configured canvas.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.projection.aspect = width as f32 / height as f32;
        if let SimState::Ready(ready) = &mut self.state {
            ready.backend.resize(width, height);
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Frames successfully submitted.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            SimState::Ready(ready) => Some(&ready.scene),
            SimState::Uninitialized => None,
        }
    }

    fn scene_mut(&mut self) -> Option<&mut Scene> {
        match &mut self.state {
            SimState::Ready(ready) => Some(&mut ready.scene),
            SimState::Uninitialized => None,
        }
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.state {
            SimState::Ready(ready) => Some(&ready.backend),
            SimState::Uninitialized => None,
        }
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        match &mut self.state {
            SimState::Ready(ready) => Some(&mut ready.backend),
            SimState::Uninitialized => None,
        }
    }
}

/// Compute, scene, points; then the stale point mirror, projection and camera.
fn record_frame(scene: &mut Scene, camera: &Camera, projection: &Projection, time_ms: f64) -> FramePlan {
    let mut plan = FramePlan::new();

    // points move in their own dispatch so the field never reads half-moved points
    let mut compute = PassRecording::compute();
    compute.set_bind_group(0, BindGroupKind::Field);
    compute.set_pipeline(PipelineKind::Drift);
    compute.dispatch((scene.points().len() as u32).div_ceil(DRIFT_WORKGROUP), 1, 1);
    compute.set_pipeline(PipelineKind::Field);
    let (x, y) = scene.canvas().workgroups_8x8();
    compute.dispatch(x, y, 1);
    plan.push_pass(compute);

    let clear = scene.clear_color().to_array().map(f64::from);
    let mut main = PassRecording::render(PassKind::Scene, LoadOp::Clear(clear), true);
    main.set_pipeline(PipelineKind::Background);
    main.set_bind_group(0, BindGroupKind::Background);
    main.draw(0..QUAD_VERTICES, 0..1);
    main.set_pipeline(PipelineKind::Scene);
    for entity in scene.entities_mut() {
        entity.render(&mut main, &mut plan.uploads, time_ms);
    }
    plan.push_pass(main);

    let points = scene.points();
    let mut dots = PassRecording::render(PassKind::Points, LoadOp::Load, false);
    dots.set_pipeline(PipelineKind::Points);
    dots.set_bind_group(0, BindGroupKind::Points);
    dots.draw(0..QUAD_VERTICES, 0..points.len() as u32);
    plan.push_pass(dots);
    // host copy is never read back, so this overwrites whatever the compute pass wrote
    plan.upload(BufferSlot::Points, points.mirror());

    plan.upload(BufferSlot::Projection, &projection.matrix().to_cols_array());
    plan.upload(BufferSlot::Camera, &camera.matrix().to_cols_array());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Command;
    use crate::recording::{RecordingBackend, RecordingProvider};

    fn small_config() -> SimConfig {
        SimConfig {
            cube_count: 4,
            density_spacing: 2,
            axis_line_count: 4,
            points_count: 3,
            ..SimConfig::default()
        }
    }

    fn ready_sim() -> Sim<RecordingBackend> {
        let mut sim = Sim::new(small_config());
        pollster::block_on(sim.init(RecordingProvider::new()));
        assert!(sim.is_ready());
        sim
    }

    fn last_plan(sim: &Sim<RecordingBackend>) -> &FramePlan {
        sim.backend().and_then(|b| b.last_plan()).unwrap()
    }

    #[test]
    fn render_before_init_is_a_no_op() {
        let mut sim: Sim<RecordingBackend> = Sim::new(small_config());
        sim.render(0.0);
        sim.render(16.0);
        assert!(!sim.is_ready());
        assert!(sim.backend().is_none());
        assert_eq!(sim.frames(), 0);
    }

    #[test]
    fn failed_init_stays_uninitialized_and_can_retry() {
        let mut sim: Sim<RecordingBackend> = Sim::new(small_config());
        pollster::block_on(sim.init(RecordingProvider::without_adapter()));
        assert!(!sim.is_ready());
        sim.render(0.0);
        assert_eq!(sim.frames(), 0);

        pollster::block_on(sim.init(RecordingProvider::new()));
        assert!(sim.is_ready());
    }

    #[test]
    fn oversized_uniform_arrays_keep_init_uninitialized() {
        // 11^3 density cubes need an 85,184 byte uniform array
        let config = SimConfig {
            density_spacing: 11,
            ..small_config()
        };
        let mut sim: Sim<RecordingBackend> = Sim::new(config);
        pollster::block_on(sim.init(RecordingProvider::new()));
        assert!(!sim.is_ready());
        assert!(sim.backend().is_none());
        sim.render(0.0);
        assert_eq!(sim.frames(), 0);
    }

    #[test]
    fn zero_counts_keep_init_uninitialized() {
        let config = SimConfig {
            cube_count: 0,
            ..small_config()
        };
        let mut sim: Sim<RecordingBackend> = Sim::new(config);
        pollster::block_on(sim.init(RecordingProvider::new()));
        assert!(!sim.is_ready());
    }

    #[test]
    fn second_init_keeps_the_first_backend() {
        let mut sim = ready_sim();
        sim.render(0.0);
        pollster::block_on(sim.init(RecordingProvider::new()));
        assert_eq!(sim.backend().map(|b| b.plans().len()), Some(1));
    }

    #[test]
    fn passes_run_compute_then_scene_then_points() {
        let mut sim = ready_sim();
        sim.render(0.0);
        let plan = last_plan(&sim);
        assert_eq!(plan.pass_kinds(), vec![PassKind::Compute, PassKind::Scene, PassKind::Points]);

        let compute = plan.pass(PassKind::Compute).unwrap();
        assert_eq!(compute.commands.last(), Some(&Command::Dispatch { x: 100, y: 75, z: 1 }));

        let scene = plan.pass(PassKind::Scene).unwrap();
        assert!(scene.depth);
        let grey = f64::from(0.3f32);
        assert_eq!(scene.load, LoadOp::Clear([grey, grey, grey, 1.0]));
        assert_eq!(scene.commands[0], Command::SetPipeline(PipelineKind::Background));
        assert_eq!(
            scene.commands[2],
            Command::Draw {
                vertices: 0..6,
                instances: 0..1
            }
        );

        let points = plan.pass(PassKind::Points).unwrap();
        assert_eq!(points.load, LoadOp::Load);
        assert!(!points.depth);
        assert!(points.commands.contains(&Command::Draw {
            vertices: 0..6,
            instances: 0..3
        }));
    }

    #[test]
    fn point_motion_is_dispatched_before_the_field() {
        let mut sim = ready_sim();
        sim.render(0.0);
        let compute = last_plan(&sim).pass(PassKind::Compute).unwrap();
        assert_eq!(
            compute.commands,
            vec![
                Command::SetBindGroup {
                    index: 0,
                    group: BindGroupKind::Field
                },
                Command::SetPipeline(PipelineKind::Drift),
                Command::Dispatch { x: 1, y: 1, z: 1 },
                Command::SetPipeline(PipelineKind::Field),
                Command::Dispatch { x: 100, y: 75, z: 1 },
            ]
        );
    }

    #[test]
    fn entities_draw_in_fixed_order() {
        let mut sim = Sim::new(small_config()).with_model(Mesh::indexed("tri", vec![0.0; 9], vec![2, 1, 0]));
        pollster::block_on(sim.init(RecordingProvider::new()));
        sim.render(0.0);
        let scene = last_plan(&sim).pass(PassKind::Scene).unwrap();
        let order: Vec<MeshKind> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::SetBindGroup {
                    group: BindGroupKind::Entity(kind),
                    ..
                } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![
                MeshKind::YAxis,
                MeshKind::XAxisLines,
                MeshKind::ZAxisLines,
                MeshKind::Cubes,
                MeshKind::DensityCubes,
                MeshKind::Model,
            ]
        );
    }

    #[test]
    fn uploads_end_with_points_projection_camera() {
        let mut sim = ready_sim();
        sim.render(0.0);
        let slots = last_plan(&sim).upload_slots();
        let n = slots.len();
        assert_eq!(
            &slots[n - 3..],
            &[BufferSlot::Points, BufferSlot::Projection, BufferSlot::Camera]
        );
        assert_eq!(slots[0], BufferSlot::Transform(MeshKind::YAxis));
    }

    #[test]
    fn camera_setter_reaches_the_camera_buffer() {
        let mut sim = ready_sim();
        sim.set_camera_translation(Vec3::new(1.0, 2.0, 3.0));
        sim.render(0.0);
        let view = sim.backend().and_then(|b| b.floats(BufferSlot::Camera)).unwrap();
        // view translation is the negated camera position when unrotated
        assert!((view[12] + 1.0).abs() < 1e-6);
        assert!((view[13] + 2.0).abs() < 1e-6);
        assert!((view[14] + 3.0).abs() < 1e-6);
    }

    #[test]
    fn stale_point_mirror_overwrites_compute_output() {
        let hook: crate::recording::DispatchHook = Box::new(|buffers| {
            if let Some(points) = buffers.get_mut(&BufferSlot::Points) {
                for chunk in points.chunks_exact_mut(4) {
                    chunk.copy_from_slice(&9.0f32.to_ne_bytes());
                }
            }
        });
        let mut sim = Sim::new(small_config());
        pollster::block_on(sim.init(RecordingProvider::new().with_dispatch_hook(hook)));
        let initial = sim.scene().map(|s| s.points().mirror().to_vec()).unwrap();

        sim.render(0.0);
        let after = sim.backend().and_then(|b| b.floats(BufferSlot::Points)).unwrap();
        assert_eq!(after, initial);
        assert!(after.iter().all(|v| *v != 9.0));
    }

    #[test]
    fn missing_resource_skips_the_frame() {
        let mut sim = ready_sim();
        if let Some(backend) = sim.backend_mut() {
            backend.remove(ResourceKey::BindGroup(BindGroupKind::Entity(MeshKind::Cubes)));
        }
        sim.render(0.0);
        sim.render(16.0);
        assert_eq!(sim.backend().map(|b| b.plans().len()), Some(0));
        assert_eq!(sim.frames(), 0);
    }

    #[test]
    fn cubes_fall_from_the_second_frame() {
        let mut sim = ready_sim();
        sim.render(1000.0);
        let first = sim.backend().and_then(|b| b.floats(BufferSlot::Instances(MeshKind::Cubes))).unwrap();
        sim.render(2000.0);
        sim.render(3000.0);
        let third = sim.backend().and_then(|b| b.floats(BufferSlot::Instances(MeshKind::Cubes))).unwrap();
        // heights sit at float 13 of each 16-float matrix
        assert!((0..4).any(|i| third[i * 16 + 13] < first[i * 16 + 13]));
        assert_eq!(sim.frames(), 3);
    }

    #[test]
    fn model_eulers_need_a_model() {
        let mut sim = ready_sim();
        sim.set_model_eulers(0.1, 0.2, 0.3);
        assert!(sim.scene().unwrap().entity(MeshKind::Model).is_none());

        let mut sim = Sim::<RecordingBackend>::new(small_config()).with_model(Mesh::new("tri", vec![0.0; 9]));
        pollster::block_on(sim.init(RecordingProvider::new()));
        sim.set_model_eulers(0.0, 0.5, 0.0);
        let model = sim.scene().and_then(|s| s.entity(MeshKind::Model)).unwrap();
        assert_ne!(model.base().transform().matrix(), glam::Mat4::IDENTITY);
    }

    #[test]
    fn resize_updates_aspect_and_backend() {
        let mut sim = ready_sim();
        sim.resize(1000, 500);
        assert_eq!(sim.projection().aspect, 2.0);
        assert_eq!(sim.backend().and_then(|b| b.surface_size()), Some((1000, 500)));
        sim.resize(0, 10);
        assert_eq!(sim.projection().aspect, 2.0);
    }
}
