//! Scene entities: one mesh, one transform, one bind group each.

use bytemuck::{Pod, Zeroable};
use densim_assets::Mesh;
use densim_kernel::{AxisLines, CubeDensityInstances, CubeInstances, EntityTransform, InstanceGroup};
use glam::Vec3;

use crate::frame::{BindGroupKind, BufferSlot, MeshKind, PassRecording, Upload};

/// `flags` bit: the shader reads per-instance colors instead of the mesh default.
pub const PARAMS_INSTANCE_COLORS: u32 = 1;

/// Per-entity uniform. 16 bytes to satisfy uniform buffer alignment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct EntityParams {
    pub mesh_type: u32,
    pub flags: u32,
    pub _pad: [u32; 2],
}

/// State every entity carries.
#[derive(Debug, Clone)]
pub struct EntityBase {
    kind: MeshKind,
    mesh: Mesh,
    transform: EntityTransform,
    instance_colors: bool,
}

impl EntityBase {
    pub fn new(kind: MeshKind, mesh: Mesh) -> Self {
        Self {
            kind,
            mesh,
            transform: EntityTransform::new(),
            instance_colors: false,
        }
    }

    pub fn with_instance_colors(mut self, enabled: bool) -> Self {
        self.instance_colors = enabled;
        self
    }

    pub fn kind(&self) -> MeshKind {
        self.kind
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn transform(&self) -> &EntityTransform {
        &self.transform
    }

    pub fn params(&self) -> EntityParams {
        EntityParams {
            mesh_type: self.kind.type_id(),
            flags: if self.instance_colors { PARAMS_INSTANCE_COLORS } else { 0 },
            _pad: [0; 2],
        }
    }
}

/// The draw contract shared by every scene entity.
///
/// Implementors supply state access and, if they are instanced, their
/// instance count and mirror uploads. `render` is the fixed template: advance,
/// bind, draw, then queue the transform upload. The upload lands after the
/// frame is submitted, so it feeds the next frame's draw.
pub trait Entity {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn instance_count(&self) -> u32 {
        1
    }

    /// Per-frame host update. Static entities do nothing.
    fn advance(&mut self, _time_ms: f64) {}

    /// Queue the instance mirrors, if any.
    fn instance_uploads(&self, _uploads: &mut Vec<Upload>) {}

    /// Radians, applied yaw then pitch then roll about the entity's pivot.
    fn set_eulers(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.base_mut().transform.set_eulers(pitch, yaw, roll);
    }

    fn set_position(&mut self, v: Vec3) {
        self.base_mut().transform.set_position(v);
    }

    fn set_scale(&mut self, v: Vec3) {
        self.base_mut().transform.set_scale(v);
    }

    fn render(&mut self, pass: &mut PassRecording, uploads: &mut Vec<Upload>, time_ms: f64) {
        self.advance(time_ms);

        let base = self.base();
        let kind = base.kind();
        let instances = 0..self.instance_count();
        pass.set_bind_group(0, BindGroupKind::Entity(kind));
        pass.set_vertex_buffer(0, kind);
        match base.mesh().index_count() {
            Some(count) => {
                pass.set_index_buffer(kind);
                pass.draw_indexed(0..count, 0, instances);
            }
            None => pass.draw(0..base.mesh().vertex_count(), instances),
        }

        uploads.push(Upload::floats(
            BufferSlot::Transform(kind),
            &base.transform().to_cols_array(),
        ));
        self.instance_uploads(uploads);
    }
}

fn group_uploads(kind: MeshKind, group: &InstanceGroup, uploads: &mut Vec<Upload>) {
    uploads.push(Upload::floats(BufferSlot::Instances(kind), group.transform_mirror()));
    if group.colors().is_some() {
        uploads.push(Upload::floats(BufferSlot::Colors(kind), group.color_mirror()));
    }
}

/// A single-instance mesh: the Y axis or an imported model.
#[derive(Debug, Clone)]
pub struct MeshEntity {
    base: EntityBase,
}

impl MeshEntity {
    pub fn new(kind: MeshKind, mesh: Mesh) -> Self {
        Self {
            base: EntityBase::new(kind, mesh),
        }
    }
}

impl Entity for MeshEntity {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[derive(Debug, Clone)]
pub struct AxisLinesEntity {
    base: EntityBase,
    lines: AxisLines,
}

impl AxisLinesEntity {
    pub fn new(kind: MeshKind, mesh: Mesh, lines: AxisLines) -> Self {
        Self {
            base: EntityBase::new(kind, mesh),
            lines,
        }
    }

    pub fn lines(&self) -> &AxisLines {
        &self.lines
    }
}

impl Entity for AxisLinesEntity {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn instance_count(&self) -> u32 {
        self.lines.group().len() as u32
    }

    fn instance_uploads(&self, uploads: &mut Vec<Upload>) {
        group_uploads(self.base.kind, self.lines.group(), uploads);
    }
}

/// Falling cubes, integrated every frame.
#[derive(Debug, Clone)]
pub struct CubesEntity {
    base: EntityBase,
    cubes: CubeInstances,
}

impl CubesEntity {
    pub fn new(mesh: Mesh, cubes: CubeInstances) -> Self {
        let colored = cubes.group().colors().is_some();
        Self {
            base: EntityBase::new(MeshKind::Cubes, mesh).with_instance_colors(colored),
            cubes,
        }
    }

    pub fn cubes(&self) -> &CubeInstances {
        &self.cubes
    }
}

impl Entity for CubesEntity {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn instance_count(&self) -> u32 {
        self.cubes.group().len() as u32
    }

    fn advance(&mut self, time_ms: f64) {
        self.cubes.update(time_ms);
    }

    fn instance_uploads(&self, uploads: &mut Vec<Upload>) {
        group_uploads(MeshKind::Cubes, self.cubes.group(), uploads);
    }
}

/// Static density-colored grid.
#[derive(Debug, Clone)]
pub struct DensityCubesEntity {
    base: EntityBase,
    cubes: CubeDensityInstances,
}

impl DensityCubesEntity {
    pub fn new(mesh: Mesh, cubes: CubeDensityInstances) -> Self {
        Self {
            base: EntityBase::new(MeshKind::DensityCubes, mesh).with_instance_colors(true),
            cubes,
        }
    }

    pub fn cubes(&self) -> &CubeDensityInstances {
        &self.cubes
    }
}

impl Entity for DensityCubesEntity {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn instance_count(&self) -> u32 {
        self.cubes.group().len() as u32
    }

    fn instance_uploads(&self, uploads: &mut Vec<Upload>) {
        group_uploads(MeshKind::DensityCubes, self.cubes.group(), uploads);
    }
}

/// The closed set of entities a scene holds, dispatched by match.
#[derive(Debug, Clone)]
pub enum SceneEntity {
    Axis(MeshEntity),
    AxisLines(AxisLinesEntity),
    Cubes(CubesEntity),
    DensityCubes(DensityCubesEntity),
    Model(MeshEntity),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            SceneEntity::Axis($e) => $body,
            SceneEntity::AxisLines($e) => $body,
            SceneEntity::Cubes($e) => $body,
            SceneEntity::DensityCubes($e) => $body,
            SceneEntity::Model($e) => $body,
        }
    };
}

impl Entity for SceneEntity {
    fn base(&self) -> &EntityBase {
        dispatch!(self, e => e.base())
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        dispatch!(self, e => e.base_mut())
    }

    fn instance_count(&self) -> u32 {
        dispatch!(self, e => e.instance_count())
    }

    fn advance(&mut self, time_ms: f64) {
        dispatch!(self, e => e.advance(time_ms))
    }

    fn instance_uploads(&self, uploads: &mut Vec<Upload>) {
        dispatch!(self, e => e.instance_uploads(uploads))
    }
}
