//! Renderer-agnostic description of one frame.
//!
//! The orchestrator records passes and uploads into a [`FramePlan`]; a
//! backend replays it. Resources are named by kind, never by handle, so a
//! plan can be inspected and compared without a GPU.

use std::ops::Range;

/// Which scene mesh a resource belongs to. The discriminant is the mesh type
/// id the scene shader switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeshKind {
    XAxisLines = 0,
    YAxis = 1,
    ZAxisLines = 2,
    Cubes = 3,
    DensityCubes = 4,
    Model = 5,
}

impl MeshKind {
    pub const ALL: [MeshKind; 6] = [
        MeshKind::XAxisLines,
        MeshKind::YAxis,
        MeshKind::ZAxisLines,
        MeshKind::Cubes,
        MeshKind::DensityCubes,
        MeshKind::Model,
    ];

    pub fn type_id(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            MeshKind::XAxisLines => "x_axis_lines",
            MeshKind::YAxis => "y_axis",
            MeshKind::ZAxisLines => "z_axis_lines",
            MeshKind::Cubes => "cubes",
            MeshKind::DensityCubes => "density_cubes",
            MeshKind::Model => "model",
        }
    }
}

/// A GPU buffer that mirrors some host array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BufferSlot {
    Projection,
    Camera,
    Points,
    /// The entity's own 4x4 transform.
    Transform(MeshKind),
    /// The entity's 16-byte [`EntityParams`](crate::EntityParams).
    Params(MeshKind),
    /// Per-instance transforms.
    Instances(MeshKind),
    /// Per-instance RGBA colors.
    Colors(MeshKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineKind {
    /// Compute: moves the density points. Dispatched before `Field`.
    Drift,
    /// Compute: density texture from the moved points.
    Field,
    /// Full-screen quad sampling the density texture.
    Background,
    /// Instanced axis, cube and model geometry.
    Scene,
    /// Density points drawn as small quads.
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindGroupKind {
    Field,
    Background,
    Entity(MeshKind),
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Compute,
    Scene,
    Points,
}

/// Anything a backend has to hold before a frame can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKey {
    Pipeline(PipelineKind),
    BindGroup(BindGroupKind),
    Buffer(BufferSlot),
    Mesh(MeshKind),
}

/// Color attachment load behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp {
    Clear([f64; 4]),
    Load,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetPipeline(PipelineKind),
    SetBindGroup {
        index: u32,
        group: BindGroupKind,
    },
    SetVertexBuffer {
        slot: u32,
        mesh: MeshKind,
    },
    SetIndexBuffer(MeshKind),
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
}

/// One recorded pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassRecording {
    pub kind: PassKind,
    /// Ignored for compute passes.
    pub load: LoadOp,
    /// Whether the pass clears and tests against the depth attachment.
    pub depth: bool,
    pub commands: Vec<Command>,
}

impl PassRecording {
    pub fn compute() -> Self {
        Self {
            kind: PassKind::Compute,
            load: LoadOp::Load,
            depth: false,
            commands: Vec::new(),
        }
    }

    pub fn render(kind: PassKind, load: LoadOp, depth: bool) -> Self {
        Self {
            kind,
            load,
            depth,
            commands: Vec::new(),
        }
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineKind) {
        self.commands.push(Command::SetPipeline(pipeline));
    }

    pub fn set_bind_group(&mut self, index: u32, group: BindGroupKind) {
        self.commands.push(Command::SetBindGroup { index, group });
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, mesh: MeshKind) {
        self.commands.push(Command::SetVertexBuffer { slot, mesh });
    }

    pub fn set_index_buffer(&mut self, mesh: MeshKind) {
        self.commands.push(Command::SetIndexBuffer(mesh));
    }

    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(Command::Draw { vertices, instances });
    }

    pub fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.commands.push(Command::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(Command::Dispatch { x, y, z });
    }
}

/// Bytes to write into a buffer after the frame is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub slot: BufferSlot,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn floats(slot: BufferSlot, data: &[f32]) -> Self {
        Self {
            slot,
            bytes: bytemuck::cast_slice::<f32, u8>(data).to_vec(),
        }
    }
}

/// Everything one `render` call produces: passes in submission order, then
/// uploads in the order they must reach the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePlan {
    pub passes: Vec<PassRecording>,
    pub uploads: Vec<Upload>,
}

impl FramePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pass(&mut self, pass: PassRecording) {
        self.passes.push(pass);
    }

    pub fn upload(&mut self, slot: BufferSlot, data: &[f32]) {
        self.uploads.push(Upload::floats(slot, data));
    }

    pub fn pass_kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(|p| p.kind).collect()
    }

    pub fn pass(&self, kind: PassKind) -> Option<&PassRecording> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    /// Upload order as slots, for assertions and debug output.
    pub fn upload_slots(&self) -> Vec<BufferSlot> {
        self.uploads.iter().map(|u| u.slot).collect()
    }
}
