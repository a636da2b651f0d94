use std::collections::BTreeMap;

use densim_render::{
    BindGroupKind, BufferRole, BufferSlot, Command, FrameError, FramePlan, GpuBackend, InitError, LoadOp, MeshKind,
    PassKind, PassRecording, PipelineKind, ResourceKey, SceneLayout,
};
use wgpu::util::DeviceExt;

use crate::pipelines::{self, DENSITY_FORMAT, Pipelines};

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: Option<wgpu::Buffer>,
}

/// Shared buffers every entity bind group references. Only the entity's
/// transform and params differ between groups.
struct ScenePassDeps<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::BindGroupLayout,
    projection: &'a wgpu::Buffer,
    camera: &'a wgpu::Buffer,
    x_lines: &'a wgpu::Buffer,
    z_lines: &'a wgpu::Buffer,
    cubes: &'a wgpu::Buffer,
    cube_colors: &'a wgpu::Buffer,
    density_cubes: &'a wgpu::Buffer,
    density_colors: &'a wgpu::Buffer,
}

impl<'a> ScenePassDeps<'a> {
    fn new(
        device: &'a wgpu::Device,
        layout: &'a wgpu::BindGroupLayout,
        buffers: &'a BTreeMap<BufferSlot, wgpu::Buffer>,
    ) -> Result<Self, InitError> {
        Ok(Self {
            device,
            layout,
            projection: lookup(buffers, BufferSlot::Projection)?,
            camera: lookup(buffers, BufferSlot::Camera)?,
            x_lines: lookup(buffers, BufferSlot::Instances(MeshKind::XAxisLines))?,
            z_lines: lookup(buffers, BufferSlot::Instances(MeshKind::ZAxisLines))?,
            cubes: lookup(buffers, BufferSlot::Instances(MeshKind::Cubes))?,
            cube_colors: lookup(buffers, BufferSlot::Colors(MeshKind::Cubes))?,
            density_cubes: lookup(buffers, BufferSlot::Instances(MeshKind::DensityCubes))?,
            density_colors: lookup(buffers, BufferSlot::Colors(MeshKind::DensityCubes))?,
        })
    }

    fn entity_bind_group(&self, kind: MeshKind, params: &wgpu::Buffer, transform: &wgpu::Buffer) -> wgpu::BindGroup {
        let label = format!("{}_bind_group", kind.label());
        let resources = [
            self.projection,
            self.camera,
            params,
            self.x_lines,
            self.z_lines,
            transform,
            self.cubes,
            self.cube_colors,
            self.density_cubes,
            self.density_colors,
        ];
        let entries: Vec<_> = resources
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: self.layout,
            entries: &entries,
        })
    }
}

fn lookup(buffers: &BTreeMap<BufferSlot, wgpu::Buffer>, slot: BufferSlot) -> Result<&wgpu::Buffer, InitError> {
    buffers.get(&slot).ok_or(InitError::MissingBuffer(slot))
}

/// Replays frame plans on a wgpu device and presents to a surface.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth: wgpu::TextureView,
    pipelines: Pipelines,
    buffers: BTreeMap<BufferSlot, wgpu::Buffer>,
    meshes: BTreeMap<MeshKind, GpuMesh>,
    bind_groups: BTreeMap<BindGroupKind, wgpu::BindGroup>,
}

impl WgpuBackend {
    /// Creates every buffer, mesh, pipeline and bind group the layout names.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        layout: &SceneLayout,
    ) -> Result<Self, InitError> {
        surface.configure(&device, &config);
        let depth = pipelines::create_depth_view(&device, config.width, config.height);
        let pipelines = Pipelines::new(&device, config.format, &layout.counts);

        let buffers: BTreeMap<_, _> = layout
            .buffers
            .iter()
            .map(|spec| {
                let role = match spec.role {
                    BufferRole::Uniform => wgpu::BufferUsages::UNIFORM,
                    BufferRole::Storage => wgpu::BufferUsages::STORAGE,
                };
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?}", spec.slot)),
                    contents: &spec.initial,
                    usage: role | wgpu::BufferUsages::COPY_DST,
                });
                (spec.slot, buffer)
            })
            .collect();

        let meshes = layout
            .meshes
            .iter()
            .map(|spec| {
                let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{}_vertices", spec.kind.label())),
                    contents: bytemuck::cast_slice(&spec.mesh.positions),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let indices = spec.mesh.indices.as_ref().map(|indices| {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}_indices", spec.kind.label())),
                        contents: bytemuck::cast_slice(indices),
                        usage: wgpu::BufferUsages::INDEX,
                    })
                });
                (spec.kind, GpuMesh { vertices, indices })
            })
            .collect();

        let density = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("density_texture"),
            size: wgpu::Extent3d {
                width: layout.canvas.width.max(1),
                height: layout.canvas.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DENSITY_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let density_view = density.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("density_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut bind_groups = BTreeMap::new();
        bind_groups.insert(
            BindGroupKind::Field,
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("field_bind_group"),
                layout: &pipelines.field_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&density_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: lookup(&buffers, BufferSlot::Projection)?.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: lookup(&buffers, BufferSlot::Camera)?.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: lookup(&buffers, BufferSlot::Points)?.as_entire_binding(),
                    },
                ],
            }),
        );
        bind_groups.insert(
            BindGroupKind::Background,
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("background_bind_group"),
                layout: &pipelines.background_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&density_view),
                    },
                ],
            }),
        );
        bind_groups.insert(
            BindGroupKind::Points,
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("points_bind_group"),
                layout: &pipelines.points_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lookup(&buffers, BufferSlot::Points)?.as_entire_binding(),
                }],
            }),
        );

        let deps = ScenePassDeps::new(&device, &pipelines.scene_layout, &buffers)?;
        for &kind in &layout.entities {
            let params = lookup(&buffers, BufferSlot::Params(kind))?;
            let transform = lookup(&buffers, BufferSlot::Transform(kind))?;
            bind_groups.insert(BindGroupKind::Entity(kind), deps.entity_bind_group(kind, params, transform));
        }

        tracing::info!(
            buffers = buffers.len(),
            meshes = layout.meshes.len(),
            bind_groups = bind_groups.len(),
            format = ?config.format,
            "GPU resources created"
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
            depth,
            pipelines,
            buffers,
            meshes,
            bind_groups,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn bind_group(&self, kind: BindGroupKind) -> Result<&wgpu::BindGroup, FrameError> {
        self.bind_groups
            .get(&kind)
            .ok_or(FrameError::MissingResource(ResourceKey::BindGroup(kind)))
    }

    fn mesh(&self, kind: MeshKind) -> Result<&GpuMesh, FrameError> {
        self.meshes
            .get(&kind)
            .ok_or(FrameError::MissingResource(ResourceKey::Mesh(kind)))
    }

    fn render_pipeline(&self, kind: PipelineKind) -> Result<&wgpu::RenderPipeline, FrameError> {
        match kind {
            PipelineKind::Background => Ok(&self.pipelines.background),
            PipelineKind::Scene => Ok(&self.pipelines.scene),
            PipelineKind::Points => Ok(&self.pipelines.points),
            PipelineKind::Drift | PipelineKind::Field => Err(FrameError::MissingResource(ResourceKey::Pipeline(kind))),
        }
    }

    fn acquire_frame(&mut self) -> Result<wgpu::SurfaceTexture, FrameError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                Err(FrameError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Err(FrameError::SurfaceOutdated)
            }
            Err(wgpu::SurfaceError::Timeout) => Err(FrameError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => Err(FrameError::OutOfMemory),
            #[allow(unreachable_patterns)]
            Err(err) => Err(FrameError::Surface(err.to_string())),
        }
    }

    fn check_uploads(&self, plan: &FramePlan) -> Result<(), FrameError> {
        for upload in &plan.uploads {
            let buffer = self
                .buffers
                .get(&upload.slot)
                .ok_or(FrameError::MissingResource(ResourceKey::Buffer(upload.slot)))?;
            let capacity = buffer.size() as usize;
            if upload.bytes.len() > capacity {
                return Err(FrameError::UploadOverflow {
                    slot: upload.slot,
                    len: upload.bytes.len(),
                    capacity,
                });
            }
        }
        Ok(())
    }

    fn record_compute(&self, encoder: &mut wgpu::CommandEncoder, recording: &PassRecording) -> Result<(), FrameError> {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("field_pass"),
            timestamp_writes: None,
        });
        for command in &recording.commands {
            match command {
                Command::SetPipeline(PipelineKind::Drift) => pass.set_pipeline(&self.pipelines.drift),
                Command::SetPipeline(PipelineKind::Field) => pass.set_pipeline(&self.pipelines.field),
                Command::SetBindGroup { index, group } => pass.set_bind_group(*index, self.bind_group(*group)?, &[]),
                Command::Dispatch { x, y, z } => pass.dispatch_workgroups(*x, *y, *z),
                other => tracing::warn!(?other, "render command in compute pass ignored"),
            }
        }
        Ok(())
    }

    fn record_render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        recording: &PassRecording,
    ) -> Result<(), FrameError> {
        let load = match recording.load {
            LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
            LoadOp::Load => wgpu::LoadOp::Load,
        };
        let depth_stencil_attachment = recording.depth.then(|| wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });
        let label = match recording.kind {
            PassKind::Points => "points_pass",
            _ => "scene_pass",
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            ..Default::default()
        });

        for command in &recording.commands {
            match command {
                Command::SetPipeline(kind) => pass.set_pipeline(self.render_pipeline(*kind)?),
                Command::SetBindGroup { index, group } => pass.set_bind_group(*index, self.bind_group(*group)?, &[]),
                Command::SetVertexBuffer { slot, mesh } => {
                    pass.set_vertex_buffer(*slot, self.mesh(*mesh)?.vertices.slice(..));
                }
                Command::SetIndexBuffer(mesh) => {
                    let indices = self
                        .mesh(*mesh)?
                        .indices
                        .as_ref()
                        .ok_or(FrameError::MissingResource(ResourceKey::Mesh(*mesh)))?;
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                }
                Command::Draw { vertices, instances } => pass.draw(vertices.clone(), instances.clone()),
                Command::DrawIndexed {
                    indices,
                    base_vertex,
                    instances,
                } => pass.draw_indexed(indices.clone(), *base_vertex, instances.clone()),
                Command::Dispatch { .. } => tracing::warn!("dispatch in render pass ignored"),
            }
        }
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    fn contains(&self, key: ResourceKey) -> bool {
        match key {
            ResourceKey::Pipeline(_) => true,
            ResourceKey::BindGroup(kind) => self.bind_groups.contains_key(&kind),
            ResourceKey::Buffer(slot) => self.buffers.contains_key(&slot),
            ResourceKey::Mesh(kind) => self.meshes.contains_key(&kind),
        }
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), FrameError> {
        self.check_uploads(plan)?;
        let frame = self.acquire_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        for recording in &plan.passes {
            match recording.kind {
                PassKind::Compute => self.record_compute(&mut encoder, recording)?,
                PassKind::Scene | PassKind::Points => self.record_render(&mut encoder, &view, recording)?,
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        for upload in &plan.uploads {
            if let Some(buffer) = self.buffers.get(&upload.slot) {
                self.queue.write_buffer(buffer, 0, &upload.bytes);
            }
        }
        frame.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = pipelines::create_depth_view(&self.device, width, height);
        tracing::debug!(width, height, "surface reconfigured");
    }
}
