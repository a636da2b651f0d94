//! The fixed entity list and the GPU resources it needs.

use densim_assets::{CUBE_MODEL_Z, Mesh, cube_faces, x_axis_quad, y_axis_quad, z_axis_quad};
use densim_common::{CanvasSize, Color};
use densim_kernel::placement::{cube_transforms, random_cube_positions, random_pixel_points};
use densim_kernel::transform::{y0_plane_horizontal_line, y0_plane_vertical_line};
use densim_kernel::{
    AxisLines, Camera, CubeDensityInstances, CubeInstances, DensityLayer, KernelError, Projection,
};
use glam::Vec3;
use rand::Rng;

use crate::config::SimConfig;
use crate::entity::{
    AxisLinesEntity, CubesEntity, DensityCubesEntity, Entity, EntityParams, MeshEntity, SceneEntity,
};
use crate::frame::{BindGroupKind, BufferSlot, MeshKind, PipelineKind, ResourceKey};

/// Imported models are stretched along x.
pub const MODEL_SCALE: Vec3 = Vec3::new(1.5, 1.0, 1.0);

/// How a buffer is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    Uniform,
    /// Read-write storage (the density points).
    Storage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferSpec {
    pub slot: BufferSlot,
    pub role: BufferRole,
    pub initial: Vec<u8>,
}

impl BufferSpec {
    fn floats(slot: BufferSlot, role: BufferRole, data: &[f32]) -> Self {
        Self {
            slot,
            role,
            initial: bytemuck::cast_slice::<f32, u8>(data).to_vec(),
        }
    }

    pub fn size(&self) -> u64 {
        self.initial.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSpec {
    pub kind: MeshKind,
    pub mesh: Mesh,
}

/// Array lengths the shaders are specialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceCounts {
    pub x_lines: u32,
    pub z_lines: u32,
    pub cubes: u32,
    pub density_cubes: u32,
    pub points: u32,
}

/// Everything a backend must create before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub canvas: CanvasSize,
    pub clear_color: Color,
    pub counts: InstanceCounts,
    pub buffers: Vec<BufferSpec>,
    pub meshes: Vec<MeshSpec>,
    /// Entity kinds in draw order.
    pub entities: Vec<MeshKind>,
}

impl SceneLayout {
    pub fn buffer(&self, slot: BufferSlot) -> Option<&BufferSpec> {
        self.buffers.iter().find(|b| b.slot == slot)
    }

    pub fn mesh(&self, kind: MeshKind) -> Option<&MeshSpec> {
        self.meshes.iter().find(|m| m.kind == kind)
    }

    pub fn has_model(&self) -> bool {
        self.entities.contains(&MeshKind::Model)
    }

    /// Every resource a frame touches.
    pub fn required_keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = [
            PipelineKind::Drift,
            PipelineKind::Field,
            PipelineKind::Background,
            PipelineKind::Scene,
            PipelineKind::Points,
        ]
        .into_iter()
        .map(ResourceKey::Pipeline)
        .collect();
        keys.extend(
            [BindGroupKind::Field, BindGroupKind::Background, BindGroupKind::Points]
                .into_iter()
                .map(ResourceKey::BindGroup),
        );
        keys.extend(
            self.entities
                .iter()
                .map(|k| ResourceKey::BindGroup(BindGroupKind::Entity(*k))),
        );
        keys.extend(self.buffers.iter().map(|b| ResourceKey::Buffer(b.slot)));
        keys.extend(self.meshes.iter().map(|m| ResourceKey::Mesh(m.kind)));
        keys
    }
}

/// Host state for every entity plus the density points.
///
/// Draw order is fixed: Y axis, X lines, Z lines, cubes, density cubes, then
/// the model when one was supplied.
#[derive(Debug, Clone)]
pub struct Scene {
    canvas: CanvasSize,
    clear_color: Color,
    entities: Vec<SceneEntity>,
    points: DensityLayer,
}

impl Scene {
    pub fn build<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R, model: Option<Mesh>) -> Result<Self, KernelError> {
        let cube_mesh = cube_faces(CUBE_MODEL_Z);

        let x_lines = AxisLines::new(
            config.axis_line_count,
            config.axis_line_spacing,
            y0_plane_horizontal_line,
        )?;
        let z_lines = AxisLines::new(
            config.axis_line_count,
            config.axis_line_spacing,
            y0_plane_vertical_line,
        )?;

        let positions = random_cube_positions(rng, config.cube_count, config.cube_bound);
        let mut cubes = CubeInstances::new(cube_transforms(&positions), config.gravity)?;
        if let Some(color) = config.cube_color {
            cubes = cubes.with_uniform_color(color.to_vec4())?;
        }
        let density = CubeDensityInstances::new(config.density_spacing, &positions, &config.kernel)?;

        let pixels = random_pixel_points(rng, config.canvas, config.points_count);
        let points = DensityLayer::from_pixels(config.canvas, &pixels, config.points_count)?;

        let mut entities = vec![
            SceneEntity::Axis(MeshEntity::new(MeshKind::YAxis, y_axis_quad())),
            SceneEntity::AxisLines(AxisLinesEntity::new(MeshKind::XAxisLines, x_axis_quad(), x_lines)),
            SceneEntity::AxisLines(AxisLinesEntity::new(MeshKind::ZAxisLines, z_axis_quad(), z_lines)),
            SceneEntity::Cubes(CubesEntity::new(cube_mesh.clone(), cubes)),
            SceneEntity::DensityCubes(DensityCubesEntity::new(cube_mesh, density)),
        ];
        if let Some(mesh) = model {
            let mut model = MeshEntity::new(MeshKind::Model, mesh);
            model.set_scale(MODEL_SCALE);
            entities.push(SceneEntity::Model(model));
        }

        tracing::debug!(
            entities = entities.len(),
            cubes = config.cube_count,
            density_cubes = config.density_cube_count(),
            points = config.points_count,
            "scene built"
        );
        Ok(Self {
            canvas: config.canvas,
            clear_color: config.clear_color,
            entities,
            points,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn entities(&self) -> &[SceneEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [SceneEntity] {
        &mut self.entities
    }

    pub fn entity(&self, kind: MeshKind) -> Option<&SceneEntity> {
        self.entities.iter().find(|e| e.base().kind() == kind)
    }

    pub fn entity_mut(&mut self, kind: MeshKind) -> Option<&mut SceneEntity> {
        self.entities.iter_mut().find(|e| e.base().kind() == kind)
    }

    pub fn points(&self) -> &DensityLayer {
        &self.points
    }

    fn instance_count(&self, kind: MeshKind) -> u32 {
        self.entity(kind).map_or(0, |e| e.instance_count())
    }

    /// Buffers, meshes and counts, with initial contents taken from current state.
    pub fn layout(&self, camera: &Camera, projection: &Projection) -> SceneLayout {
        let mut buffers = vec![
            BufferSpec::floats(
                BufferSlot::Projection,
                BufferRole::Uniform,
                &projection.matrix().to_cols_array(),
            ),
            BufferSpec::floats(BufferSlot::Camera, BufferRole::Uniform, &camera.matrix().to_cols_array()),
            BufferSpec::floats(BufferSlot::Points, BufferRole::Storage, self.points.mirror()),
        ];
        let mut meshes = Vec::with_capacity(self.entities.len());

        for entity in &self.entities {
            let base = entity.base();
            let kind = base.kind();
            buffers.push(BufferSpec::floats(
                BufferSlot::Transform(kind),
                BufferRole::Uniform,
                &base.transform().to_cols_array(),
            ));
            buffers.push(BufferSpec {
                slot: BufferSlot::Params(kind),
                role: BufferRole::Uniform,
                initial: bytemuck::bytes_of::<EntityParams>(&base.params()).to_vec(),
            });
            meshes.push(MeshSpec {
                kind,
                mesh: base.mesh().clone(),
            });

            let group = match entity {
                SceneEntity::AxisLines(e) => Some(e.lines().group()),
                SceneEntity::Cubes(e) => Some(e.cubes().group()),
                SceneEntity::DensityCubes(e) => Some(e.cubes().group()),
                SceneEntity::Axis(_) | SceneEntity::Model(_) => None,
            };
            if let Some(group) = group {
                buffers.push(BufferSpec::floats(
                    BufferSlot::Instances(kind),
                    BufferRole::Uniform,
                    group.transform_mirror(),
                ));
                // the scene shader binds both color arrays for every entity
                if matches!(kind, MeshKind::Cubes | MeshKind::DensityCubes) {
                    let colors = if group.colors().is_some() {
                        group.color_mirror().to_vec()
                    } else {
                        vec![1.0; group.len() * 4]
                    };
                    buffers.push(BufferSpec::floats(BufferSlot::Colors(kind), BufferRole::Uniform, &colors));
                }
            }
        }

        SceneLayout {
            canvas: self.canvas,
            clear_color: self.clear_color,
            counts: InstanceCounts {
                x_lines: self.instance_count(MeshKind::XAxisLines),
                z_lines: self.instance_count(MeshKind::ZAxisLines),
                cubes: self.instance_count(MeshKind::Cubes),
                density_cubes: self.instance_count(MeshKind::DensityCubes),
                points: self.points.len() as u32,
            },
            buffers,
            meshes,
            entities: self.entities.iter().map(|e| e.base().kind()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config() -> SimConfig {
        SimConfig {
            cube_count: 5,
            density_spacing: 3,
            axis_line_count: 4,
            points_count: 7,
            ..SimConfig::default()
        }
    }

    fn build(model: Option<Mesh>) -> Scene {
        Scene::build(&small_config(), &mut StdRng::seed_from_u64(1), model).unwrap()
    }

    #[test]
    fn entity_order_is_fixed() {
        let scene = build(Some(Mesh::indexed("tri", vec![0.0; 9], vec![2, 1, 0])));
        let kinds: Vec<MeshKind> = scene.entities().iter().map(|e| e.base().kind()).collect();
        assert_eq!(
            kinds,
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
    fn model_starts_stretched_along_x() {
        let scene = build(Some(Mesh::new("tri", vec![0.0; 9])));
        let model = scene.entity(MeshKind::Model).unwrap();
        assert_eq!(model.base().transform().matrix(), glam::Mat4::from_scale(MODEL_SCALE));
    }

    #[test]
    fn model_is_optional() {
        let scene = build(None);
        assert_eq!(scene.entities().len(), 5);
        assert!(scene.entity(MeshKind::Model).is_none());
        assert!(!scene.layout(&Camera::default(), &Projection::default()).has_model());
    }

    #[test]
    fn same_seed_builds_same_scene() {
        let a = build(None);
        let b = build(None);
        assert_eq!(a.points().mirror(), b.points().mirror());
        let la = a.layout(&Camera::default(), &Projection::default());
        let lb = b.layout(&Camera::default(), &Projection::default());
        assert_eq!(la, lb);
    }

    #[test]
    fn layout_sizes_match_host_arrays() {
        let scene = build(None);
        let layout = scene.layout(&Camera::default(), &Projection::default());
        assert_eq!(
            layout.counts,
            InstanceCounts {
                x_lines: 4,
                z_lines: 4,
                cubes: 5,
                density_cubes: 27,
                points: 7,
            }
        );
        let size = |slot| layout.buffer(slot).map(BufferSpec::size);
        assert_eq!(size(BufferSlot::Points), Some(7 * 16));
        assert_eq!(size(BufferSlot::Instances(MeshKind::Cubes)), Some(5 * 64));
        assert_eq!(size(BufferSlot::Colors(MeshKind::Cubes)), Some(5 * 16));
        assert_eq!(size(BufferSlot::Colors(MeshKind::DensityCubes)), Some(27 * 16));
        assert_eq!(size(BufferSlot::Params(MeshKind::YAxis)), Some(16));
        assert_eq!(size(BufferSlot::Instances(MeshKind::YAxis)), None);
        assert_eq!(layout.buffer(BufferSlot::Points).map(|b| b.role), Some(BufferRole::Storage));
    }

    #[test]
    fn required_keys_cover_every_entity_bind_group() {
        let layout = build(None).layout(&Camera::default(), &Projection::default());
        let keys = layout.required_keys();
        for kind in &layout.entities {
            assert!(keys.contains(&ResourceKey::BindGroup(BindGroupKind::Entity(*kind))));
            assert!(keys.contains(&ResourceKey::Mesh(*kind)));
        }
        assert!(keys.contains(&ResourceKey::Pipeline(PipelineKind::Drift)));
        assert!(keys.contains(&ResourceKey::Pipeline(PipelineKind::Field)));
        assert!(!keys.contains(&ResourceKey::BindGroup(BindGroupKind::Entity(MeshKind::Model))));
    }

    #[test]
    fn cube_color_sets_instance_flag() {
        let config = SimConfig {
            cube_color: Some(Color::rgba(0.0, 1.0, 0.0, 1.0)),
            ..small_config()
        };
        let scene = Scene::build(&config, &mut StdRng::seed_from_u64(1), None).unwrap();
        let cubes = scene.entity(MeshKind::Cubes).unwrap();
        assert_eq!(cubes.base().params().flags, crate::entity::PARAMS_INSTANCE_COLORS);
    }
}
