//! WGSL sources.
//!
//! Uniform arrays are sized per scene, so the scene, field and points
//! shaders are templates. [`specialize`] fills the `{X_LINES}`, `{Z_LINES}`,
//! `{CUBES}`, `{DENSITY_CUBES}` and `{POINTS}` placeholders.

use densim_render::InstanceCounts;

/// Scene shader: axes, cube groups and the optional model.
///
/// Bindings (group 0, vertex stage): 0 projection, 1 camera, 2 mesh params,
/// 3 x-line instances, 4 z-line instances, 5 entity transform, 6 cube
/// instances, 7 cube colors, 8 density cube instances, 9 density cube colors.
pub const SCENE_SHADER: &str = r#"
struct Params {
    mesh_type: u32,
    flags: u32,
    _pad0: u32,
    _pad1: u32,
};

@group(0) @binding(0) var<uniform> projection: mat4x4<f32>;
@group(0) @binding(1) var<uniform> camera: mat4x4<f32>;
@group(0) @binding(2) var<uniform> params: Params;
@group(0) @binding(3) var<uniform> x_lines: array<mat4x4<f32>, {X_LINES}>;
@group(0) @binding(4) var<uniform> z_lines: array<mat4x4<f32>, {Z_LINES}>;
@group(0) @binding(5) var<uniform> transform: mat4x4<f32>;
@group(0) @binding(6) var<uniform> cubes: array<mat4x4<f32>, {CUBES}>;
@group(0) @binding(7) var<uniform> cube_colors: array<vec4<f32>, {CUBES}>;
@group(0) @binding(8) var<uniform> density_cubes: array<mat4x4<f32>, {DENSITY_CUBES}>;
@group(0) @binding(9) var<uniform> density_colors: array<vec4<f32>, {DENSITY_CUBES}>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @builtin(instance_index) instance: u32,
    @location(0) position: vec3<f32>,
) -> VertexOutput {
    var instance_matrix = mat4x4<f32>(
        vec4<f32>(1.0, 0.0, 0.0, 0.0),
        vec4<f32>(0.0, 1.0, 0.0, 0.0),
        vec4<f32>(0.0, 0.0, 1.0, 0.0),
        vec4<f32>(0.0, 0.0, 0.0, 1.0),
    );
    var color = vec4<f32>(0.85, 0.85, 0.85, 1.0);
    let per_instance_colors = (params.flags & 1u) != 0u;

    switch params.mesh_type {
        case 0u: {
            instance_matrix = x_lines[instance];
            color = vec4<f32>(0.9, 0.35, 0.35, 1.0);
        }
        case 1u: {
            color = vec4<f32>(0.35, 0.9, 0.35, 1.0);
        }
        case 2u: {
            instance_matrix = z_lines[instance];
            color = vec4<f32>(0.35, 0.35, 0.9, 1.0);
        }
        case 3u: {
            instance_matrix = cubes[instance];
            if per_instance_colors {
                color = cube_colors[instance];
            } else {
                color = vec4<f32>(0.9, 0.6, 0.2, 1.0);
            }
        }
        case 4u: {
            instance_matrix = density_cubes[instance];
            if per_instance_colors {
                color = density_colors[instance];
            }
        }
        default: {}
    }

    var out: VertexOutput;
    out.clip_position = projection * camera * transform * instance_matrix * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Full-screen quad sampling the density texture.
///
/// Bindings (group 0, fragment stage): 0 sampler, 1 density texture.
pub const BACKGROUND_SHADER: &str = r#"
@group(0) @binding(0) var density_sampler: sampler;
@group(0) @binding(1) var density_texture: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index];

    var out: VertexOutput;
    // far plane, behind every scene fragment
    out.clip_position = vec4<f32>(corner, 1.0, 1.0);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(density_texture, density_sampler, in.uv);
}
"#;

/// Compute shader with two entry points sharing one bind group: `advance`
/// moves the density points, then `main` writes the density texture from
/// them. They run as separate dispatches.
///
/// Bindings (group 0, compute stage): 0 density texture (write-only
/// storage), 1 projection, 2 camera, 3 points (read-write storage).
pub const FIELD_SHADER: &str = r#"
const POINTS: u32 = {POINTS}u;
const RADIUS: f32 = 0.2;
const PI: f32 = 3.14159265;
const DRIFT: f32 = 0.002;

@group(0) @binding(0) var density_texture: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(1) var<uniform> projection: mat4x4<f32>;
@group(0) @binding(2) var<uniform> camera: mat4x4<f32>;
@group(0) @binding(3) var<storage, read_write> points: array<vec4<f32>, {POINTS}>;

fn smoothing(d: f32) -> f32 {
    let volume = PI * pow(RADIUS, 8.0) / 4.0;
    let value = max(0.0, RADIUS * RADIUS - d * d);
    return value * value * value / volume;
}

@compute @workgroup_size(64)
fn advance(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= POINTS {
        return;
    }
    var point = points[id.x];
    point.y = point.y - DRIFT;
    if point.y < -1.0 {
        point.y = 1.0;
    }
    points[id.x] = point;
}

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(density_texture);
    if id.x >= size.x || id.y >= size.y {
        return;
    }

    let uv = (vec2<f32>(id.xy) + vec2<f32>(0.5)) / vec2<f32>(size);
    let ndc = vec2<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);

    var density = 0.0;
    for (var i = 0u; i < POINTS; i = i + 1u) {
        density = density + smoothing(distance(ndc, points[i].xy));
    }
    let level = clamp(density / smoothing(0.0), 0.0, 1.0);
    textureStore(density_texture, vec2<i32>(id.xy), vec4<f32>(level, level * 0.4, 1.0 - level, 1.0));
}
"#;

/// Density points as small screen-space quads, one instance per point.
///
/// Bindings (group 0, vertex stage): 0 points (read-only storage).
pub const POINTS_SHADER: &str = r#"
const POINT_SIZE: f32 = 0.006;

@group(0) @binding(0) var<storage, read> points: array<vec4<f32>, {POINTS}>;

@vertex
fn vs_main(
    @builtin(vertex_index) vertex: u32,
    @builtin(instance_index) instance: u32,
) -> @builtin(position) vec4<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let center = points[instance].xy;
    return vec4<f32>(center + corners[vertex] * POINT_SIZE, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

/// Fills the array-size placeholders of a shader template.
///
/// WGSL rejects zero-length arrays, so empty groups are sized 1.
pub fn specialize(template: &str, counts: &InstanceCounts) -> String {
    let size = |n: u32| n.max(1).to_string();
    template
        .replace("{X_LINES}", &size(counts.x_lines))
        .replace("{Z_LINES}", &size(counts.z_lines))
        .replace("{CUBES}", &size(counts.cubes))
        .replace("{DENSITY_CUBES}", &size(counts.density_cubes))
        .replace("{POINTS}", &size(counts.points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> InstanceCounts {
        InstanceCounts {
            x_lines: 20,
            z_lines: 20,
            cubes: 100,
            density_cubes: 1000,
            points: 300,
        }
    }

    #[test]
    fn specialize_leaves_no_placeholders() {
        for template in [SCENE_SHADER, BACKGROUND_SHADER, FIELD_SHADER, POINTS_SHADER] {
            let source = specialize(template, &counts());
            for placeholder in ["{X_LINES}", "{Z_LINES}", "{CUBES}", "{DENSITY_CUBES}", "{POINTS}"] {
                assert!(!source.contains(placeholder), "{placeholder} left in shader");
            }
        }
    }

    #[test]
    fn scene_arrays_take_instance_counts() {
        let source = specialize(SCENE_SHADER, &counts());
        assert!(source.contains("array<mat4x4<f32>, 20>"));
        assert!(source.contains("array<mat4x4<f32>, 100>"));
        assert!(source.contains("array<vec4<f32>, 1000>"));
    }

    #[test]
    fn empty_groups_are_sized_one() {
        let source = specialize(
            FIELD_SHADER,
            &InstanceCounts {
                points: 0,
                ..counts()
            },
        );
        assert!(source.contains("const POINTS: u32 = 1u;"));
    }

    #[test]
    fn entry_points_are_fixed() {
        for raster in [SCENE_SHADER, BACKGROUND_SHADER, POINTS_SHADER] {
            assert!(raster.contains("fn vs_main("));
            assert!(raster.contains("fn fs_main("));
        }
        assert!(FIELD_SHADER.contains("fn main("));
        assert!(FIELD_SHADER.contains("fn advance("));
    }

    #[test]
    fn field_entry_only_reads_points() {
        let main = FIELD_SHADER.split("fn main(").nth(1).unwrap();
        assert!(main.contains("points[i]"));
        assert!(!main.contains("points[id.x] ="));

        let advance = FIELD_SHADER.split("fn advance(").nth(1).unwrap();
        let advance = advance.split("fn main(").next().unwrap();
        assert!(advance.contains("points[id.x] = point;"));
        assert!(FIELD_SHADER.contains("@compute @workgroup_size(64)\nfn advance("));
    }
}
