use crate::Mesh;

/// Half length of an axis quad along its own axis.
pub const AXIS_HALF_LENGTH: f32 = 10.0;
/// Thickness of an axis quad.
pub const AXIS_WIDTH: f32 = 0.01;
/// Edge length of the cube model.
pub const CUBE_SIDE: f32 = 2.0;
/// Z offset of the cube model's front face.
pub const CUBE_MODEL_Z: f32 = -4.0;

/// Thin quad spanning the X axis, lying in the z = 0 plane.
pub fn x_axis_quad() -> Mesh {
    let (l, hw) = (AXIS_HALF_LENGTH, AXIS_WIDTH / 2.0);
    #[rustfmt::skip]
    let positions = vec![
        -l,  hw, 0.0,
         l,  hw, 0.0,
        -l, -hw, 0.0,

        -l, -hw, 0.0,
         l,  hw, 0.0,
         l, -hw, 0.0,
    ];
    Mesh::new("x_axis", positions)
}

/// Thin quad spanning the Y axis, lying in the z = 0 plane.
pub fn y_axis_quad() -> Mesh {
    let (l, hw) = (AXIS_HALF_LENGTH, AXIS_WIDTH / 2.0);
    #[rustfmt::skip]
    let positions = vec![
        -hw,  l, 0.0,
         hw,  l, 0.0,
        -hw, -l, 0.0,

        -hw, -l, 0.0,
         hw,  l, 0.0,
         hw, -l, 0.0,
    ];
    Mesh::new("y_axis", positions)
}

/// Thin quad spanning the Z axis, lying in the x = 0 plane.
pub fn z_axis_quad() -> Mesh {
    let (l, hw) = (AXIS_HALF_LENGTH, AXIS_WIDTH / 2.0);
    #[rustfmt::skip]
    let positions = vec![
        0.0,  hw,  l,
        0.0,  hw, -l,
        0.0, -hw, -l,

        0.0, -hw, -l,
        0.0,  hw,  l,
        0.0, -hw,  l,
    ];
    Mesh::new("z_axis", positions)
}

/// 36-vertex cube (six faces, two triangles each) with its front face at `z`
/// and its back face at `z - CUBE_SIDE`.
pub fn cube_faces(z: f32) -> Mesh {
    let h = CUBE_SIDE / 2.0;
    let b = z - CUBE_SIDE;
    #[rustfmt::skip]
    let positions = vec![
        // front
        -h, -h, z,   -h,  h, z,    h, -h, z,
        -h,  h, z,    h,  h, z,    h, -h, z,
        // back
        -h, -h, b,   -h,  h, b,    h, -h, b,
        -h,  h, b,    h,  h, b,    h, -h, b,
        // top
        -h,  h, b,   -h,  h, z,    h,  h, z,
        -h,  h, b,    h,  h, b,    h,  h, z,
        // right
         h,  h, z,    h,  h, b,    h, -h, z,
         h, -h, b,    h,  h, b,    h, -h, z,
        // bottom
        -h, -h, b,   -h, -h, z,    h, -h, z,
        -h, -h, b,    h, -h, b,    h, -h, z,
        // left
        -h,  h, z,   -h,  h, b,   -h, -h, z,
        -h, -h, b,   -h,  h, b,   -h, -h, z,
    ];
    Mesh::new("cube", positions)
}
