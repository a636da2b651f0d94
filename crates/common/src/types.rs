use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Size of the render canvas in physical pixels.
///
/// Canvas-space math (pixel to NDC mapping, compute dispatch grid) is fixed to
/// this size for the lifetime of a run, even if the window surface is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Number of 8x8 workgroups needed to cover the canvas, per axis.
    pub fn workgroups_8x8(&self) -> (u32, u32) {
        (self.width.div_ceil(8), self.height.div_ceil(8))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::from_array(self.to_array())
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_canvas_is_800_by_600() {
        let c = CanvasSize::default();
        assert_eq!((c.width, c.height), (800, 600));
        assert!((c.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn workgroups_round_up() {
        assert_eq!(CanvasSize::new(800, 600).workgroups_8x8(), (100, 75));
        assert_eq!(CanvasSize::new(801, 1).workgroups_8x8(), (101, 1));
    }

    #[test]
    fn color_roundtrips_through_array() {
        let c = Color::from([0.1, 0.2, 0.3, 1.0]);
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(c.to_vec4().w, 1.0);
    }
}
