use glam::Mat4;

use crate::KernelError;
use crate::instances::InstanceGroup;

/// `count` evenly spaced copies of one line mesh.
///
/// Copy `i` sits at coordinate `(i - count / 2) * spacing`; the caller's
/// placement function turns that coordinate into a transform. Static after
/// construction.
#[derive(Debug, Clone)]
pub struct AxisLines {
    group: InstanceGroup,
    spacing: f32,
}

impl AxisLines {
    pub fn new(count: usize, spacing: f32, place: impl Fn(f32) -> Mat4) -> Result<Self, KernelError> {
        let half = count as f32 / 2.0;
        let transforms = (0..count)
            .map(|i| place((i as f32 - half) * spacing))
            .collect();
        Ok(Self {
            group: InstanceGroup::new(transforms)?,
            spacing,
        })
    }

    pub fn group(&self) -> &InstanceGroup {
        &self.group
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{y0_plane_horizontal_line, y0_plane_vertical_line};

    #[test]
    fn lines_are_centered_and_evenly_spaced() {
        let lines = AxisLines::new(20, 0.2, y0_plane_horizontal_line).unwrap();
        let zs: Vec<f32> = lines.group().transforms().iter().map(|m| m.w_axis.z).collect();
        assert_eq!(zs.len(), 20);
        assert!((zs[0] - -2.0).abs() < 1e-6);
        assert!(zs[10].abs() < 1e-6);
        for pair in zs.windows(2) {
            assert!((pair[1] - pair[0] - 0.2).abs() < 1e-5);
        }
    }

    #[test]
    fn placement_function_chooses_axis() {
        let lines = AxisLines::new(4, 1.0, y0_plane_vertical_line).unwrap();
        let m = lines.group().transforms()[3];
        assert_eq!(m.w_axis.x, 1.0);
        assert_eq!(m.w_axis.z, 0.0);
    }

    #[test]
    fn zero_lines_is_an_error() {
        assert!(AxisLines::new(0, 0.2, y0_plane_vertical_line).is_err());
    }
}
