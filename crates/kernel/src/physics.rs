//! Gravity with a single damped ground-plane bounce.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::KernelError;
use crate::instances::InstanceGroup;

/// Integration constants. The defaults are tuned for visual scale, not SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityParams {
    /// Vertical acceleration.
    pub gravity: f32,
    /// The floor sits at `-bound_y`.
    pub bound_y: f32,
    /// Fraction of vertical speed kept after a bounce.
    pub collision_damping: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            gravity: -0.0008,
            bound_y: 2.0,
            collision_damping: 0.9,
        }
    }
}

/// Converts host frame timestamps (milliseconds) into step lengths (seconds).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    last_seconds: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `time_ms` and return the seconds elapsed since the previous call.
    ///
    /// The first call only records the timestamp and returns `None`, so the
    /// time since process start never shows up as one huge step.
    pub fn advance(&mut self, time_ms: f64) -> Option<f32> {
        let seconds = time_ms / 1000.0;
        let previous = self.last_seconds.replace(seconds);
        previous.map(|last| (seconds - last) as f32)
    }

    pub fn last_seconds(&self) -> Option<f64> {
        self.last_seconds
    }
}

/// Advance one instance by `dt` seconds and resolve the floor contact.
///
/// Returns `true` when the instance bounced this step.
pub fn step_instance(matrix: &mut Mat4, velocity: &mut Vec3, dt: f32, params: &GravityParams) -> bool {
    *velocity += Vec3::new(0.0, params.gravity, 0.0) * dt;
    let delta = *velocity * dt;
    matrix.w_axis += Vec4::new(delta.x, delta.y, delta.z, 0.0);

    let floor = -params.bound_y;
    if matrix.w_axis.y < floor {
        matrix.w_axis.y = floor;
        if velocity.y < 0.0 {
            velocity.y *= -params.collision_damping;
            return true;
        }
    }
    false
}

/// Falling cubes: an instance group integrated under gravity every frame.
#[derive(Debug, Clone)]
pub struct CubeInstances {
    group: InstanceGroup,
    clock: FrameClock,
    params: GravityParams,
    bounces: u64,
}

impl CubeInstances {
    pub fn new(transforms: Vec<Mat4>, params: GravityParams) -> Result<Self, KernelError> {
        Ok(Self {
            group: InstanceGroup::new(transforms)?,
            clock: FrameClock::new(),
            params,
            bounces: 0,
        })
    }

    /// Give every cube the same color.
    pub fn with_uniform_color(mut self, color: Vec4) -> Result<Self, KernelError> {
        let n = self.group.len();
        self.group.set_colors(vec![color; n])?;
        Ok(self)
    }

    pub fn group(&self) -> &InstanceGroup {
        &self.group
    }

    pub fn params(&self) -> &GravityParams {
        &self.params
    }

    /// Total bounces since construction.
    pub fn bounces(&self) -> u64 {
        self.bounces
    }

    /// Overwrite one instance's velocity.
    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) {
        let (_, velocities) = self.group.states_mut();
        if let Some(v) = velocities.get_mut(index) {
            *v = velocity;
        }
    }

    /// Per-frame entry point. Skips integration on the first call.
    pub fn update(&mut self, time_ms: f64) {
        match self.clock.advance(time_ms) {
            Some(dt) => self.step(dt),
            None => tracing::trace!(time_ms, "first frame, integration skipped"),
        }
    }

    /// Integrate every instance by `dt` seconds, then refresh the mirror.
    pub fn step(&mut self, dt: f32) {
        let params = self.params;
        let (transforms, velocities) = self.group.states_mut();
        let mut bounced = 0;
        for (matrix, velocity) in transforms.iter_mut().zip(velocities.iter_mut()) {
            if step_instance(matrix, velocity, dt, &params) {
                bounced += 1;
            }
        }
        self.bounces += bounced;
        self.group.refresh_transforms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::translation;

    fn at_height(ys: &[f32]) -> Vec<Mat4> {
        ys.iter().map(|y| translation(Vec3::new(0.0, *y, 0.0))).collect()
    }

    #[test]
    fn first_advance_returns_none() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(1500.0), None);
        assert_eq!(clock.last_seconds(), Some(1.5));
        let dt = clock.advance(1750.0).unwrap();
        assert!((dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn first_update_leaves_transforms_untouched() {
        let mut cubes = CubeInstances::new(at_height(&[0.0, 1.0]), GravityParams::default()).unwrap();
        let before = cubes.group().transform_mirror().to_vec();
        cubes.update(123_456.0);
        assert_eq!(cubes.group().transform_mirror(), before.as_slice());
        assert!(cubes.group().velocities().iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn gravity_accelerates_downward() {
        let mut cubes = CubeInstances::new(at_height(&[0.0]), GravityParams::default()).unwrap();
        cubes.update(0.0);
        cubes.update(1000.0);
        let v = cubes.group().velocities()[0];
        assert!((v.y - -0.0008).abs() < 1e-9);
        let y = cubes.group().transforms()[0].w_axis.y;
        assert!((y - -0.0008).abs() < 1e-9);
    }

    #[test]
    fn floor_clamps_and_damps() {
        let mut cubes = CubeInstances::new(at_height(&[-1.9, 0.0]), GravityParams::default()).unwrap();
        cubes.set_velocity(0, Vec3::new(0.0, -1.0, 0.0));
        cubes.step(0.2);

        let m = cubes.group().transforms()[0];
        assert_eq!(m.w_axis.y, -2.0);
        let vy = cubes.group().velocities()[0].y;
        let incoming = -1.0 + -0.0008 * 0.2;
        assert!((vy - -0.9 * incoming).abs() < 1e-6, "{vy}");
        assert!((vy - 0.900).abs() < 1e-3);
        assert_eq!(cubes.bounces(), 1);

        // the other instance only felt gravity
        let other = cubes.group().transforms()[1].w_axis.y;
        assert!(other > -0.001 && other < 0.0);
        // mirror was refreshed
        assert_eq!(cubes.group().transform_mirror()[13], -2.0);
    }

    #[test]
    fn upward_velocity_below_floor_is_clamped_not_flipped() {
        let params = GravityParams::default();
        let mut m = translation(Vec3::new(0.0, -3.0, 0.0));
        let mut v = Vec3::new(0.0, 5.0, 0.0);
        let bounced = step_instance(&mut m, &mut v, 0.01, &params);
        assert!(!bounced);
        assert_eq!(m.w_axis.y, -2.0);
        assert!(v.y > 0.0);
    }

    #[test]
    fn scale_does_not_change_displacement() {
        let params = GravityParams::default();
        let mut m = translation(Vec3::ZERO) * Mat4::from_scale(Vec3::splat(0.1));
        let mut v = Vec3::new(1.0, 0.0, 0.0);
        step_instance(&mut m, &mut v, 1.0, &params);
        assert!((m.w_axis.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_color_covers_every_instance() {
        let cubes = CubeInstances::new(at_height(&[0.0, 0.0, 0.0]), GravityParams::default())
            .unwrap()
            .with_uniform_color(Vec4::new(1.0, 0.0, 0.0, 1.0))
            .unwrap();
        assert_eq!(cubes.group().colors().map(|c| c.len()), Some(3));
    }
}
