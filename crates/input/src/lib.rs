//! Host-shell input: keys map to actions, actions accumulate into a rig.
//!
//! # Invariants
//! - The window layer never touches camera or model state directly; it feeds
//!   keys in and reads the rig out.
//! - Camera angles accumulate in degrees, model angles in radians.

pub mod action;
pub mod rig;

pub use action::{Action, Axis, Key, action_for_key};
pub use rig::{CameraRig, RigSteps};
