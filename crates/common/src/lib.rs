//! Shared value types used across the density simulation crates.

pub mod types;

pub use types::{CanvasSize, Color};
