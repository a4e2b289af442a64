//! Shared value types used across the render, physics and input layers.
//!
//! # Invariants
//! - Types here carry no behavior tied to a particular subsystem.
//! - `Transform` is the single pose representation exchanged between
//!   physics readback and render nodes.

mod types;

pub use types::{Color, Ray, Transform, Viewport, WorldPoint};
