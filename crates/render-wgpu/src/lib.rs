//! wgpu render backend.
//!
//! Draws every mesh node of a [`shapefall_render::Scene`], instanced per
//! distinct geometry and lit by the scene's first directional light.
//!
//! # Invariants
//! - Renderer never mutates the scene or the camera.
//! - GPU meshes are uploaded once per distinct geometry and reused.

mod gpu;
mod shaders;

pub use gpu::{WgpuFrame, WgpuRenderer};
