//! Rendering Adapter: renderer-agnostic scene graph.
//!
//! The scene is a flat set of mesh nodes plus lights. Backends (text, wgpu)
//! read a [`Scene`] and a [`PerspectiveCamera`] and produce output; they
//! never mutate either.
//!
//! # Invariants
//! - Mesh handles are never reused within one scene.
//! - Iteration order over meshes is insertion order.

mod camera;
mod controls;
mod geometry;
mod renderer;
mod scene;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use geometry::{Geometry, GeometryKey, MeshData};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{DirectionalLight, Material, MeshHandle, MeshNode, Scene};
