//! Physics Adapter: rigid-body simulation backed by rapier3d.
//!
//! # Invariants
//! - Each call to [`PhysicsWorld::step`] advances simulated time by exactly
//!   one configured timestep; there is no accumulator or catch-up.
//! - Poses cross this boundary as [`shapefall_common::Transform`]; rapier
//!   types never leak into callers.

mod shape;
mod world;

pub use shape::CollisionShape;
pub use world::{BodyHandle, PhysicsConfig, PhysicsWorld};
