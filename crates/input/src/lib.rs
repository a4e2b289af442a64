//! Input Mapper: converts pointer events into world points on the ground.
//!
//! # Invariants
//! - Only the ground surface is tested; spawned objects never block a click.
//! - A ray that misses the ground is `Ok(None)`, never an error.

mod mapper;
mod pointer;

pub use mapper::{GroundSurface, map_pointer_to_world};
pub use pointer::{InputError, PointerEvent, pointer_to_ndc};
