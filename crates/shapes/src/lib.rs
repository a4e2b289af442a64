//! Shape Factory: random shapes as matched render/collision pairs.
//!
//! # Invariants
//! - A [`ShapeDescriptor`] is the single source of dimensions; render geometry
//!   and collision shape are both derived from it, so visual and physical
//!   extents always agree.

mod factory;

pub use factory::{RenderDescriptor, SHAPE_SIZE, ShapeDescriptor, ShapeFactory, ShapeKind, ShapePair};
