use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shapefall_common::Color;
use shapefall_physics::CollisionShape;
use shapefall_render::{Geometry, Material};

/// Size shared by every shape kind: box half-extent, sphere radius, and the
/// radius and half-height of cylinders and cones.
pub const SHAPE_SIZE: f32 = 0.5;

const SEGMENTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cylinder,
    Cone,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [Self::Box, Self::Sphere, Self::Cylinder, Self::Cone];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
        }
    }
}

/// Form and dimensions of a spawnable shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeDescriptor {
    Box { half_extent: f32 },
    Sphere { radius: f32 },
    Cylinder { radius: f32, half_height: f32 },
    /// A cylinder with zero top radius.
    Cone { radius: f32, half_height: f32 },
}

impl ShapeDescriptor {
    /// Descriptor of `kind` at [`SHAPE_SIZE`].
    pub fn unit(kind: ShapeKind) -> Self {
        let s = SHAPE_SIZE;
        match kind {
            ShapeKind::Box => Self::Box { half_extent: s },
            ShapeKind::Sphere => Self::Sphere { radius: s },
            ShapeKind::Cylinder => Self::Cylinder {
                radius: s,
                half_height: s,
            },
            ShapeKind::Cone => Self::Cone {
                radius: s,
                half_height: s,
            },
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box { .. } => ShapeKind::Box,
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::Cylinder { .. } => ShapeKind::Cylinder,
            Self::Cone { .. } => ShapeKind::Cone,
        }
    }

    pub fn geometry(&self) -> Geometry {
        match *self {
            Self::Box { half_extent } => {
                let side = half_extent * 2.0;
                Geometry::Box {
                    width: side,
                    height: side,
                    depth: side,
                }
            }
            Self::Sphere { radius } => Geometry::Sphere {
                radius,
                width_segments: SEGMENTS,
                height_segments: SEGMENTS,
            },
            Self::Cylinder {
                radius,
                half_height,
            } => Geometry::Cylinder {
                radius_top: radius,
                radius_bottom: radius,
                height: half_height * 2.0,
                radial_segments: SEGMENTS,
            },
            Self::Cone {
                radius,
                half_height,
            } => Geometry::cone(radius, half_height * 2.0, SEGMENTS),
        }
    }

    pub fn collision_shape(&self) -> CollisionShape {
        match *self {
            Self::Box { half_extent } => CollisionShape::Cuboid {
                half_extents: Vec3::splat(half_extent),
            },
            Self::Sphere { radius } => CollisionShape::Ball { radius },
            Self::Cylinder {
                radius,
                half_height,
            } => CollisionShape::Cylinder {
                half_height,
                radius,
            },
            Self::Cone {
                radius,
                half_height,
            } => CollisionShape::Cone {
                half_height,
                radius,
            },
        }
    }
}

/// Render half of a shape: what the mesh node is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderDescriptor {
    pub geometry: Geometry,
    pub material: Material,
}

/// A render descriptor and a collision shape encoding the same form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePair {
    pub descriptor: ShapeDescriptor,
    pub render: RenderDescriptor,
    pub collision: CollisionShape,
}

impl ShapePair {
    pub fn new(descriptor: ShapeDescriptor, color: Color) -> Self {
        Self {
            descriptor,
            render: RenderDescriptor {
                geometry: descriptor.geometry(),
                material: Material::standard(color),
            },
            collision: descriptor.collision_shape(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.descriptor.kind()
    }
}

/// Produces random shapes. Kind and color are drawn independently and
/// uniformly.
#[derive(Debug, Clone)]
pub struct ShapeFactory {
    rng: ChaCha8Rng,
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeFactory {
    /// Factory seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Factory with a fixed seed; the same seed yields the same shape sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn create_random_shape(&mut self) -> ShapePair {
        let kind = ShapeKind::ALL[self.rng.gen_range(0..ShapeKind::ALL.len())];
        let color = Color::from_hex(self.rng.gen_range(0..=0xff_ffff));
        let pair = ShapePair::new(ShapeDescriptor::unit(kind), color);
        tracing::trace!(kind = kind.name(), color = color.to_hex(), "shape created");
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn render_and_collision_extents_agree() {
        for kind in ShapeKind::ALL {
            let pair = ShapePair::new(ShapeDescriptor::unit(kind), Color::WHITE);
            let render = pair.render.geometry.half_extents();
            let collision = pair.collision.half_extents();
            assert!((render - collision).abs().max_element() < 1e-6, "{kind:?}: {render} vs {collision}");
            assert_eq!(pair.kind(), kind);
        }
    }

    #[test]
    fn unit_box_is_one_unit_wide() {
        let geometry = ShapeDescriptor::unit(ShapeKind::Box).geometry();
        assert_eq!(
            geometry,
            Geometry::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0
            }
        );
    }

    #[test]
    fn cone_is_degenerate_cylinder_on_both_sides() {
        let pair = ShapePair::new(ShapeDescriptor::unit(ShapeKind::Cone), Color::WHITE);
        assert!(pair.render.geometry.is_cone());
        assert_eq!(
            pair.collision,
            CollisionShape::Cone {
                half_height: 0.5,
                radius: 0.5
            }
        );
    }

    #[test]
    fn every_kind_is_drawn() {
        let mut factory = ShapeFactory::with_seed(3);
        let mut counts: HashMap<ShapeKind, usize> = HashMap::new();
        for _ in 0..4000 {
            *counts.entry(factory.create_random_shape().kind()).or_default() += 1;
        }
        for kind in ShapeKind::ALL {
            let n = counts.get(&kind).copied().unwrap_or(0);
            assert!(n > 800, "{kind:?} drawn only {n} times");
        }
    }

    #[test]
    fn colors_vary() {
        let mut factory = ShapeFactory::with_seed(9);
        let colors: HashSet<u32> = (0..100)
            .map(|_| factory.create_random_shape().render.material.color.to_hex())
            .collect();
        assert!(colors.len() > 90);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ShapeFactory::with_seed(42);
        let mut b = ShapeFactory::with_seed(42);
        for _ in 0..50 {
            assert_eq!(a.create_random_shape(), b.create_random_shape());
        }
    }
}
