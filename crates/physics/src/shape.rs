use glam::Vec3;
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Collision shape of a dynamic body, in the body's local frame.
///
/// Cylinders and cones are aligned with +Y; the cone's apex points up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
    Cone { half_height: f32, radius: f32 },
}

impl CollisionShape {
    /// Half-size of the local axis-aligned bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Self::Cuboid { half_extents } => half_extents,
            Self::Ball { radius } => Vec3::splat(radius),
            Self::Cylinder {
                half_height,
                radius,
            }
            | Self::Cone {
                half_height,
                radius,
            } => Vec3::new(radius, half_height, radius),
        }
    }

    pub(crate) fn collider_builder(&self) -> rapier::ColliderBuilder {
        match *self {
            Self::Cuboid { half_extents: h } => rapier::ColliderBuilder::cuboid(h.x, h.y, h.z),
            Self::Ball { radius } => rapier::ColliderBuilder::ball(radius),
            Self::Cylinder {
                half_height,
                radius,
            } => rapier::ColliderBuilder::cylinder(half_height, radius),
            Self::Cone {
                half_height,
                radius,
            } => rapier::ColliderBuilder::cone(half_height, radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_extents_per_shape() {
        assert_eq!(
            CollisionShape::Cuboid {
                half_extents: Vec3::splat(0.5)
            }
            .half_extents(),
            Vec3::splat(0.5)
        );
        assert_eq!(
            CollisionShape::Cone {
                half_height: 0.5,
                radius: 0.25
            }
            .half_extents(),
            Vec3::new(0.25, 0.5, 0.25)
        );
    }

    #[test]
    fn collider_aabb_matches_half_extents() {
        let shapes = [
            CollisionShape::Cuboid {
                half_extents: Vec3::new(0.5, 1.0, 1.5),
            },
            CollisionShape::Ball { radius: 0.5 },
            CollisionShape::Cylinder {
                half_height: 0.5,
                radius: 0.5,
            },
            CollisionShape::Cone {
                half_height: 0.5,
                radius: 0.5,
            },
        ];
        for shape in shapes {
            let collider = shape.collider_builder().build();
            let aabb = collider.compute_aabb();
            let extents = aabb.half_extents();
            let diff = (Vec3::new(extents.x, extents.y, extents.z) - shape.half_extents()).abs();
            assert!(diff.max_element() < 1e-4, "{shape:?} off by {diff}");
        }
    }
}
