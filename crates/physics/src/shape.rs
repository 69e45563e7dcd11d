//! Shape mapping: which collision shape stands in for each object kind.
//!
//! Most kinds collide as a box sized to their scale. Only near-symmetric spheres keep a true
//! sphere, and cylinders become capsules along their local z axis.

use crate::config::PhysicsConfig;
use glam::Vec3;
use rapier3d::prelude::SharedShape;
use scene::{ObjectKind, SceneObject};

/// Collision primitive synthesized for one primitive object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    /// Box with the given full side lengths.
    Cuboid { size: Vec3 },
    Ball { radius: f32 },
    /// Capsule along local z. `length` is the segment between the cap centers.
    Capsule { length: f32, radius: f32 },
}

impl CollisionShape {
    /// Map a primitive kind and scale to its collision shape. Groupings have no shape.
    pub fn for_kind(kind: ObjectKind, scale: Vec3, config: &PhysicsConfig) -> Option<Self> {
        let scale = scale.abs().max(Vec3::splat(config.min_extent));
        let shape = match kind {
            ObjectKind::Grouping | ObjectKind::Avatar => return None,
            ObjectKind::Sphere if is_symmetric(scale, config.sphere_symmetry_ratio) => {
                CollisionShape::Ball {
                    radius: (scale.x + scale.y + scale.z) / 3.0,
                }
            }
            ObjectKind::Cylinder => CollisionShape::Capsule {
                length: scale.x,
                radius: (scale.y + scale.z) / 2.0,
            },
            ObjectKind::Sphere
            | ObjectKind::Cube
            | ObjectKind::Cone
            | ObjectKind::Mesh
            | ObjectKind::Terrain => CollisionShape::Cuboid { size: scale },
        };
        Some(shape)
    }

    /// Shape of a primitive object from its own kind and scale.
    pub fn for_object(object: &SceneObject, config: &PhysicsConfig) -> Option<Self> {
        Self::for_kind(object.kind, object.scale, config)
    }

    pub fn to_shared_shape(self) -> SharedShape {
        match self {
            CollisionShape::Cuboid { size } => {
                let half = size * 0.5;
                SharedShape::cuboid(half.x, half.y, half.z)
            }
            CollisionShape::Ball { radius } => SharedShape::ball(radius),
            CollisionShape::Capsule { length, radius } => SharedShape::capsule_z(length * 0.5, radius),
        }
    }
}

fn is_symmetric(scale: Vec3, ratio: f32) -> bool {
    let average = (scale.x + scale.y + scale.z) / 3.0;
    scale.to_array().iter().all(|s| s / average < ratio)
}
