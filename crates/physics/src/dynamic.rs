//! Tick-scoped rigid bodies for physics-enabled top-level objects.

use crate::collision::ColliderTag;
use crate::config::PhysicsConfig;
use crate::error::PhysicsError;
use crate::physics_world::{from_rotation, from_vector, to_isometry, to_vector, PhysicsWorld};
use crate::shape::CollisionShape;
use rapier3d::prelude::*;
use scene::{ObjectKind, Pose, Quat, Reference, SceneObject, SceneProvider};

/// A rigid body built from one scene object for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct DynamicBody {
    pub reference: Reference,
    pub kind: ObjectKind,
    pub rigid_body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

impl DynamicBody {
    /// Avatars keep their orientation; their rotation is never simulated.
    pub fn is_rotation_locked(&self) -> bool {
        self.kind == ObjectKind::Avatar
    }
}

/// Shape of an object simulated as a single rigid body: its own for primitives, its first
/// leaf's for groupings and avatars.
pub fn dynamic_shape(object: &SceneObject, config: &PhysicsConfig) -> Result<CollisionShape, PhysicsError> {
    object
        .first_leaf()
        .and_then(|leaf| CollisionShape::for_object(leaf, config))
        .ok_or(PhysicsError::NoShape(object.reference))
}

impl PhysicsWorld {
    /// Build a body for every physics-enabled top-level object in the scene.
    pub(crate) fn spawn_dynamic_bodies<S: SceneProvider + ?Sized>(&mut self, scene: &S) -> Vec<DynamicBody> {
        let mut bodies = Vec::new();
        for object in scene.top_level_objects().filter(|o| o.physics_enabled) {
            match self.spawn_dynamic_body(object) {
                Ok(body) => bodies.push(body),
                Err(e) => log::debug!("No body this tick: {}", e),
            }
        }
        bodies
    }

    fn spawn_dynamic_body(&mut self, object: &SceneObject) -> Result<DynamicBody, PhysicsError> {
        let shape = dynamic_shape(object, &self.config)?;
        let locked = object.kind == ObjectKind::Avatar;
        let rotation = if locked { Quat::IDENTITY } else { object.rotation };
        let dynamics = &object.dynamics;

        let mut builder = RigidBodyBuilder::dynamic()
            .position(to_isometry(Pose::new(object.position, rotation)))
            .linvel(to_vector(dynamics.linear_velocity))
            .gravity_scale(if object.gravity_enabled { 1.0 } else { 0.0 })
            .can_sleep(false);
        builder = if locked {
            builder.lock_rotations()
        } else {
            builder.angvel(to_vector(dynamics.angular_velocity))
        };
        let rigid_body = self.rigid_body_set.insert(builder.build());

        let collider = ColliderBuilder::new(shape.to_shared_shape())
            .density(self.config.density)
            .user_data(ColliderTag::owned_by(object.reference).to_user_data())
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, rigid_body, &mut self.rigid_body_set);

        Ok(DynamicBody {
            reference: object.reference,
            kind: object.kind,
            rigid_body,
            collider,
        })
    }

    /// Apply each object's local force and torque, turned into world axes by the body's
    /// rotation. They stay applied until [`PhysicsWorld::clear_body_forces`].
    pub(crate) fn apply_body_forces<S: SceneProvider + ?Sized>(&mut self, scene: &S, bodies: &[DynamicBody]) {
        for body in bodies {
            let Some(object) = scene.object(body.reference) else {
                continue;
            };
            let Some(rb) = self.rigid_body_set.get_mut(body.rigid_body) else {
                continue;
            };
            let rotation = from_rotation(rb.rotation());
            let force = rotation * object.dynamics.local_force;
            let torque = rotation * object.dynamics.local_torque;
            rb.add_force(to_vector(force), true);
            if !body.is_rotation_locked() {
                rb.add_torque(to_vector(torque), true);
            }
        }
    }

    pub(crate) fn clear_body_forces(&mut self, bodies: &[DynamicBody]) {
        for body in bodies {
            if let Some(rb) = self.rigid_body_set.get_mut(body.rigid_body) {
                rb.reset_forces(false);
                rb.reset_torques(false);
            }
        }
    }

    /// Copy simulated state back into the scene. Objects that vanished are skipped.
    pub(crate) fn write_back<S: SceneProvider + ?Sized>(&self, scene: &mut S, bodies: &[DynamicBody]) {
        for body in bodies {
            if let Err(e) = self.write_back_body(scene, body) {
                log::debug!("Skipping write-back: {}", e);
            }
        }
    }

    fn write_back_body<S: SceneProvider + ?Sized>(&self, scene: &mut S, body: &DynamicBody) -> Result<(), PhysicsError> {
        let rb = self
            .rigid_body_set
            .get(body.rigid_body)
            .ok_or(PhysicsError::MissingReference(body.reference))?;
        let object = scene
            .object_mut(body.reference)
            .ok_or(PhysicsError::MissingReference(body.reference))?;

        object.position = from_vector(rb.translation());
        object.dynamics.linear_velocity = from_vector(rb.linvel());
        if !body.is_rotation_locked() {
            object.rotation = from_rotation(rb.rotation());
            object.dynamics.angular_velocity = from_vector(rb.angvel());
        }
        Ok(())
    }

    /// Remove this tick's bodies and their colliders.
    pub(crate) fn despawn_dynamic_bodies(&mut self, bodies: &[DynamicBody]) {
        for body in bodies {
            self.remove_body(body.rigid_body);
        }
        self.update_query_pipeline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::Vec3;

    #[test]
    fn grouping_uses_first_leaf_shape() {
        let config = PhysicsConfig::default();
        let group = SceneObject::new(1, ObjectKind::Grouping)
            .with_child(SceneObject::new(2, ObjectKind::Cube).with_scale(Vec3::new(2.0, 2.0, 2.0)))
            .with_child(SceneObject::new(3, ObjectKind::Sphere));
        assert_eq!(
            dynamic_shape(&group, &config),
            Ok(CollisionShape::Cuboid {
                size: Vec3::splat(2.0)
            })
        );
        assert_eq!(
            dynamic_shape(&SceneObject::new(4, ObjectKind::Grouping), &config),
            Err(PhysicsError::NoShape(Reference(4)))
        );
    }
}
