//! Static geometry: persistent colliders for every non-physical, non-phantom top-level object.

use crate::collision::ColliderTag;
use crate::flatten::flatten;
use crate::physics_world::{to_isometry, PhysicsWorld};
use rapier3d::prelude::*;
use scene::{Pose, Reference, SceneObject, SceneProvider};
use std::collections::HashMap;

/// Collider handles produced for each stored top-level object.
#[derive(Debug, Default)]
pub struct StaticGeometryStore {
    entries: HashMap<Reference, Vec<ColliderHandle>>,
}

impl StaticGeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, reference: Reference) -> bool {
        self.entries.contains_key(&reference)
    }

    /// Colliders stored for a top-level object.
    pub fn colliders(&self, reference: Reference) -> &[ColliderHandle] {
        self.entries.get(&reference).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every stored collider.
    pub fn handles(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.entries.values().flatten().copied()
    }

    /// Number of stored top-level objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether an object is represented by static geometry at all.
pub fn is_static_candidate(object: &SceneObject) -> bool {
    object.is_top_level() && !object.physics_enabled && !object.phantom_enabled
}

impl PhysicsWorld {
    /// Store static geometry for a newly created object.
    ///
    /// Objects that are nested, physics-enabled or phantom store nothing. A reference that is
    /// already stored is left untouched.
    pub fn on_object_created(&mut self, object: &SceneObject) {
        if !is_static_candidate(object) {
            return;
        }
        if self.static_store.contains(object.reference) {
            log::debug!("Static geometry for {} already exists", object.reference);
            return;
        }

        let handles: Vec<ColliderHandle> = flatten(object, Pose::IDENTITY, &self.config)
            .into_iter()
            .map(|flat| {
                let collider = ColliderBuilder::new(flat.shape.to_shared_shape())
                    .position(to_isometry(flat.pose))
                    .user_data(ColliderTag::owned_by(flat.owner).to_user_data())
                    .build();
                self.collider_set.insert(collider)
            })
            .collect();

        log::debug!(
            "Stored {} static collider(s) for {}",
            handles.len(),
            object.reference
        );
        self.static_store.entries.insert(object.reference, handles);
        self.update_query_pipeline();
    }

    /// Replace an object's static geometry wholesale.
    pub fn on_object_modified(&mut self, object: &SceneObject) {
        self.on_object_destroyed(object.reference);
        self.on_object_created(object);
    }

    /// Drop an object's static geometry. Unknown references are ignored.
    pub fn on_object_destroyed(&mut self, reference: Reference) {
        let Some(handles) = self.static_store.entries.remove(&reference) else {
            return;
        };
        for handle in handles {
            self.remove_collider(handle);
        }
        self.update_query_pipeline();
    }

    /// Lifecycle notification by reference: look the object up and store it.
    pub fn object_created<S: SceneProvider + ?Sized>(&mut self, scene: &S, reference: Reference) {
        match scene.object(reference) {
            Some(object) => self.on_object_created(object),
            None => log::debug!("Created object {} not in scene", reference),
        }
    }

    pub fn object_modified<S: SceneProvider + ?Sized>(&mut self, scene: &S, reference: Reference) {
        match scene.object(reference) {
            Some(object) => self.on_object_modified(object),
            None => {
                log::debug!("Modified object {} not in scene", reference);
                self.on_object_destroyed(reference);
            }
        }
    }

    pub fn object_destroyed(&mut self, reference: Reference) {
        self.on_object_destroyed(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{ObjectKind, Vec3, WorldStorage};

    #[test]
    fn create_twice_stores_once() {
        let mut world = PhysicsWorld::default();
        let cube = SceneObject::new(1, ObjectKind::Cube);
        world.on_object_created(&cube);
        world.on_object_created(&cube);
        assert_eq!(world.static_store.len(), 1);
        assert_eq!(world.static_store.colliders(Reference(1)).len(), 1);
        assert_eq!(world.collider_set.len(), 1);
    }

    #[test]
    fn excluded_objects_store_nothing() {
        let mut world = PhysicsWorld::default();
        world.on_object_created(&SceneObject::new(1, ObjectKind::Cube).with_physics(true));
        world.on_object_created(&SceneObject::new(2, ObjectKind::Cube).with_phantom(true));
        let mut child = SceneObject::new(3, ObjectKind::Cube);
        child.parent_reference = Reference(9);
        world.on_object_created(&child);
        assert!(world.static_store.is_empty());
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn grouping_stores_a_collider_per_leaf() {
        let mut world = PhysicsWorld::default();
        let group = SceneObject::new(1, ObjectKind::Grouping)
            .with_child(SceneObject::new(2, ObjectKind::Cube))
            .with_child(SceneObject::new(3, ObjectKind::Cylinder));
        world.on_object_created(&group);

        let owners: Vec<_> = world
            .static_store
            .colliders(Reference(1))
            .iter()
            .filter_map(|h| world.collider_set.get(*h))
            .map(|c| ColliderTag::from_user_data(c.user_data).owner)
            .collect();
        assert_eq!(owners, vec![Reference(2), Reference(3)]);
    }

    #[test]
    fn modify_replaces_and_destroy_removes() {
        let mut world = PhysicsWorld::default();
        let cube = SceneObject::new(1, ObjectKind::Cube);
        world.on_object_created(&cube);
        let old = world.static_store.colliders(Reference(1))[0];

        let moved = cube.clone().with_position(Vec3::new(5.0, 0.0, 0.0));
        world.on_object_modified(&moved);
        let new = world.static_store.colliders(Reference(1))[0];
        assert!(world.collider_set.get(old).is_none());
        let position = world.collider_set.get(new).unwrap().translation();
        assert!((position.x - 5.0).abs() < 1e-6);

        // Becoming physics-enabled moves the object out of the static store.
        world.on_object_modified(&moved.with_physics(true));
        assert!(!world.static_store.contains(Reference(1)));

        world.on_object_destroyed(Reference(1));
        world.on_object_destroyed(Reference(42));
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn notifications_by_reference_use_the_scene() {
        let mut scene = WorldStorage::new();
        scene.insert(SceneObject::new(7, ObjectKind::Cone)).unwrap();
        let mut world = PhysicsWorld::default();
        world.object_created(&scene, Reference(7));
        world.object_created(&scene, Reference(8));
        assert!(world.static_store.contains(Reference(7)));
        assert_eq!(world.static_store.len(), 1);

        scene.remove(Reference(7));
        world.object_modified(&scene, Reference(7));
        assert!(world.static_store.is_empty());
    }
}
