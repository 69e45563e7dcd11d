//! Scene snapshot access and the in-memory world storage that backs it.

use crate::error::SceneError;
use crate::object::{Reference, SceneObject};
use std::collections::{BTreeMap, HashMap};

/// Read/write view of the live scene graph used by the physics core.
///
/// Lookups by reference reach any object in the graph, nested children included.
pub trait SceneProvider {
    /// Every object whose parent reference is [`Reference::NONE`].
    fn top_level_objects(&self) -> Box<dyn Iterator<Item = &SceneObject> + '_>;

    fn object(&self, reference: Reference) -> Option<&SceneObject>;

    fn object_mut(&mut self, reference: Reference) -> Option<&mut SceneObject>;
}

/// Scene graph keyed by top-level reference, with an index from every nested reference
/// to the top-level object that contains it.
#[derive(Debug, Default)]
pub struct WorldStorage {
    roots: BTreeMap<Reference, SceneObject>,
    owners: HashMap<Reference, Reference>,
}

impl WorldStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    ///
    /// Top-level objects are stored as roots. Children are appended to (or replace the
    /// existing child of the same reference in) the grouping named by `parent_reference`.
    pub fn insert(&mut self, object: SceneObject) -> Result<(), SceneError> {
        if object.is_top_level() {
            self.remove(object.reference);
            let root = object.reference;
            for r in object.subtree_references() {
                self.owners.insert(r, root);
            }
            self.roots.insert(root, object);
            return Ok(());
        }

        let parent = object.parent_reference;
        let root = *self
            .owners
            .get(&parent)
            .ok_or(SceneError::UnknownParent(parent))?;
        let subtree = object.subtree_references();

        let group = self
            .roots
            .get_mut(&root)
            .and_then(|r| r.find_mut(parent))
            .ok_or(SceneError::UnknownParent(parent))?;
        if !group.kind.is_grouping() {
            return Err(SceneError::NotAGrouping(parent));
        }

        if let Some(slot) = group
            .children
            .iter_mut()
            .find(|c| c.reference == object.reference)
        {
            for r in slot.subtree_references() {
                self.owners.remove(&r);
            }
            *slot = object;
        } else {
            group.children.push(object);
        }
        for r in subtree {
            self.owners.insert(r, root);
        }
        Ok(())
    }

    /// Remove an object and its subtree. Returns the removed object, if it was known.
    pub fn remove(&mut self, reference: Reference) -> Option<SceneObject> {
        let root = *self.owners.get(&reference)?;
        let removed = if root == reference {
            self.roots.remove(&root)?
        } else {
            let top = self.roots.get_mut(&root)?;
            let parent = top.find(reference)?.parent_reference;
            let group = top.find_mut(parent)?;
            let index = group
                .children
                .iter()
                .position(|c| c.reference == reference)?;
            group.children.remove(index)
        };

        for r in removed.subtree_references() {
            self.owners.remove(&r);
        }
        Some(removed)
    }

    /// Top-level reference containing `reference`.
    pub fn top_level_of(&self, reference: Reference) -> Option<Reference> {
        self.owners.get(&reference).copied()
    }

    /// Number of top-level objects.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl SceneProvider for WorldStorage {
    fn top_level_objects(&self) -> Box<dyn Iterator<Item = &SceneObject> + '_> {
        Box::new(self.roots.values())
    }

    fn object(&self, reference: Reference) -> Option<&SceneObject> {
        let root = self.owners.get(&reference)?;
        self.roots.get(root)?.find(reference)
    }

    fn object_mut(&mut self, reference: Reference) -> Option<&mut SceneObject> {
        let root = self.owners.get(&reference)?;
        self.roots.get_mut(root)?.find_mut(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use glam::Vec3;

    fn sample_world() -> WorldStorage {
        let mut world = WorldStorage::new();
        world
            .insert(
                SceneObject::new(1, ObjectKind::Grouping)
                    .with_child(SceneObject::new(2, ObjectKind::Cube))
                    .with_child(SceneObject::new(3, ObjectKind::Sphere)),
            )
            .unwrap();
        world.insert(SceneObject::new(10, ObjectKind::Terrain)).unwrap();
        world
    }

    #[test]
    fn lookups_reach_nested_children() {
        let world = sample_world();
        assert_eq!(world.len(), 2);
        assert_eq!(world.top_level_objects().count(), 2);
        assert_eq!(world.object(Reference(3)).map(|o| o.kind), Some(ObjectKind::Sphere));
        assert_eq!(world.top_level_of(Reference(2)), Some(Reference(1)));
        assert!(world.object(Reference(99)).is_none());
    }

    #[test]
    fn insert_child_by_parent_reference() {
        let mut world = sample_world();
        let mut child = SceneObject::new(4, ObjectKind::Cone);
        child.parent_reference = Reference(1);
        world.insert(child).unwrap();
        assert_eq!(world.object(Reference(1)).unwrap().children.len(), 3);
        assert_eq!(world.top_level_of(Reference(4)), Some(Reference(1)));

        let mut orphan = SceneObject::new(5, ObjectKind::Cube);
        orphan.parent_reference = Reference(77);
        assert_eq!(world.insert(orphan), Err(SceneError::UnknownParent(Reference(77))));

        let mut under_cube = SceneObject::new(6, ObjectKind::Cube);
        under_cube.parent_reference = Reference(2);
        assert_eq!(world.insert(under_cube), Err(SceneError::NotAGrouping(Reference(2))));
    }

    #[test]
    fn insert_replaces_wholesale() {
        let mut world = sample_world();
        world
            .insert(SceneObject::new(1, ObjectKind::Cube).with_scale(Vec3::splat(3.0)))
            .unwrap();
        assert_eq!(world.object(Reference(1)).unwrap().kind, ObjectKind::Cube);
        assert!(world.object(Reference(2)).is_none());
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn remove_drops_subtree() {
        let mut world = sample_world();
        let removed = world.remove(Reference(2)).unwrap();
        assert_eq!(removed.kind, ObjectKind::Cube);
        assert_eq!(world.object(Reference(1)).unwrap().children.len(), 1);

        world.remove(Reference(1)).unwrap();
        assert!(world.object(Reference(3)).is_none());
        assert!(world.remove(Reference(1)).is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn object_mut_edits_in_place() {
        let mut world = sample_world();
        world.object_mut(Reference(3)).unwrap().position = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            world.object(Reference(3)).unwrap().position,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }
}
