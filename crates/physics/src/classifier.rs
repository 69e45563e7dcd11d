//! Near-phase pair classification.
//!
//! Every candidate pair resolves to its two owning scene objects and is then skipped, handed to
//! the terrain heuristic or left to Rapier as an ordinary contact. The same rules run in two
//! places: the per-substep sweep (events, terrain probes) and Rapier's contact hooks (which
//! contacts actually reach the solver).

use crate::collision::ColliderTag;
use crate::config::PhysicsConfig;
use rapier3d::prelude::*;
use scene::{ObjectKind, Reference, SceneObject, SceneProvider};
use std::collections::HashMap;

/// The flags of a scene object that matter to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerInfo {
    pub reference: Reference,
    pub kind: ObjectKind,
    pub phantom: bool,
    pub terrain_enabled: bool,
}

impl OwnerInfo {
    pub fn of(object: &SceneObject) -> Self {
        Self {
            reference: object.reference,
            kind: object.kind,
            phantom: object.phantom_enabled,
            terrain_enabled: object.terrain_enabled,
        }
    }

    pub fn is_terrain(&self) -> bool {
        self.kind == ObjectKind::Terrain
    }
}

/// Snapshot of every object in the scene, nested children included, keyed by reference.
#[derive(Debug, Default)]
pub struct OwnerTable {
    owners: HashMap<Reference, OwnerInfo>,
}

impl OwnerTable {
    pub fn from_scene<S: SceneProvider + ?Sized>(scene: &S) -> Self {
        let mut owners = HashMap::new();
        for top in scene.top_level_objects() {
            collect(top, &mut owners);
        }
        Self { owners }
    }

    pub fn get(&self, reference: Reference) -> Option<&OwnerInfo> {
        self.owners.get(&reference)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

fn collect(object: &SceneObject, owners: &mut HashMap<Reference, OwnerInfo>) {
    owners.insert(object.reference, OwnerInfo::of(object));
    for child in &object.children {
        collect(child, owners);
    }
}

/// How a pair of owners is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairClass {
    /// No contact and no event.
    Skip,
    /// Exactly one owner is a terrain. `terrain_first` tells which side.
    Terrain { terrain_first: bool },
    /// Regular solver contacts.
    Ordinary,
}

/// Classify a pair of distinct owners.
pub fn classify(a: &OwnerInfo, b: &OwnerInfo) -> PairClass {
    if a.is_terrain() && b.is_terrain() {
        return PairClass::Skip;
    }
    if (a.phantom || b.phantom) && !(a.terrain_enabled || b.terrain_enabled) {
        return PairClass::Skip;
    }
    if a.is_terrain() || b.is_terrain() {
        return PairClass::Terrain {
            terrain_first: a.is_terrain(),
        };
    }
    PairClass::Ordinary
}

/// Rapier hooks applying the classification to generated contacts.
pub struct ContactClassifier<'a> {
    owners: &'a OwnerTable,
    max_contacts: usize,
    friction: f32,
    restitution: f32,
}

impl<'a> ContactClassifier<'a> {
    pub fn new(owners: &'a OwnerTable, config: &PhysicsConfig) -> Self {
        Self {
            owners,
            max_contacts: config.max_contacts.max(1),
            friction: config.contact_friction,
            restitution: config.contact_restitution,
        }
    }

    fn tags(&self, colliders: &ColliderSet, h1: ColliderHandle, h2: ColliderHandle) -> Option<(ColliderTag, ColliderTag)> {
        let c1 = colliders.get(h1)?;
        let c2 = colliders.get(h2)?;
        Some((
            ColliderTag::from_user_data(c1.user_data),
            ColliderTag::from_user_data(c2.user_data),
        ))
    }

    /// Whether the pair is a probe box and the body it was built for.
    fn is_probe_pair(t1: &ColliderTag, t2: &ColliderTag) -> Option<bool> {
        match (t1.probe_for, t2.probe_for) {
            (Some(target), None) => Some(target == t2.owner),
            (None, Some(target)) => Some(target == t1.owner),
            (Some(_), Some(_)) => Some(false),
            (None, None) => None,
        }
    }

    fn allows(&self, colliders: &ColliderSet, h1: ColliderHandle, h2: ColliderHandle) -> bool {
        let Some((t1, t2)) = self.tags(colliders, h1, h2) else {
            return false;
        };
        if let Some(matched) = Self::is_probe_pair(&t1, &t2) {
            return matched;
        }
        if t1.owner == t2.owner {
            return false;
        }
        match (self.owners.get(t1.owner), self.owners.get(t2.owner)) {
            (Some(a), Some(b)) => classify(a, b) == PairClass::Ordinary,
            _ => false,
        }
    }
}

impl PhysicsHooks for ContactClassifier<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        self.allows(context.colliders, context.collider1, context.collider2)
            .then_some(SolverFlags::COMPUTE_IMPULSES)
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        self.allows(context.colliders, context.collider1, context.collider2)
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let probe = self
            .tags(context.colliders, context.collider1, context.collider2)
            .and_then(|(t1, t2)| Self::is_probe_pair(&t1, &t2))
            .unwrap_or(false);

        if probe {
            // A probe stands in for one terrain sample: a single contact at the deepest points.
            let contacts = &mut *context.solver_contacts;
            let Some(deepest) = contacts.iter().map(|c| c.dist).reduce(f32::min) else {
                return;
            };
            let mut sum = Vector::zeros();
            let mut count = 0.0;
            for c in contacts.iter().filter(|c| c.dist <= deepest + 1.0e-4) {
                sum += c.point.coords;
                count += 1.0;
            }
            contacts.retain(|c| c.dist <= deepest + 1.0e-4);
            contacts.truncate(1);
            if let Some(c) = contacts.first_mut() {
                c.point = Point::from(sum / count);
                c.friction = self.friction;
                c.restitution = self.restitution;
            }
            return;
        }

        context.solver_contacts.truncate(self.max_contacts);
        for c in context.solver_contacts.iter_mut() {
            c.friction = self.friction;
            c.restitution = self.restitution;
        }
    }
}
