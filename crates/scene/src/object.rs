//! Scene objects: the placeable primitives, groupings, avatars and terrains of the world.

use crate::error::SceneError;
use crate::terrain::{TerrainGrid, TerrainSurface};
use glam::{Quat, Vec3};
use std::fmt;

/// Server-assigned object identity. `Reference(0)` means "no object" and marks top-level parents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(pub u32);

impl Reference {
    /// Parent reference of a top-level object.
    pub const NONE: Reference = Reference(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for Reference {
    fn from(value: u32) -> Self {
        Reference(value)
    }
}

/// Closed set of object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Terrain,
    Mesh,
    /// A grouping driven by a connected user; never tumbles under simulation.
    Avatar,
    Grouping,
}

impl ObjectKind {
    /// Groupings and avatars own children instead of a shape of their own.
    pub fn is_grouping(self) -> bool {
        matches!(self, ObjectKind::Grouping | ObjectKind::Avatar)
    }
}

/// Simulation state carried by an object between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dynamics {
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Force in the object's own axes, applied at the start of every tick.
    pub local_force: Vec3,
    /// Torque in the object's own axes, applied at the start of every tick.
    pub local_torque: Vec3,
}

impl Dynamics {
    pub fn with_velocity(linear_velocity: Vec3) -> Self {
        Self {
            linear_velocity,
            ..Default::default()
        }
    }
}

/// One node of the scene graph.
///
/// Position and rotation are local: relative to the immediate parent's axes for children,
/// relative to world axes for top-level objects.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub reference: Reference,
    pub parent_reference: Reference,
    pub kind: ObjectKind,
    pub position: Vec3,
    pub rotation: Quat,
    /// Size along each local axis. Only meaningful for primitive kinds.
    pub scale: Vec3,
    pub physics_enabled: bool,
    pub phantom_enabled: bool,
    pub terrain_enabled: bool,
    pub gravity_enabled: bool,
    pub dynamics: Dynamics,
    /// Ordered children of a grouping or avatar.
    pub children: Vec<SceneObject>,
    /// Present on terrain objects.
    pub terrain: Option<TerrainSurface>,
}

impl SceneObject {
    /// A top-level object at the origin with unit scale and gravity on.
    ///
    /// Terrain objects start with `terrain_enabled` set and an unloaded surface.
    pub fn new(reference: impl Into<Reference>, kind: ObjectKind) -> Self {
        let is_terrain = kind == ObjectKind::Terrain;
        Self {
            reference: reference.into(),
            parent_reference: Reference::NONE,
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            physics_enabled: false,
            phantom_enabled: false,
            terrain_enabled: is_terrain,
            gravity_enabled: true,
            dynamics: Dynamics::default(),
            children: Vec::new(),
            terrain: is_terrain.then(TerrainSurface::default),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_physics(mut self, enabled: bool) -> Self {
        self.physics_enabled = enabled;
        self
    }

    pub fn with_phantom(mut self, enabled: bool) -> Self {
        self.phantom_enabled = enabled;
        self
    }

    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    /// Attach a loaded height grid. Only terrain objects carry a surface; others are unchanged.
    pub fn with_terrain_grid(mut self, grid: TerrainGrid) -> Self {
        if let Some(surface) = self.terrain.as_mut() {
            surface.grid = Some(grid);
        }
        self
    }

    pub fn with_skybox(mut self, skybox_reference: impl Into<String>) -> Self {
        if let Some(surface) = self.terrain.as_mut() {
            surface.skybox_reference = skybox_reference.into();
        }
        self
    }

    /// Builder form of [`SceneObject::add_child`]. Non-grouping parents drop the child.
    pub fn with_child(mut self, child: SceneObject) -> Self {
        if let Err(e) = self.add_child(child) {
            log::warn!("Dropping child: {}", e);
        }
        self
    }

    /// Append a child, re-parenting it to this object.
    pub fn add_child(&mut self, mut child: SceneObject) -> Result<(), SceneError> {
        if !self.kind.is_grouping() {
            return Err(SceneError::NotAGrouping(self.reference));
        }
        child.parent_reference = self.reference;
        self.children.push(child);
        Ok(())
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_reference.is_none()
    }

    /// The primitive standing in for this object as a single rigid body: itself for
    /// primitives, the first child (recursively) for groupings.
    pub fn first_leaf(&self) -> Option<&SceneObject> {
        if self.kind.is_grouping() {
            self.children.first().and_then(SceneObject::first_leaf)
        } else {
            Some(self)
        }
    }

    /// Find this object or a descendant by reference.
    pub fn find(&self, reference: Reference) -> Option<&SceneObject> {
        if self.reference == reference {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(reference))
    }

    pub fn find_mut(&mut self, reference: Reference) -> Option<&mut SceneObject> {
        if self.reference == reference {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(reference))
    }

    /// References of this object and every descendant, depth first.
    pub fn subtree_references(&self) -> Vec<Reference> {
        let mut out = vec![self.reference];
        for child in &self.children {
            out.extend(child.subtree_references());
        }
        out
    }
}
