//! Tunables for the collision and simulation core.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Simulation and collision parameters. Usually embedded in the client's `config.ron`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World gravity. The scene is z-up.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    /// Longest sub-step a frame is divided into, in seconds.
    #[serde(default = "default_max_substep")]
    pub max_substep_seconds: f32,
    /// Solver contacts kept per colliding pair.
    #[serde(default = "default_max_contacts")]
    pub max_contacts: usize,
    /// Primary friction of ordinary contacts. Large enough to stop sliding outright.
    #[serde(default = "default_contact_friction")]
    pub contact_friction: f32,
    #[serde(default = "default_contact_restitution")]
    pub contact_restitution: f32,
    /// Collider density of dynamic bodies.
    #[serde(default = "default_density")]
    pub density: f32,
    /// Smallest extent a shape may have along any axis.
    #[serde(default = "default_min_extent")]
    pub min_extent: f32,
    /// A sphere whose scale axes all stay below this multiple of their average is a true sphere.
    #[serde(default = "default_sphere_symmetry_ratio")]
    pub sphere_symmetry_ratio: f32,
    /// Grid cells next to the terrain edge that never produce a probe.
    #[serde(default = "default_terrain_edge_margin")]
    pub terrain_edge_margin: i32,
    /// Half extents of the terrain probe box.
    #[serde(default = "default_probe_half_extents")]
    pub probe_half_extents: [f32; 3],
    /// Contact prediction distance used when testing a body against a probe box.
    #[serde(default = "default_probe_margin")]
    pub probe_margin: f32,
    /// Collision events kept per frame; further pairs are dropped.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Length of pick rays.
    #[serde(default = "default_pick_ray_length")]
    pub pick_ray_length: f32,
}

fn default_gravity() -> [f32; 3] {
    [0.0, 0.0, -30.0]
}
fn default_max_substep() -> f32 {
    0.02
}
fn default_max_contacts() -> usize {
    4
}
fn default_contact_friction() -> f32 {
    100.0
}
fn default_contact_restitution() -> f32 {
    0.1
}
fn default_density() -> f32 {
    5.0
}
fn default_min_extent() -> f32 {
    0.01
}
fn default_sphere_symmetry_ratio() -> f32 {
    1.4
}
fn default_terrain_edge_margin() -> i32 {
    3
}
fn default_probe_half_extents() -> [f32; 3] {
    [5.0, 5.0, 2.5]
}
fn default_probe_margin() -> f32 {
    0.05
}
fn default_event_capacity() -> usize {
    2048
}
fn default_pick_ray_length() -> f32 {
    20.0
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            max_substep_seconds: default_max_substep(),
            max_contacts: default_max_contacts(),
            contact_friction: default_contact_friction(),
            contact_restitution: default_contact_restitution(),
            density: default_density(),
            min_extent: default_min_extent(),
            sphere_symmetry_ratio: default_sphere_symmetry_ratio(),
            terrain_edge_margin: default_terrain_edge_margin(),
            probe_half_extents: default_probe_half_extents(),
            probe_margin: default_probe_margin(),
            event_capacity: default_event_capacity(),
            pick_ray_length: default_pick_ray_length(),
        }
    }
}

impl PhysicsConfig {
    pub fn gravity(&self) -> Vec3 {
        Vec3::from(self.gravity)
    }

    pub fn probe_half_extents(&self) -> Vec3 {
        Vec3::from(self.probe_half_extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_simulation_constants() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity(), Vec3::new(0.0, 0.0, -30.0));
        assert_eq!(config.max_contacts, 4);
        assert_eq!(config.event_capacity, 2048);
        assert_eq!(config.probe_half_extents(), Vec3::new(5.0, 5.0, 2.5));
    }
}
