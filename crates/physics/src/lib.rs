//! Scene-to-physics mapping and collision events, built on Rapier3D.
//!
//! The core flattens the scene graph into world-axis collision shapes, keeps static geometry in
//! step with scene lifecycle notifications, simulates physics-enabled objects as tick-scoped
//! rigid bodies, approximates terrain with single-sample probe boxes and reports deduplicated
//! collision pairs.

pub mod classifier;
pub mod collision;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod flatten;
pub mod physics_world;
pub mod raycast;
pub mod shape;
pub mod static_store;
pub mod terrain_probe;

pub use classifier::*;
pub use collision::*;
pub use config::*;
pub use dynamic::*;
pub use error::*;
pub use flatten::*;
pub use physics_world::*;
pub use raycast::*;
pub use shape::*;
pub use static_store::*;
pub use terrain_probe::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
