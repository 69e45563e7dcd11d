//! Scene model consumed by the collision/physics core.
//!
//! This crate provides the types shared between the world storage and the physics core:
//! - Rotation algebra and world poses
//! - Scene objects (primitives, groupings, avatars, terrain) and their dynamics state
//! - Terrain height grids
//! - The scene snapshot provider and an in-memory world storage
//! - Frame timing and sub-step planning

pub mod error;
pub mod object;
pub mod storage;
pub mod terrain;
pub mod time;
pub mod transform;

pub use error::*;
pub use object::*;
pub use storage::*;
pub use terrain::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
