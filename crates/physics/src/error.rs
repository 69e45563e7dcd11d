//! Errors raised inside a simulation tick.
//!
//! None of these escape [`crate::PhysicsWorld::step_simulation`]: the tick logs them and carries on
//! with the next pair or body so the frame always completes.

use scene::Reference;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// The object vanished from the scene between the snapshot and its use.
    #[error("object {0} not found in the scene")]
    MissingReference(Reference),

    /// The terrain's height-map has not been loaded yet.
    #[error("terrain {0} has no height grid yet")]
    TerrainNotReady(Reference),

    /// A grouping with no primitive descendant has nothing to collide with.
    #[error("object {0} has no collision shape")]
    NoShape(Reference),

    /// The frame's event buffer reached its capacity.
    #[error("collision event buffer full ({capacity} entries)")]
    EventBufferFull { capacity: usize },

    /// The contact query does not support this pair of shapes.
    #[error("no contact query between the shapes of {0} and {1}")]
    UnsupportedShapePair(Reference, Reference),
}
