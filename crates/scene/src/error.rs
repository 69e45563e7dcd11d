//! Errors raised while building or editing the scene.

use crate::object::Reference;
use thiserror::Error;

/// Errors that can occur while populating scene storage or terrain data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Raw height data does not match the declared grid size.
    #[error("height map for a {size}x{size} grid needs {expected} samples, got {actual}")]
    GridSizeMismatch {
        size: usize,
        expected: usize,
        actual: usize,
    },

    /// Grids smaller than this cannot hold the edge margin used by collision probes.
    #[error("terrain grid size {0} is too small")]
    GridTooSmall(usize),

    /// A child was attached to an object that cannot own children.
    #[error("object {0} is not a grouping")]
    NotAGrouping(Reference),

    /// The parent named by a child object is not in the scene.
    #[error("parent object {0} not found")]
    UnknownParent(Reference),
}
