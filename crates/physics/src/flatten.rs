//! Scene flattening: a grouping tree becomes a flat list of world-axis shapes.

use crate::config::PhysicsConfig;
use crate::shape::CollisionShape;
use scene::{Pose, Reference, SceneObject};

/// One collision shape in world axes, tagged with the primitive that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatShape {
    pub owner: Reference,
    pub shape: CollisionShape,
    pub pose: Pose,
}

/// Emit one shape per primitive under `node`.
///
/// `context` is the accumulated world pose of `node`'s parent. Each node's own local pose is
/// applied exactly once, at the node; its placed pose is the context of its children.
pub fn flatten(node: &SceneObject, context: Pose, config: &PhysicsConfig) -> Vec<FlatShape> {
    let mut out = Vec::new();
    flatten_into(node, context, config, &mut out);
    out
}

fn flatten_into(node: &SceneObject, context: Pose, config: &PhysicsConfig, out: &mut Vec<FlatShape>) {
    let pose = context.place(node.position, node.rotation);

    if node.kind.is_grouping() {
        for child in &node.children {
            flatten_into(child, pose, config, out);
        }
        return;
    }

    if let Some(shape) = CollisionShape::for_object(node, config) {
        out.push(FlatShape {
            owner: node.reference,
            shape,
            pose,
        });
    }
}
