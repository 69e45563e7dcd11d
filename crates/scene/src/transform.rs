//! Rotation algebra and world poses for the scene hierarchy.
//!
//! Rotations are unit quaternions. Two conventions are fixed here and used by every caller:
//! - [`compose`] is the Hamilton product `a * b`.
//! - [`rotate_vector`] expresses a vector through a rotation as `q⁻¹ v q`.
//!
//! Together they give `rotate_vector(rotate_vector(v, a), b) == rotate_vector(v, compose(a, b))`,
//! so a child's local rotation is composed first and its parent's rotation second.

use glam::{Quat, Vec3};

/// Below this `|sin(angle / 2)|` a rotation has no usable axis and +X is reported instead.
pub const AXIS_EPSILON: f32 = 5.0e-4;

/// Compose two rotations: `a` is applied first, then `b`.
pub fn compose(a: Quat, b: Quat) -> Quat {
    a * b
}

/// Inverse of a unit rotation.
pub fn invert(q: Quat) -> Quat {
    q.conjugate()
}

/// Rotate `v` by `q` using the scene convention (`q⁻¹ v q`).
pub fn rotate_vector(v: Vec3, q: Quat) -> Vec3 {
    q.conjugate() * v
}

/// Build a rotation of `angle` radians about `axis`. A zero axis falls back to +X.
pub fn axis_angle_to_rotation(axis: Vec3, angle: f32) -> Quat {
    let axis = axis.try_normalize().unwrap_or(Vec3::X);
    let (sin_a, cos_a) = (angle * 0.5).sin_cos();
    Quat::from_xyzw(axis.x * sin_a, axis.y * sin_a, axis.z * sin_a, cos_a)
}

/// Split a rotation into `(axis, angle)`.
///
/// Near-identity rotations (where `sin(angle / 2)` is within [`AXIS_EPSILON`] of zero)
/// report +X as the axis rather than dividing by zero.
pub fn rotation_to_axis_angle(q: Quat) -> (Vec3, f32) {
    let cos_a = q.w.clamp(-1.0, 1.0);
    let angle = cos_a.acos() * 2.0;
    let sin_a = (1.0 - cos_a * cos_a).sqrt();

    if sin_a.abs() > AXIS_EPSILON {
        (Vec3::new(q.x, q.y, q.z) / sin_a, angle)
    } else {
        (Vec3::X, angle)
    }
}

/// World-axis position and rotation of a node, used as the accumulated context while
/// walking a grouping tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The world origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World pose of a node whose local pose is expressed in this pose's axes.
    pub fn place(&self, local_position: Vec3, local_rotation: Quat) -> Pose {
        Pose {
            position: self.position + rotate_vector(local_position, self.rotation),
            rotation: compose(local_rotation, self.rotation),
        }
    }

    /// Express a world-space point in this pose's local axes.
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        rotate_vector(world - self.position, self.rotation)
    }

    /// Inverse of [`Pose::to_local`].
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        rotate_vector(local, invert(self.rotation)) + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

    fn sample_rotations() -> Vec<Quat> {
        vec![
            Quat::IDENTITY,
            axis_angle_to_rotation(Vec3::Z, FRAC_PI_2),
            axis_angle_to_rotation(Vec3::new(1.0, 2.0, -0.5), 2.1),
            axis_angle_to_rotation(Vec3::new(-0.3, 0.1, 0.9), -0.7),
        ]
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        for q in sample_rotations() {
            let r = compose(q, invert(q));
            assert!(r.abs_diff_eq(Quat::IDENTITY, 1e-5), "{:?}", r);
        }
    }

    #[test]
    fn rotate_then_unrotate_restores_vector() {
        let v = Vec3::new(3.0, -1.5, 7.25);
        for q in sample_rotations() {
            let back = rotate_vector(rotate_vector(v, q), invert(q));
            assert!(back.abs_diff_eq(v, 1e-4), "{:?} -> {:?}", v, back);
        }
    }

    #[test]
    fn compose_order_matches_sequential_rotation() {
        let a = axis_angle_to_rotation(Vec3::X, FRAC_PI_2);
        let b = axis_angle_to_rotation(Vec3::Z, FRAC_PI_3);
        let v = Vec3::new(0.5, 1.0, -2.0);

        let sequential = rotate_vector(rotate_vector(v, a), b);
        assert!(rotate_vector(v, compose(a, b)).abs_diff_eq(sequential, 1e-5));
        // The swapped order is a different rotation for these two axes.
        assert!(!rotate_vector(v, compose(b, a)).abs_diff_eq(sequential, 1e-3));
    }

    #[test]
    fn rotate_vector_is_frame_change() {
        // A frame turned +90° about Z sees the world +X axis along its own -Y.
        let q = axis_angle_to_rotation(Vec3::Z, FRAC_PI_2);
        let v = rotate_vector(Vec3::X, q);
        assert!(v.abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-5), "{:?}", v);
    }

    #[test]
    fn axis_angle_round_trip() {
        let axis = Vec3::new(0.0, 3.0, 4.0);
        let q = axis_angle_to_rotation(axis, 1.2);
        let (back_axis, back_angle) = rotation_to_axis_angle(q);
        assert!(back_axis.abs_diff_eq(axis.normalize(), 1e-4));
        assert!((back_angle - 1.2).abs() < 1e-4);
    }

    #[test]
    fn near_identity_falls_back_to_x_axis() {
        let (axis, angle) = rotation_to_axis_angle(Quat::IDENTITY);
        assert_eq!(axis, Vec3::X);
        assert!(angle.abs() < 1e-6);
        assert!(axis.is_finite());

        let tiny = axis_angle_to_rotation(Vec3::Y, 1e-5);
        let (axis, _) = rotation_to_axis_angle(tiny);
        assert_eq!(axis, Vec3::X);
    }

    #[test]
    fn zero_axis_builds_x_rotation() {
        let q = axis_angle_to_rotation(Vec3::ZERO, FRAC_PI_2);
        assert!(q.abs_diff_eq(axis_angle_to_rotation(Vec3::X, FRAC_PI_2), 1e-6));
    }

    #[test]
    fn pose_local_world_round_trip() {
        let pose = Pose::new(
            Vec3::new(10.0, -4.0, 2.0),
            axis_angle_to_rotation(Vec3::new(1.0, 1.0, 0.0), 0.8),
        );
        let world = Vec3::new(12.0, 1.0, -3.0);
        assert!(pose.to_world(pose.to_local(world)).abs_diff_eq(world, 1e-4));
    }
}
