//! Ray probes for picking.

use crate::collision::ColliderTag;
use crate::physics_world::{from_vector, to_vector, PhysicsWorld};
use rapier3d::prelude::*;
use scene::{Reference, Vec3};

/// Result of a pick ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayProbeResult {
    pub collided: bool,
    /// Hit point pulled back toward the origin by the probe radius. On a miss, the origin
    /// pulled back the same way.
    pub nearest_point: Vec3,
    /// Object owning the nearest shape hit.
    pub target: Option<Reference>,
}

impl PhysicsWorld {
    /// Cast a pick ray of `pick_ray_length` from `origin` along `direction`.
    ///
    /// The ray sees whatever is in the collision space when called: static geometry between
    /// ticks.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, probe_radius: f32) -> RayProbeResult {
        let Some(direction) = direction.try_normalize() else {
            return RayProbeResult {
                collided: false,
                nearest_point: origin,
                target: None,
            };
        };

        let ray = Ray::new(Point::from(to_vector(origin)), to_vector(direction));
        let hit = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            self.config.pick_ray_length,
            true,
            QueryFilter::default(),
        );

        match hit {
            Some((handle, time_of_impact)) => {
                let point = from_vector(&ray.point_at(time_of_impact).coords);
                let target = self
                    .collider_set
                    .get(handle)
                    .map(|c| ColliderTag::from_user_data(c.user_data).owner);
                RayProbeResult {
                    collided: true,
                    nearest_point: point - direction * probe_radius,
                    target,
                }
            }
            None => RayProbeResult {
                collided: false,
                nearest_point: origin - direction * probe_radius,
                target: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{ObjectKind, SceneObject};

    fn world_with_cube_at(position: Vec3) -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world.on_object_created(
            &SceneObject::new(1, ObjectKind::Cube)
                .with_position(position)
                .with_scale(Vec3::splat(2.0)),
        );
        world
    }

    #[test]
    fn hit_is_pulled_back_by_probe_radius() {
        let world = world_with_cube_at(Vec3::new(5.0, 0.0, 0.0));
        let result = world.raycast(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), 0.5);
        assert!(result.collided);
        assert_eq!(result.target, Some(Reference(1)));
        assert!(result.nearest_point.abs_diff_eq(Vec3::new(3.5, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn miss_backs_off_from_origin() {
        let world = world_with_cube_at(Vec3::new(5.0, 0.0, 0.0));
        let result = world.raycast(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), 0.5);
        assert!(!result.collided);
        assert!(result.target.is_none());
        assert!(result.nearest_point.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn targets_beyond_ray_length_are_missed() {
        let world = world_with_cube_at(Vec3::new(30.0, 0.0, 0.0));
        assert!(!world.raycast(Vec3::ZERO, Vec3::X, 0.0).collided);
    }

    #[test]
    fn zero_direction_never_hits() {
        let world = world_with_cube_at(Vec3::ZERO);
        let result = world.raycast(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        assert!(!result.collided);
        assert_eq!(result.nearest_point, Vec3::new(0.0, 0.0, 5.0));
    }
}
