//! Terrain collision by single-sample probe boxes.
//!
//! Terrains never collide as meshes. A body touching a terrain's bounds is mapped into the
//! terrain's height grid, the height under it is sampled once, and a small box placed just
//! below that point stands in for the ground for one sub-step.

use crate::config::PhysicsConfig;
use glam::Vec3;
use scene::{Pose, TerrainGrid};

/// Probe box synthesized for one body against one terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainProbe {
    /// Grid cell sampled under the body.
    pub cell: (i32, i32),
    /// World point on the sampled surface.
    pub surface_point: Vec3,
    /// World center of the probe box.
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Grid cell containing a point given in the terrain's local axes.
pub fn grid_cell(local: Vec3, terrain_scale: Vec3, grid_size: usize) -> (i32, i32) {
    let n = grid_size as f32;
    let to_cell = |v: f32, s: f32| (v / s * n + n / 2.0).floor() as i32;
    (to_cell(local.x, terrain_scale.x), to_cell(local.y, terrain_scale.y))
}

/// Build the probe box for a body at `body_position`.
///
/// Returns `None` when the body maps to a cell within `terrain_edge_margin` cells of the grid
/// edge, or outside the grid.
pub fn probe_box(
    body_position: Vec3,
    terrain_pose: Pose,
    terrain_scale: Vec3,
    grid: &TerrainGrid,
    config: &PhysicsConfig,
) -> Option<TerrainProbe> {
    let size = grid.size();
    let margin = config.terrain_edge_margin;
    let scale = terrain_scale.abs().max(Vec3::splat(config.min_extent));

    let local = terrain_pose.to_local(body_position);
    let (cx, cy) = grid_cell(local, scale, size);
    let limit = size as i32 - margin;
    if cx < margin || cx > limit || cy < margin || cy > limit {
        return None;
    }

    let surface_local = Vec3::new(local.x, local.y, grid.local_height(cx, cy, scale.z));
    let surface_point = terrain_pose.to_world(surface_local);
    let half_extents = config.probe_half_extents();

    Some(TerrainProbe {
        cell: (cx, cy),
        surface_point,
        center: surface_point - Vec3::new(0.0, 0.0, half_extents.z),
        half_extents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{axis_angle_to_rotation, DEFAULT_GRID_SIZE, MID_HEIGHT};

    fn flat_grid(sample: u8) -> TerrainGrid {
        TerrainGrid::flat(DEFAULT_GRID_SIZE, sample).unwrap()
    }

    // One grid cell per world unit.
    const SCALE: Vec3 = Vec3::new(128.0, 128.0, 51.0);

    #[test]
    fn cell_mapping_recenters_the_grid() {
        assert_eq!(grid_cell(Vec3::ZERO, SCALE, 128), (64, 64));
        assert_eq!(grid_cell(Vec3::new(-64.0, 63.5, 0.0), SCALE, 128), (0, 127));
        assert_eq!(grid_cell(Vec3::new(10.2, -10.2, 0.0), SCALE, 128), (74, 53));
    }

    #[test]
    fn probe_sits_below_the_sampled_surface() {
        let grid = flat_grid(178);
        let probe = probe_box(
            Vec3::new(10.5, 4.5, 30.0),
            Pose::IDENTITY,
            SCALE,
            &grid,
            &PhysicsConfig::default(),
        )
        .unwrap();

        // (178 - 127.5) * 51 / 255 = 10.1
        let expected_z = (178.0 - MID_HEIGHT) * SCALE.z / 255.0;
        assert_eq!(probe.cell, (74, 68));
        assert!(probe.surface_point.abs_diff_eq(Vec3::new(10.5, 4.5, expected_z), 1e-4));
        assert!(probe.center.abs_diff_eq(Vec3::new(10.5, 4.5, expected_z - 2.5), 1e-4));
        assert_eq!(probe.half_extents, Vec3::new(5.0, 5.0, 2.5));
    }

    #[test]
    fn edge_margin_is_excluded() {
        let grid = flat_grid(128);
        let config = PhysicsConfig::default();
        let at_cell = |cell: i32| Vec3::new(cell as f32 - 64.0 + 0.5, 0.5, 0.0);

        // Accepted cells are 3..=125: three cells drop off the low edge, two off the high edge.
        assert!(probe_box(at_cell(2), Pose::IDENTITY, SCALE, &grid, &config).is_none());
        assert!(probe_box(at_cell(3), Pose::IDENTITY, SCALE, &grid, &config).is_some());
        assert!(probe_box(at_cell(125), Pose::IDENTITY, SCALE, &grid, &config).is_some());
        assert!(probe_box(at_cell(126), Pose::IDENTITY, SCALE, &grid, &config).is_none());
        assert!(probe_box(at_cell(10), Pose::IDENTITY, SCALE, &grid, &config).is_some());
        // Far outside the terrain.
        assert!(probe_box(at_cell(400), Pose::IDENTITY, SCALE, &grid, &config).is_none());
    }

    #[test]
    fn rotated_terrain_maps_through_its_axes() {
        let grid = flat_grid(128);
        let pose = Pose::new(
            Vec3::new(100.0, 50.0, -5.0),
            axis_angle_to_rotation(Vec3::Z, std::f32::consts::FRAC_PI_2),
        );
        let body = pose.to_world(Vec3::new(20.5, -7.5, 12.0));
        let probe = probe_box(body, pose, SCALE, &grid, &PhysicsConfig::default()).unwrap();
        assert_eq!(probe.cell, (84, 56));

        let surface_local = Vec3::new(20.5, -7.5, (128.0 - MID_HEIGHT) * SCALE.z / 255.0);
        assert!(probe.surface_point.abs_diff_eq(pose.to_world(surface_local), 1e-3));
    }
}
