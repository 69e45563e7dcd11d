//! Demo scene: rolling terrain, the local avatar, a static gate, falling crates and a ghost.

use crate::config::ClientConfig;
use glam::Vec3;
use scene::{
    axis_angle_to_rotation, Dynamics, ObjectKind, Reference, SceneError, SceneObject, TerrainGrid,
    WorldStorage, DEFAULT_GRID_SIZE,
};

pub const TERRAIN: Reference = Reference(1);
pub const GATE: Reference = Reference(50);
pub const GHOST: Reference = Reference(60);
const FIRST_CRATE: u32 = 100;

/// Height samples for gently rolling hills.
fn rolling_hills(size: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let (fx, fy) = (x as f32 / size as f32, y as f32 / size as f32);
            let h = 128.0 + 20.0 * (fx * std::f32::consts::TAU).sin() * (fy * std::f32::consts::PI).cos();
            bytes.push(h.clamp(0.0, 255.0) as u8);
        }
    }
    bytes
}

pub fn build_scene(config: &ClientConfig) -> Result<WorldStorage, SceneError> {
    let mut world = WorldStorage::new();

    let grid = TerrainGrid::from_raw(DEFAULT_GRID_SIZE, &rolling_hills(DEFAULT_GRID_SIZE))?;
    world.insert(
        SceneObject::new(TERRAIN, ObjectKind::Terrain)
            .with_scale(Vec3::new(256.0, 256.0, 20.0))
            .with_terrain_grid(grid)
            .with_skybox("sky_meadow"),
    )?;

    world.insert(
        SceneObject::new(config.local_avatar, ObjectKind::Avatar)
            .with_position(Vec3::new(0.0, 0.0, 4.0))
            .with_physics(true)
            .with_dynamics(Dynamics::with_velocity(Vec3::new(1.5, 0.0, 0.0)))
            .with_child(
                SceneObject::new(config.local_avatar + 1, ObjectKind::Cylinder)
                    .with_scale(Vec3::new(1.2, 0.5, 0.5)),
            )
            .with_child(
                SceneObject::new(config.local_avatar + 2, ObjectKind::Sphere)
                    .with_position(Vec3::new(0.0, 0.0, 1.0))
                    .with_scale(Vec3::splat(0.4)),
            ),
    )?;

    let gate_rotation = axis_angle_to_rotation(Vec3::Z, 0.2);
    world.insert(
        SceneObject::new(GATE, ObjectKind::Grouping)
            .with_position(Vec3::new(12.0, 0.0, 0.0))
            .with_rotation(gate_rotation)
            .with_child(
                SceneObject::new(51, ObjectKind::Cube)
                    .with_position(Vec3::new(0.0, -2.0, 2.0))
                    .with_scale(Vec3::new(0.5, 0.5, 4.0)),
            )
            .with_child(
                SceneObject::new(52, ObjectKind::Cube)
                    .with_position(Vec3::new(0.0, 2.0, 2.0))
                    .with_scale(Vec3::new(0.5, 0.5, 4.0)),
            )
            .with_child(
                SceneObject::new(53, ObjectKind::Cylinder)
                    .with_position(Vec3::new(0.0, 0.0, 4.25))
                    .with_rotation(axis_angle_to_rotation(Vec3::X, std::f32::consts::FRAC_PI_2))
                    .with_scale(Vec3::new(4.5, 0.5, 0.5)),
            ),
    )?;

    world.insert(
        SceneObject::new(GHOST, ObjectKind::Sphere)
            .with_position(Vec3::new(6.0, 0.0, 2.0))
            .with_physics(true)
            .with_phantom(true)
            .with_gravity(false)
            .with_dynamics(Dynamics::with_velocity(Vec3::new(-1.0, 0.0, 0.0))),
    )?;

    for i in 0..config.crate_count {
        let offset = i as f32;
        world.insert(
            SceneObject::new(FIRST_CRATE + i, ObjectKind::Cube)
                .with_position(Vec3::new(8.0 + (offset % 3.0) * 1.5, -3.0 + offset, 6.0 + offset * 2.0))
                .with_rotation(axis_angle_to_rotation(Vec3::new(1.0, 1.0, 0.0), 0.3 * offset))
                .with_physics(true)
                .with_dynamics(Dynamics {
                    local_torque: Vec3::new(0.0, 0.0, 5.0),
                    ..Default::default()
                }),
        )?;
    }

    Ok(world)
}
