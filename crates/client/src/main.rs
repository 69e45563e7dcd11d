//! worldsim - headless driver for the world client's collision and physics core.
//!
//! Builds a demo scene, forwards lifecycle notifications to the physics world and runs the
//! per-frame loop: arm events, step, drain events, follow the skybox side-channel.

mod config;
mod demo;

use anyhow::{Context, Result};
use config::ClientConfig;
use glam::Vec3;
use physics::PhysicsWorld;
use scene::{FrameClock, Reference, SceneProvider, MIN_FRAME_MILLIS};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::load();
    log::info!(
        "Starting worldsim: {} frame(s) of {} ms{}",
        config.frames,
        config.frame_millis,
        if config.realtime { " (real time)" } else { "" }
    );

    let mut scene = demo::build_scene(&config).context("building demo scene")?;
    let mut world = PhysicsWorld::new(config.physics.clone());

    let references: Vec<Reference> = scene.top_level_objects().map(|o| o.reference).collect();
    for reference in references {
        world.object_created(&scene, reference);
    }
    log::info!(
        "Scene ready: {} top-level object(s), {} static",
        scene.len(),
        world.static_store.len()
    );

    let local_avatar = Reference(config.local_avatar);
    let mut clock = FrameClock::new();
    let mut skybox: Option<String> = None;
    let mut event_total = 0usize;

    for frame in 0..config.frames {
        let elapsed_ms = if config.realtime {
            std::thread::sleep(Duration::from_millis(config.frame_millis as u64));
            clock.tick()
        } else {
            config.frame_millis.max(MIN_FRAME_MILLIS)
        };

        // Halfway through, the server swings the gate open.
        if frame == config.frames / 2 {
            if let Some(gate) = scene.object_mut(demo::GATE) {
                gate.rotation = scene::compose(gate.rotation, scene::axis_angle_to_rotation(Vec3::Z, 1.2));
            }
            world.object_modified(&scene, demo::GATE);
        }

        world.begin_frame();
        let report = world.step_simulation(&mut scene, elapsed_ms, Some(local_avatar));
        for event in world.drain_events() {
            log::info!("Frame {}: {} collided with {}", frame, event.target, event.colliding);
            event_total += 1;
        }

        if report.skybox_reference.is_some() && report.skybox_reference != skybox {
            log::info!(
                "Frame {}: skybox -> {}",
                frame,
                report.skybox_reference.as_deref().unwrap_or_default()
            );
            skybox = report.skybox_reference;
        }
    }

    let avatar = scene
        .object(local_avatar)
        .context("local avatar left the scene")?;
    log::info!(
        "Avatar at {:?}, velocity {:?}; {} collision event(s) in total",
        avatar.position,
        avatar.dynamics.linear_velocity,
        event_total
    );

    if let Some(ghost) = scene.object(demo::GHOST) {
        log::info!("Phantom drifted through to {:?}", ghost.position);
    }

    let pick = world.raycast(avatar.position + Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 0.1);
    match pick.target {
        Some(target) if pick.collided => {
            log::info!("Pick ray below avatar hit {} at {:?}", target, pick.nearest_point)
        }
        _ => log::info!("Pick ray below avatar hit nothing"),
    }

    world.object_destroyed(demo::GATE);
    world.object_destroyed(demo::TERRAIN);
    log::info!("Static geometry left after teardown: {}", world.static_store.len());

    Ok(())
}
