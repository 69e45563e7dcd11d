//! Client configuration (frame loop, demo scene, physics). Loaded from config.ron at startup.

use physics::PhysicsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for a headless simulation run. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Frames to simulate before exiting.
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Length of a simulated frame in milliseconds, when not running in real time.
    #[serde(default = "default_frame_millis")]
    pub frame_millis: u32,
    /// Pace frames against the wall clock instead of using `frame_millis` as-is.
    #[serde(default)]
    pub realtime: bool,
    /// Reference of the avatar controlled by this client.
    #[serde(default = "default_local_avatar")]
    pub local_avatar: u32,
    /// Crates dropped onto the terrain by the demo scene.
    #[serde(default = "default_crate_count")]
    pub crate_count: u32,
    #[serde(default)]
    pub physics: PhysicsConfig,
}

fn default_frames() -> u32 {
    300
}
fn default_frame_millis() -> u32 {
    33
}
fn default_local_avatar() -> u32 {
    2
}
fn default_crate_count() -> u32 {
    6
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            frame_millis: default_frame_millis(),
            realtime: false,
            local_avatar: default_local_avatar(),
            crate_count: default_crate_count(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ClientConfig = ron::from_str("(frames: 10, physics: (max_contacts: 2))").unwrap();
        assert_eq!(config.frames, 10);
        assert_eq!(config.frame_millis, 33);
        assert_eq!(config.physics.max_contacts, 2);
        assert_eq!(config.physics.event_capacity, 2048);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let config = ClientConfig::load_from(Path::new("/nonexistent/worldsim/config.ron"));
        assert_eq!(config.frames, default_frames());
        assert_eq!(config.physics, PhysicsConfig::default());
    }
}
