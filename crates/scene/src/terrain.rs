//! Terrain height grids.
//!
//! A terrain is a square grid of 8-bit height samples loaded from a raw height-map file by the
//! asset cache. Until the file has arrived the terrain's surface has no grid and collision
//! against it is skipped.

use crate::error::SceneError;
use glam::Vec3;

/// Grid size of height maps served by the asset cache.
pub const DEFAULT_GRID_SIZE: usize = 128;

/// Height sample that sits exactly on the terrain's local z = 0 plane.
pub const MID_HEIGHT: f32 = 127.5;

/// Spacing, in cells, of the central differences used for normals.
const NORMAL_SPAN: i32 = 5;

/// Square height-map plus derived per-cell normals.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    size: usize,
    heights: Vec<u8>,
    normals: Vec<Vec3>,
}

impl TerrainGrid {
    /// Build a grid from raw row-major samples (`index = x + y * size`).
    pub fn from_raw(size: usize, bytes: &[u8]) -> Result<Self, SceneError> {
        if size < 8 {
            return Err(SceneError::GridTooSmall(size));
        }
        let expected = size * size;
        if bytes.len() != expected {
            return Err(SceneError::GridSizeMismatch {
                size,
                expected,
                actual: bytes.len(),
            });
        }
        let mut grid = Self {
            size,
            heights: bytes.to_vec(),
            normals: vec![Vec3::Z; expected],
        };
        grid.compute_normals();
        Ok(grid)
    }

    /// A grid with every sample set to `sample`.
    pub fn flat(size: usize, sample: u8) -> Result<Self, SceneError> {
        Self::from_raw(size, &vec![sample; size * size])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw sample at a cell. Coordinates wrap around the grid edges.
    pub fn height(&self, x: i32, y: i32) -> u8 {
        let n = self.size as i32;
        let (x, y) = (x.rem_euclid(n), y.rem_euclid(n));
        self.heights[(x + y * n) as usize]
    }

    /// Height of a cell in the terrain's local axes, for a terrain scaled `scale_z` tall.
    pub fn local_height(&self, x: i32, y: i32, scale_z: f32) -> f32 {
        (self.height(x, y) as f32 - MID_HEIGHT) * scale_z / 255.0
    }

    /// Unnormalized surface normal of a cell (z component is always 1).
    pub fn normal(&self, x: i32, y: i32) -> Vec3 {
        let n = self.size as i32;
        let (x, y) = (x.rem_euclid(n), y.rem_euclid(n));
        self.normals[(x + y * n) as usize]
    }

    fn compute_normals(&mut self) {
        let n = self.size as i32;
        let span = NORMAL_SPAN;
        let mut normals = vec![Vec3::Z; self.size * self.size];
        let h = |x: i32, y: i32| self.height(x, y) as f32;

        for x in 2..(n - 3) {
            for y in 2..(n - 3) {
                let nx = if x > span && x < n - span {
                    (h(x + span, y) - h(x - span, y)) / (2 * span) as f32 / 2.0
                } else if x < n - span {
                    (h(x + span, y) - h(x, y)) / span as f32 / 2.0
                } else {
                    (h(x, y) - h(x - span, y)) / span as f32 / 2.0
                };

                let ny = if y > span && y < n - span {
                    (h(x, y + span) - h(x, y - span)) / (2 * span) as f32 / 2.0
                } else if y < n - span {
                    (h(x, y + span) - h(x, y)) / span as f32 / 2.0
                } else {
                    (h(x, y) - h(x, y - span)) / span as f32 / 2.0
                };

                normals[(x + y * n) as usize] = Vec3::new(nx, ny, 1.0);
            }
        }

        self.normals = normals;
    }
}

/// Terrain-specific state of a terrain object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainSurface {
    /// Skybox the renderer switches to while the local avatar stands on this terrain.
    pub skybox_reference: String,
    /// Loaded height grid, `None` until the asset cache has the file.
    pub grid: Option<TerrainGrid>,
}

impl TerrainSurface {
    pub fn is_ready(&self) -> bool {
        self.grid.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = TerrainGrid::from_raw(16, &[0u8; 100]).unwrap_err();
        assert_eq!(
            err,
            SceneError::GridSizeMismatch {
                size: 16,
                expected: 256,
                actual: 100
            }
        );
        assert_eq!(
            TerrainGrid::from_raw(4, &[0u8; 16]).unwrap_err(),
            SceneError::GridTooSmall(4)
        );
    }

    #[test]
    fn local_height_is_centered_on_mid_sample() {
        let grid = TerrainGrid::flat(DEFAULT_GRID_SIZE, 255).unwrap();
        // Top sample sits half the terrain's height above its origin.
        assert!((grid.local_height(10, 10, 20.0) - 10.0).abs() < 1e-4);

        let grid = TerrainGrid::flat(DEFAULT_GRID_SIZE, 0).unwrap();
        assert!((grid.local_height(10, 10, 20.0) + 10.0).abs() < 1e-4);
    }

    #[test]
    fn heights_wrap_at_edges() {
        let size = 16;
        let mut bytes = vec![0u8; size * size];
        bytes[3 + 2 * size] = 42;
        let grid = TerrainGrid::from_raw(size, &bytes).unwrap();
        assert_eq!(grid.height(3, 2), 42);
        assert_eq!(grid.height(3 + 16, 2 - 16), 42);
    }

    #[test]
    fn flat_grid_has_vertical_normals() {
        let grid = TerrainGrid::flat(32, 100).unwrap();
        for (x, y) in [(2, 2), (16, 16), (28, 28), (0, 0)] {
            assert_eq!(grid.normal(x, y), Vec3::Z);
        }
    }

    #[test]
    fn slope_tilts_normal_along_gradient() {
        let size = 32;
        let bytes: Vec<u8> = (0..size * size).map(|i| ((i % size) * 4) as u8).collect();
        let grid = TerrainGrid::from_raw(size, &bytes).unwrap();
        // Heights rise 4 per cell along x: (h(x+5) - h(x-5)) / 10 / 2 = 2.
        let n = grid.normal(16, 16);
        assert!((n.x - 2.0).abs() < 1e-5);
        assert!(n.y.abs() < 1e-5);
        assert_eq!(n.z, 1.0);
    }
}
