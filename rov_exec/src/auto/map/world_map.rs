//! # World map
//!
//! Persistent grid of per-class confidence counters, accumulated from perception while the rover is
//! level enough for the flat ground projection to hold.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use log::debug;
use nalgebra::Point2;
use ndarray::{Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::auto::{
    loc::Pose,
    per::{frame, PerOutput},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The world map.
///
/// Cells are indexed `[y, x, layer]`, and each counter saturates at 255.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    params: WorldMapParams,

    grid_scale: f64,

    cells: Array3<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldMapParams {
    /// Number of cells along each side of the map.
    pub world_size: usize,

    /// Amount added to a cell's counter each time it is observed.
    pub increment: u8,

    /// Largest `degrees(1 - cos(angle))` pitch and roll may have for the map to be updated.
    pub level_tolerance: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Layers of the [`WorldMap`], in storage (and rendered RGB channel) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldMapLayer {
    Wall,
    Rock,
    Terrain,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WorldMap {
    /// Create a new empty map. `grid_scale` is the number of rover frame units per cell.
    pub fn new(params: WorldMapParams, grid_scale: f64) -> Self {
        Self {
            cells: Array3::zeros((params.world_size, params.world_size, 3)),
            params,
            grid_scale,
        }
    }

    pub fn world_size(&self) -> usize {
        self.params.world_size
    }

    /// Clear all counters.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    /// Get the counter for the given layer at the cell `(x, y)`.
    pub fn get(&self, layer: WorldMapLayer, x: usize, y: usize) -> Option<u8> {
        self.cells.get((y, x, layer.index())).cloned()
    }

    /// View of a single layer, indexed `[y, x]`.
    pub fn layer(&self, layer: WorldMapLayer) -> ArrayView2<u8> {
        self.cells.index_axis(Axis(2), layer.index())
    }

    /// Raw cell data, indexed `[y, x, layer]`.
    pub fn cells(&self) -> &Array3<u8> {
        &self.cells
    }

    /// Add one frame's perception to the map.
    ///
    /// Wall, rock and terrain are accumulated from their range culled samples, sky is ignored. If
    /// the pose is not level, or is not a valid pose at all, nothing is changed and `false` is
    /// returned.
    pub fn update(&mut self, per: &PerOutput, pose: &Pose) -> bool {
        if !pose.is_finite() {
            debug!("Map update skipped, pose is not finite: {:?}", pose);
            return false;
        }

        if !pose.is_level(self.params.level_tolerance) {
            debug!(
                "Map update skipped, rover not level (pitch {:.3}, roll {:.3})",
                pose.pitch_deg, pose.roll_deg
            );
            return false;
        }

        self.accumulate(WorldMapLayer::Wall, &per.wall.rover_points, pose);
        self.accumulate(WorldMapLayer::Rock, &per.rock.rover_points, pose);
        self.accumulate(WorldMapLayer::Terrain, &per.terrain.rover_points, pose);

        true
    }

    /// Increment `layer` in every cell covered by the rover frame `points`.
    ///
    /// Each cell is incremented at most once per call, however many points land in it. This does
    /// not check the pose is level.
    pub fn accumulate(&mut self, layer: WorldMapLayer, points: &[Point2<f64>], pose: &Pose) {
        let mut indices = frame::to_world(points, pose, self.grid_scale, self.params.world_size);
        indices.sort_unstable();
        indices.dedup();

        let l = layer.index();
        for (x, y) in indices {
            if let Some(c) = self.cells.get_mut((y, x, l)) {
                *c = c.saturating_add(self.params.increment);
            }
        }
    }

    /// Render the map as an RGB image, with wall in red, rock in green and terrain in blue.
    ///
    /// The image is flipped vertically so that world +y points up.
    pub fn to_image(&self) -> RgbImage {
        let size = self.params.world_size as u32;

        RgbImage::from_fn(size, size, |x, row| {
            let y = (size - 1 - row) as usize;
            let x = x as usize;

            Rgb([
                self.cells[[y, x, 0]],
                self.cells[[y, x, 1]],
                self.cells[[y, x, 2]],
            ])
        })
    }
}

impl WorldMapLayer {
    pub fn index(&self) -> usize {
        match self {
            WorldMapLayer::Wall => 0,
            WorldMapLayer::Rock => 1,
            WorldMapLayer::Terrain => 2,
        }
    }
}

impl Default for WorldMapParams {
    fn default() -> Self {
        Self {
            world_size: 200,
            increment: 1,
            level_tolerance: 0.01,
        }
    }
}
