//! # Coordinate frames
//!
//! Conversions between the rectified top-down image, the rover frame and the world grid, plus the
//! static sensing-range mask.
//!
//! The rover frame has its origin at the bottom centre of the rectified image, with +x forward (up
//! the image) and +y to the left. Rover frame units are top-down pixels, and `grid_scale` of them
//! make one world grid cell.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Rotation2};
use ndarray::Array2;
use serde::Serialize;

use super::Mask;
use crate::auto::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Converts between image pixels and rover frame coordinates for a fixed image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordTransformer {
    rows: usize,
    cols: usize,
}

/// A set of rover frame samples in polar form, one distance and angle per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolarSamples {
    /// Units: top-down pixels
    pub dists: Vec<f64>,

    /// Angle from the rover's forward axis, positive to the left.
    ///
    /// Units: radians
    pub angles_rad: Vec<f64>,
}

/// Static mask of top-down pixels which are too far from the rover to be trusted.
#[derive(Debug, Clone)]
pub struct RangeMask {
    culled: Mask,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CoordTransformer {
    /// Create a transformer for masks of the given `(rows, cols)` shape.
    pub fn new(dim: (usize, usize)) -> Self {
        Self {
            rows: dim.0,
            cols: dim.1,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Position of the given pixel in the rover frame.
    pub fn to_rover_frame(&self, row: usize, col: usize) -> Point2<f64> {
        Point2::new(
            self.rows as f64 - row as f64,
            self.cols as f64 / 2.0 - col as f64,
        )
    }

    /// Pixel containing the given rover frame point, as `(row, col)`, or `None` if the point lies
    /// outside the image.
    pub fn to_image_frame(&self, point: &Point2<f64>) -> Option<(usize, usize)> {
        let row = (self.rows as f64 - point.x).round();
        let col = (self.cols as f64 / 2.0 - point.y).round();

        if !(row >= 0.0 && col >= 0.0 && row < self.rows as f64 && col < self.cols as f64) {
            return None;
        }

        Some((row as usize, col as usize))
    }

    /// Rover frame positions of every set pixel in the mask, in row-major order.
    pub fn rover_coords(&self, mask: &Mask) -> Vec<Point2<f64>> {
        mask.indexed_iter()
            .filter(|(_, v)| **v)
            .map(|((row, col), _)| self.to_rover_frame(row, col))
            .collect()
    }
}

impl PolarSamples {
    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    /// Mean sample angle, or `None` if there are no samples.
    ///
    /// Units: degrees
    pub fn mean_angle_deg(&self) -> Option<f64> {
        util::maths::mean(&self.angles_rad).map(f64::to_degrees)
    }

    /// Distance to the closest sample, or `None` if there are no samples.
    pub fn min_dist(&self) -> Option<f64> {
        self.dists.iter().cloned().fold(None, |acc, d| match acc {
            Some(m) if m <= d => Some(m),
            _ => Some(d),
        })
    }
}

impl From<&[Point2<f64>]> for PolarSamples {
    fn from(points: &[Point2<f64>]) -> Self {
        let (dists, angles_rad) = points.iter().map(to_polar).unzip();

        Self { dists, angles_rad }
    }
}

impl RangeMask {
    /// Build the mask for the transformer's image shape, culling every pixel further than
    /// `max_range_px` from the rover.
    pub fn new(transformer: &CoordTransformer, max_range_px: f64) -> Self {
        let mut culled = Array2::from_elem(transformer.dim(), false);

        let all = Array2::from_elem(transformer.dim(), true);

        for point in transformer.rover_coords(&all) {
            let (dist, _) = to_polar(&point);

            if dist > max_range_px {
                if let Some(idx) = transformer.to_image_frame(&point) {
                    culled[idx] = true;
                }
            }
        }

        Self { culled }
    }

    pub fn is_culled(&self, row: usize, col: usize) -> bool {
        self.culled.get((row, col)).cloned().unwrap_or(true)
    }

    /// Copy of the mask with every culled pixel cleared.
    ///
    /// The mask must have the same shape as the one this range mask was built for. Any pixels
    /// outside that shape are cleared.
    pub fn apply(&self, mask: &Mask) -> Mask {
        let mut out = mask.clone();

        for ((row, col), v) in out.indexed_iter_mut() {
            if *v && self.is_culled(row, col) {
                *v = false;
            }
        }

        out
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a rover frame point to `(distance, angle_rad)`.
pub fn to_polar(point: &Point2<f64>) -> (f64, f64) {
    (point.x.hypot(point.y), point.y.atan2(point.x))
}

/// Convert rover frame points into world grid indices `(x, y)`.
///
/// Each point is rotated by the rover's yaw, scaled from pixels into grid cells, offset by the
/// rover's position and truncated. Indices are clipped into `[0, world_size - 1]`, so a
/// pathological pose can never produce an out of bounds index.
pub fn to_world(
    points: &[Point2<f64>],
    pose: &Pose,
    grid_scale: f64,
    world_size: usize,
) -> Vec<(usize, usize)> {
    let rot = Rotation2::new(pose.yaw_deg.to_radians());
    let max = world_size.saturating_sub(1) as i64;

    let clip = |v: f64| (v as i64).max(0).min(max) as usize;

    points
        .iter()
        .map(|p| {
            let w = rot * p.coords / grid_scale + pose.position.coords;
            (clip(w.x), clip(w.y))
        })
        .collect()
}
