//! # Perception module
//!
//! Converts a single forward facing camera frame into per-class samples in the rover frame.
//!
//! Each frame goes through the same pipeline for every class:
//!
//!  - Colour threshold the camera frame into a binary mask
//!  - Warp the mask into the top-down plane
//!  - Cull anything beyond the reliable sensing range
//!  - Convert the remaining pixels into rover frame points and polar samples
//!
//! The forward obstacle corridor and rock tracking are then derived from the rectified masks.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod frame;
pub mod fwd_obst;
pub mod thresh;
pub mod warp;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use log::trace;
use nalgebra::Point2;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

pub use frame::{CoordTransformer, PolarSamples, RangeMask};
pub use fwd_obst::FwdObstMonitor;
pub use thresh::{ChannelBounds, ColourThresh};
pub use warp::{PerspectiveWarper, Quad};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A binary class mask, indexed `[row, col]`.
pub type Mask = Array2<bool>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Perception manager, owns everything computed once from the calibration.
#[derive(Debug, Clone)]
pub struct PerMgr {
    params: PerMgrParams,

    warper: PerspectiveWarper,

    transformer: CoordTransformer,

    range: RangeMask,

    fwd_obst: FwdObstMonitor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerMgrParams {
    /// Expected width of camera frames.
    ///
    /// Units: pixels
    pub image_width_px: u32,

    /// Expected height of camera frames.
    ///
    /// Units: pixels
    pub image_height_px: u32,

    /// Calibration quad in the camera image, as `[x, y]` pixels.
    pub src_quad_px: Quad,

    /// Where the calibration quad lands in the top-down image. If not given a `grid_scale` wide
    /// square centred on the bottom of the image is used.
    pub dst_quad_px: Option<Quad>,

    /// How far above the bottom of the top-down image the derived destination square sits.
    ///
    /// Units: pixels
    pub bottom_offset_px: f64,

    /// Sensing radius.
    ///
    /// Units: grid cells
    pub max_range_cells: f64,

    /// Half width of the forward obstacle corridor.
    ///
    /// Units: pixels
    pub corridor_semi_width_px: usize,

    /// A rock is only tracked if more than this many rectified rock pixels are seen.
    pub min_rock_samples: usize,

    /// Most samples averaged for the nearest obstacle distance.
    pub nearest_obst_max_samples: usize,

    #[serde(deserialize_with = "thresh::terrain_or_default")]
    pub terrain: ColourThresh,

    #[serde(deserialize_with = "thresh::wall_or_default")]
    pub wall: ColourThresh,

    #[serde(deserialize_with = "thresh::rock_or_default")]
    pub rock: ColourThresh,

    #[serde(deserialize_with = "thresh::sky_or_default")]
    pub sky: ColourThresh,
}

/// Everything perception derives for one class from one frame.
#[derive(Debug, Clone)]
pub struct ClassData {
    /// Thresholded camera frame
    pub mask: Mask,

    /// Mask warped into the top-down plane
    pub top_down: Mask,

    /// Top-down mask with out of range pixels removed
    pub culled: Mask,

    /// Rover frame position of every pixel in `culled`
    pub rover_points: Vec<Point2<f64>>,

    /// Polar form of `rover_points`
    pub polar: PolarSamples,
}

/// Output of one perception pass.
#[derive(Debug, Clone)]
pub struct PerOutput {
    pub terrain: ClassData,

    pub wall: ClassData,

    pub rock: ClassData,

    /// Sky above the skyline. Never written to the map.
    pub sky: ClassData,

    /// Obstacle samples within the forward corridor, excluding rocks.
    pub fwd_obst: PolarSamples,

    /// Samples of the currently tracked rock, if there is one.
    pub rock_track: Option<PolarSamples>,

    /// Averaged distance to the closest obstacles in the forward corridor.
    ///
    /// Units: pixels
    pub nearest_obst_dist: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum PerError {
    #[error("The calibration quads are degenerate, the perspective transform can't be computed")]
    DegenerateCalibration,

    #[error("The configured image size ({0}x{1}) has no pixels")]
    ZeroSizeImage(u32, u32),

    #[error("The grid scale must be a positive number of pixels per cell, found {0}")]
    InvalidGridScale(f64),

    #[error("Expected a {expected:?} frame but got {found:?}")]
    FrameSizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerMgr {
    /// Create a new perception manager, computing the perspective transform and the range mask.
    ///
    /// `grid_scale` is the number of top-down pixels in one world grid cell.
    pub fn new(params: PerMgrParams, grid_scale: f64) -> Result<Self, PerError> {
        let (width, height) = (params.image_width_px, params.image_height_px);

        if width == 0 || height == 0 {
            return Err(PerError::ZeroSizeImage(width, height));
        }

        // Also rejects NaN
        if !(grid_scale.is_finite() && grid_scale > 0.0) {
            return Err(PerError::InvalidGridScale(grid_scale));
        }

        let dst = params.dst_quad_px.unwrap_or_else(|| {
            default_dst_quad(width, height, grid_scale, params.bottom_offset_px)
        });

        let warper = PerspectiveWarper::from_quads(&params.src_quad_px, &dst)?;
        let transformer = CoordTransformer::new((height as usize, width as usize));
        let range = RangeMask::new(&transformer, params.max_range_cells * grid_scale);
        let fwd_obst = FwdObstMonitor::new(
            params.corridor_semi_width_px,
            params.nearest_obst_max_samples,
        );

        Ok(Self {
            params,
            warper,
            transformer,
            range,
            fwd_obst,
        })
    }

    pub fn params(&self) -> &PerMgrParams {
        &self.params
    }

    /// Run the perception pipeline on one camera frame.
    ///
    /// The frame must have the dimensions given in the parameters.
    pub fn calculate(&self, image: &RgbImage) -> Result<PerOutput, PerError> {
        let expected = (self.params.image_width_px, self.params.image_height_px);
        if image.dimensions() != expected {
            return Err(PerError::FrameSizeMismatch {
                expected,
                found: image.dimensions(),
            });
        }

        let wall_mask = self.params.wall.classify(image);

        let mut sky_mask = self.params.sky.classify(image);
        clip_to_skyline(&mut sky_mask, &wall_mask);

        let terrain = self.build(self.params.terrain.classify(image));
        let wall = self.build(wall_mask);
        let rock = self.build(self.params.rock.classify(image));
        let sky = self.build(sky_mask);

        // Forward obstacles use the rock view before culling, so distant rocks are still excluded
        let narrow = self.fwd_obst.narrow(&wall.top_down, &rock.top_down, &self.range);
        let fwd_obst = PolarSamples::from(&self.transformer.rover_coords(&narrow)[..]);
        let nearest_obst_dist = self.fwd_obst.nearest_obstacle_distance(&fwd_obst);

        let num_rock_px = count(&rock.top_down);
        let rock_track = if num_rock_px > self.params.min_rock_samples {
            Some(PolarSamples::from(
                &self.transformer.rover_coords(&rock.top_down)[..],
            ))
        } else {
            None
        };

        trace!(
            "Perception: terrain {}, wall {}, rock {} ({} rectified), sky {}, forward obstacle {}",
            terrain.polar.len(),
            wall.polar.len(),
            rock.polar.len(),
            num_rock_px,
            sky.polar.len(),
            fwd_obst.len()
        );

        Ok(PerOutput {
            terrain,
            wall,
            rock,
            sky,
            fwd_obst,
            rock_track,
            nearest_obst_dist,
        })
    }

    fn build(&self, mask: Mask) -> ClassData {
        let top_down = self.warper.warp(&mask);
        let culled = self.range.apply(&top_down);
        let rover_points = self.transformer.rover_coords(&culled);
        let polar = PolarSamples::from(&rover_points[..]);

        ClassData {
            mask,
            top_down,
            culled,
            rover_points,
            polar,
        }
    }
}

impl Default for PerMgrParams {
    fn default() -> Self {
        Self {
            image_width_px: 320,
            image_height_px: 160,
            src_quad_px: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            dst_quad_px: None,
            bottom_offset_px: 0.0,
            max_range_cells: 7.5,
            corridor_semi_width_px: 25,
            min_rock_samples: 5,
            nearest_obst_max_samples: 30,
            terrain: ColourThresh::default_terrain(),
            wall: ColourThresh::default_wall(),
            rock: ColourThresh::default_rock(),
            sky: ColourThresh::default_sky(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Destination quad for the calibration: a `grid_scale` wide square, bottom edge centred on the
/// bottom of the image and raised by `bottom_offset_px`, corners in the same order as the source.
pub fn default_dst_quad(width: u32, height: u32, grid_scale: f64, bottom_offset_px: f64) -> Quad {
    let half = grid_scale / 2.0;
    let mid = width as f64 / 2.0;
    let bottom = height as f64 - bottom_offset_px;
    let top = bottom - grid_scale;

    [
        [mid - half, bottom],
        [mid + half, bottom],
        [mid + half, top],
        [mid - half, top],
    ]
}

/// Clear every sky pixel at or below the first wall pixel in its column. Columns with no wall keep
/// everything above the last row.
fn clip_to_skyline(sky: &mut Mask, wall: &Mask) {
    let rows = wall.nrows();

    for (mut sky_col, wall_col) in sky.axis_iter_mut(Axis(1)).zip(wall.axis_iter(Axis(1))) {
        let skyline = wall_col
            .iter()
            .position(|&w| w)
            .unwrap_or_else(|| rows.saturating_sub(1));

        sky_col
            .iter_mut()
            .skip(skyline)
            .for_each(|v| *v = false);
    }
}

fn count(mask: &Mask) -> usize {
    mask.iter().filter(|&&v| v).count()
}
