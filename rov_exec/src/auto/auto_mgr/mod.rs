//! # AutoMgr module
//!
//! This module implements the [`AutoMgr`], which runs one tick of the autonomy system for each
//! camera frame and pose delivered by the simulator:
//!
//! - Perception turns the frame into per-class samples
//! - The world map accumulates those samples if the rover is level
//! - The navigation controller decides the drive command
//!
//! A tick never fails. A missing or unusable frame is treated as having no vision for that tick.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::drive::DriveCmd;
use image::RgbImage;
use log::{debug, warn};
use nalgebra::Point2;

pub use self::{params::AutoMgrParams, tm::AutoTm};

use super::{
    loc::Pose,
    map::WorldMap,
    nav::{NavCtrl, NavInput, NavMode},
    per::{PerError, PerMgr},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Autonomy Manager
///
/// Owns all state which persists between ticks: the world map and the navigation controller.
pub struct AutoMgr {
    /// Parameters for the AutoMgr and all it's modules.
    params: AutoMgrParams,

    per_mgr: PerMgr,

    world_map: WorldMap,

    nav_ctrl: NavCtrl,

    /// Telemetry from the most recent tick
    tm: AutoTm,
}

/// Everything delivered by the simulator for one tick.
#[derive(Debug, Clone)]
pub struct TickInput {
    /// The camera frame, if one was received
    pub image: Option<RgbImage>,

    pub pose: Pose,

    pub speed: f64,

    /// The rover is close enough to a sample to pick it up
    pub near_sample: bool,

    /// The arm is currently picking up a sample
    pub picking_up: bool,

    /// Position of the rover on the previous tick
    pub prev_position: Option<Point2<f64>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the autonomy manager.
#[derive(Debug, thiserror::Error)]
pub enum AutoMgrError {
    #[error("Failed to load AutoMgrParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Failed to initialise perception: {0}")]
    PerInitError(PerError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AutoMgr {
    /// Load the parameters from the given file, relative to the software root, and create the
    /// manager.
    pub fn init(params_path: &str) -> Result<Self, AutoMgrError> {
        let params: AutoMgrParams =
            util::params::load(params_path).map_err(AutoMgrError::ParamLoadError)?;

        Self::new(params)
    }

    pub fn new(params: AutoMgrParams) -> Result<Self, AutoMgrError> {
        let per_mgr = PerMgr::new(params.per.clone(), params.grid_scale)
            .map_err(AutoMgrError::PerInitError)?;

        Ok(Self {
            world_map: WorldMap::new(params.map, params.grid_scale),
            nav_ctrl: NavCtrl::new(params.nav.clone()),
            per_mgr,
            params,
            tm: AutoTm::default(),
        })
    }

    /// Run one tick, returning the drive command.
    ///
    /// The frame is consumed by the tick.
    pub fn step(&mut self, input: TickInput) -> DriveCmd {
        let per_out = input
            .image
            .as_ref()
            .and_then(|image| match self.per_mgr.calculate(image) {
                Ok(out) => Some(out),
                Err(e) => {
                    warn!("Perception failed, no vision this tick: {}", e);
                    None
                }
            });

        let map_updated = match per_out {
            Some(ref out) => self.world_map.update(out, &input.pose),
            None => false,
        };

        let nav_input = NavInput {
            terrain: per_out.as_ref().map(|o| &o.terrain.polar),
            wall: per_out.as_ref().map(|o| &o.wall.polar),
            rock: per_out.as_ref().and_then(|o| o.rock_track.as_ref()),
            nearest_obst_dist: per_out.as_ref().and_then(|o| o.nearest_obst_dist),
            speed: input.speed,
            position: input.pose.position,
            prev_position: input.prev_position,
            near_sample: input.near_sample,
            picking_up: input.picking_up,
        };

        let (cmd, report) = self.nav_ctrl.proc(&nav_input);

        debug!(
            "Tick: {:?} throttle {:.2}, brake {:.2}, steer {:.2}",
            report.mode, cmd.throttle, cmd.brake, cmd.steer_deg
        );

        self.tm = AutoTm::new(
            &input.pose,
            input.speed,
            per_out.as_ref(),
            map_updated,
            &report,
            &cmd,
        );

        cmd
    }

    pub fn params(&self) -> &AutoMgrParams {
        &self.params
    }

    /// The persistent world map.
    pub fn world_map(&self) -> &WorldMap {
        &self.world_map
    }

    pub fn nav_mode(&self) -> NavMode {
        self.nav_ctrl.mode()
    }

    /// Telemetry from the most recent tick.
    pub fn get_tm(&self) -> AutoTm {
        self.tm.clone()
    }
}
