//! # Defines Telemetry Pack for Autonomy

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use comms_if::tc::drive::DriveCmd;
use serde::Serialize;

use crate::auto::{loc::Pose, nav::NavMode, nav::StatusReport, per::PerOutput};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Summary of one autonomy tick.
///
/// Flat so it can be archived as a single CSV row.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AutoTm {
    pub pos_x: f64,
    pub pos_y: f64,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub speed: f64,

    /// True if a frame was successfully processed this tick
    pub vision: bool,
    pub map_updated: bool,
    pub num_terrain: usize,
    pub num_wall: usize,
    pub num_rock: usize,
    pub num_fwd_obst: usize,

    pub nav_mode: NavMode,
    pub emergency_stop: bool,
    pub need_pickup: bool,
    pub rock_tracked: bool,
    pub nearest_obst_dist: Option<f64>,
    pub low_speed_ticks: u32,
    pub backup_dist: f64,

    pub throttle: f64,
    pub brake: f64,
    pub steer_deg: f64,
    pub send_pickup: bool,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl AutoTm {
    pub fn new(
        pose: &Pose,
        speed: f64,
        per: Option<&PerOutput>,
        map_updated: bool,
        report: &StatusReport,
        cmd: &DriveCmd,
    ) -> Self {
        let count = |f: fn(&PerOutput) -> usize| per.map_or(0, f);

        Self {
            pos_x: pose.position.x,
            pos_y: pose.position.y,
            yaw_deg: pose.yaw_deg,
            pitch_deg: pose.pitch_deg,
            roll_deg: pose.roll_deg,
            speed,
            vision: per.is_some(),
            map_updated,
            num_terrain: count(|p| p.terrain.polar.len()),
            num_wall: count(|p| p.wall.polar.len()),
            num_rock: count(|p| p.rock.polar.len()),
            num_fwd_obst: count(|p| p.fwd_obst.len()),
            nav_mode: report.mode,
            emergency_stop: report.emergency_stop,
            need_pickup: report.need_pickup,
            rock_tracked: report.rock_tracked,
            nearest_obst_dist: report.nearest_obst_dist,
            low_speed_ticks: report.low_speed_ticks,
            backup_dist: report.backup_dist,
            throttle: cmd.throttle,
            brake: cmd.brake,
            steer_deg: cmd.steer_deg,
            send_pickup: cmd.send_pickup,
        }
    }
}
