//! Navigation controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the navigation controller
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NavCtrlParams {
    /// Below this many terrain samples the rover stops driving forwards.
    pub stop_forward: usize,

    /// The rover only sets off again once it can see at least this many terrain samples.
    pub go_forward: usize,

    /// Throttle is only applied below this speed.
    pub max_vel: f64,

    /// Throttle applied when driving forwards.
    pub throttle_set: f64,

    /// Brake applied when stopping.
    pub brake_set: f64,

    /// Limit on the steering demand in either direction, never more than
    /// [`STEER_LIMIT_DEG`](super::state::STEER_LIMIT_DEG).
    ///
    /// Units: degrees
    pub max_steer_deg: f64,

    /// Obstacles in the forward corridor closer than this cause an emergency stop.
    ///
    /// Units: top-down pixels
    pub emergency_dist: f64,

    /// Number of consecutive stalled ticks after which the rover backs up.
    pub low_speed_timeout_ticks: u32,

    /// Below this speed a rover under throttle is considered stalled.
    pub low_speed_vel: f64,

    /// Above this speed a stopping rover keeps braking.
    pub stop_vel: f64,

    /// Distance to reverse when backing up.
    pub backup_dist_threshold: f64,

    /// Throttle applied when backing up.
    pub backup_throttle: f64,

    /// Factor applied to the throttle when approaching a rock.
    pub rock_throttle_factor: f64,

    /// When the nearest wall sample is further than this the rover leans towards the wall.
    ///
    /// Units: top-down pixels
    pub wall_follow_dist: f64,

    /// Offset added to the steering target when leaning towards the wall.
    ///
    /// Units: degrees
    pub wall_follow_bias_deg: f64,

    /// Steering demand used to turn on the spot.
    ///
    /// Units: degrees
    pub turn_steer_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NavCtrlParams {
    fn default() -> Self {
        Self {
            stop_forward: 50,
            go_forward: 500,
            max_vel: 2.0,
            throttle_set: 0.2,
            brake_set: 10.0,
            max_steer_deg: 15.0,
            emergency_dist: 10.0,
            low_speed_timeout_ticks: 30,
            low_speed_vel: 0.01,
            stop_vel: 0.2,
            backup_dist_threshold: 0.4,
            backup_throttle: -0.2,
            rock_throttle_factor: 0.25,
            wall_follow_dist: 14.0,
            wall_follow_bias_deg: -11.0,
            turn_steer_deg: 15.0,
        }
    }
}
