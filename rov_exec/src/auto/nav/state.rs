//! Navigation controller state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::drive::DriveCmd;
use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Serialize;
use util::maths::{clamp, norm};

use super::NavCtrlParams;
use crate::auto::per::PolarSamples;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mechanical steering limit. Configured limits beyond this are ignored.
///
/// Units: degrees
pub const STEER_LIMIT_DEG: f64 = 15.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The navigation controller.
pub struct NavCtrl {
    params: NavCtrlParams,

    /// Executing mode
    mode: NavMode,

    /// Number of consecutive ticks the rover has been stalled under throttle
    low_speed_ticks: u32,

    /// Distance reversed so far in the current backup
    backup_dist: f64,

    report: StatusReport,
}

/// Everything the controller needs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct NavInput<'a> {
    /// Open terrain samples, or `None` if there's no vision this tick.
    pub terrain: Option<&'a PolarSamples>,

    /// Range culled wall samples, used for wall following.
    pub wall: Option<&'a PolarSamples>,

    /// Samples of the tracked rock, if any.
    pub rock: Option<&'a PolarSamples>,

    /// Distance to the nearest obstacle in the forward corridor.
    pub nearest_obst_dist: Option<f64>,

    /// Current speed of the rover.
    pub speed: f64,

    /// Current position of the rover.
    pub position: Point2<f64>,

    /// Position of the rover on the previous tick.
    pub prev_position: Option<Point2<f64>>,

    /// The rover is next to a rock sample.
    pub near_sample: bool,

    /// The arm is currently picking up a sample.
    pub picking_up: bool,
}

/// The status report containing various flags and monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The mode at the end of the tick
    pub mode: NavMode,

    /// If true an obstacle is close enough ahead to force a stop
    pub emergency_stop: bool,

    /// If true the rover is next to a sample it should pick up
    pub need_pickup: bool,

    /// True if the rover has no vision this tick
    pub no_vision: bool,

    pub num_terrain_samples: usize,

    pub rock_tracked: bool,

    pub nearest_obst_dist: Option<f64>,

    pub low_speed_ticks: u32,

    pub backup_dist: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of the navigation controller. Each mode is handled by a `mode_xyz`
/// function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum NavMode {
    Forward,
    Stop,
    Backup,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCtrl {
    /// Create a new controller, starting in `Forward` mode.
    pub fn new(params: NavCtrlParams) -> Self {
        Self {
            params,
            mode: NavMode::Forward,
            low_speed_ticks: 0,
            backup_dist: 0.0,
            report: StatusReport::default(),
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Process one tick of navigation.
    ///
    /// Processing involves:
    ///  1. Forcing a stop if there's an obstacle close ahead and no rock is being tracked
    ///  1. Forcing a stop if there's a sample to pick up
    ///  1. Forcing a backup if the rover has been stalled for too long
    ///  1. Running the current mode to get the command
    ///  1. Requesting a pickup if the rover is next to a sample and stationary
    pub fn proc(&mut self, input: &NavInput) -> (DriveCmd, StatusReport) {
        let mut emergency_stop = false;

        if input.rock.is_none() {
            if let Some(dist) = input.nearest_obst_dist {
                if dist < self.params.emergency_dist {
                    if self.mode != NavMode::Stop {
                        info!("Emergency stop, obstacle {:.2} ahead", dist);
                    }
                    self.set_mode(NavMode::Stop);
                    emergency_stop = true;
                }
            }
        }

        let need_pickup = input.near_sample && !input.picking_up;
        if need_pickup {
            if self.mode != NavMode::Stop {
                info!("Near a sample, stopping to pick it up");
            }
            self.set_mode(NavMode::Stop);
            emergency_stop = false;
        }

        if self.low_speed_ticks > self.params.low_speed_timeout_ticks {
            warn!(
                "Rover stalled for {} ticks, backing up",
                self.low_speed_ticks
            );
            self.set_mode(NavMode::Backup);
            self.low_speed_ticks = 0;
        }

        let mut cmd = match input.terrain {
            Some(terrain) => match self.mode {
                NavMode::Forward => self.mode_forward(input, terrain),
                NavMode::Stop => self.mode_stop(input, terrain, emergency_stop, need_pickup),
                NavMode::Backup => self.mode_backup(input),
            },
            None => {
                debug!("No vision, driving straight ahead");
                DriveCmd {
                    throttle: self.params.throttle_set,
                    ..DriveCmd::coast()
                }
            }
        };

        // Only when exactly stationary
        cmd.send_pickup = input.near_sample && input.speed == 0.0 && !input.picking_up;
        if cmd.send_pickup {
            info!("Requesting sample pickup");
        }

        self.report = StatusReport {
            mode: self.mode,
            emergency_stop,
            need_pickup,
            no_vision: input.terrain.is_none(),
            num_terrain_samples: input.terrain.map_or(0, PolarSamples::len),
            rock_tracked: input.rock.is_some(),
            nearest_obst_dist: input.nearest_obst_dist,
            low_speed_ticks: self.low_speed_ticks,
            backup_dist: self.backup_dist,
        };

        (cmd, self.report)
    }

    fn set_mode(&mut self, mode: NavMode) {
        if mode != self.mode {
            info!("NavCtrl mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    fn clamp_steer(&self, steer_deg: f64) -> f64 {
        let limit = self.params.max_steer_deg.abs().min(STEER_LIMIT_DEG);
        clamp(steer_deg, -limit, limit)
    }

    /// Mode forward
    ///
    /// Drive towards the tracked rock if there is one, otherwise along the open terrain, and stop
    /// once there isn't enough open terrain left.
    fn mode_forward(&mut self, input: &NavInput, terrain: &PolarSamples) -> DriveCmd {
        if terrain.len() < self.params.stop_forward {
            self.set_mode(NavMode::Stop);
            return DriveCmd::brake(self.params.brake_set);
        }

        let mut throttle = if input.speed < self.params.max_vel {
            let stalled = input.speed < self.params.low_speed_vel
                && input.rock.is_none()
                && !(input.near_sample || input.picking_up);

            if stalled {
                self.low_speed_ticks += 1;
            }

            self.params.throttle_set
        } else {
            0.0
        };

        let target_deg = match input.rock {
            Some(rock) => {
                throttle *= self.params.rock_throttle_factor;
                rock.mean_angle_deg()
            }
            None => terrain.mean_angle_deg().map(|angle| {
                // Lean towards the wall on the right if it's drifted too far away
                match input.wall.and_then(PolarSamples::min_dist) {
                    Some(d) if d > self.params.wall_follow_dist => {
                        angle + self.params.wall_follow_bias_deg
                    }
                    _ => angle,
                }
            }),
        };

        DriveCmd {
            throttle,
            brake: 0.0,
            steer_deg: self.clamp_steer(target_deg.unwrap_or(0.0)),
            send_pickup: false,
        }
    }

    /// Mode stop
    ///
    /// Brake until slow, then turn on the spot until there's enough open terrain to drive forward.
    /// While a sample needs picking up the brake is held.
    fn mode_stop(
        &mut self,
        input: &NavInput,
        terrain: &PolarSamples,
        emergency_stop: bool,
        need_pickup: bool,
    ) -> DriveCmd {
        self.low_speed_ticks = 0;

        if input.speed > self.params.stop_vel || need_pickup {
            return DriveCmd::brake(self.params.brake_set);
        }

        if terrain.len() < self.params.go_forward || emergency_stop {
            return DriveCmd {
                steer_deg: self.clamp_steer(self.params.turn_steer_deg),
                ..DriveCmd::coast()
            };
        }

        self.set_mode(NavMode::Forward);

        DriveCmd {
            throttle: self.params.throttle_set,
            brake: 0.0,
            steer_deg: self.clamp_steer(terrain.mean_angle_deg().unwrap_or(0.0)),
            send_pickup: false,
        }
    }

    /// Mode backup
    ///
    /// Reverse in a straight line until the backup distance has been covered.
    fn mode_backup(&mut self, input: &NavInput) -> DriveCmd {
        if let Some(prev) = input.prev_position {
            let moved = norm(
                &[input.position.x, input.position.y],
                &[prev.x, prev.y],
            );

            if let Some(d) = moved.filter(|d| d.is_finite()) {
                self.backup_dist += d;
            }
        }

        if self.backup_dist > self.params.backup_dist_threshold {
            self.backup_dist = 0.0;
            self.set_mode(NavMode::Stop);
        }

        DriveCmd {
            throttle: self.params.backup_throttle,
            ..DriveCmd::coast()
        }
    }
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Forward
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn samples(num: usize, angle_deg: f64, dist: f64) -> PolarSamples {
        PolarSamples {
            dists: vec![dist; num],
            angles_rad: vec![angle_deg.to_radians(); num],
        }
    }

    fn input(terrain: Option<&PolarSamples>) -> NavInput {
        NavInput {
            terrain,
            wall: None,
            rock: None,
            nearest_obst_dist: None,
            speed: 1.0,
            position: Point2::new(10.0, 10.0),
            prev_position: Some(Point2::new(10.0, 10.0)),
            near_sample: false,
            picking_up: false,
        }
    }

    fn assert_cmd(cmd: DriveCmd, throttle: f64, brake: f64, steer_deg: f64) {
        assert!((cmd.throttle - throttle).abs() < 1e-9, "throttle {:?}", cmd);
        assert!((cmd.brake - brake).abs() < 1e-9, "brake {:?}", cmd);
        assert!((cmd.steer_deg - steer_deg).abs() < 1e-9, "steer {:?}", cmd);
    }

    #[test]
    fn test_forward_no_terrain() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(0, 0.0, 0.0);

        let (cmd, report) = nav.proc(&input(Some(&terrain)));

        assert_cmd(cmd, 0.0, 10.0, 0.0);
        assert_eq!(nav.mode(), NavMode::Stop);
        assert_eq!(report.mode, NavMode::Stop);
    }

    #[test]
    fn test_forward_drive() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(100, 5.0, 30.0);

        let (cmd, _) = nav.proc(&input(Some(&terrain)));
        assert_cmd(cmd, 0.2, 0.0, 5.0);
        assert_eq!(nav.mode(), NavMode::Forward);

        // Steering is limited
        let terrain = samples(100, -40.0, 30.0);
        let (cmd, _) = nav.proc(&input(Some(&terrain)));
        assert_cmd(cmd, 0.2, 0.0, -15.0);

        // Coast at max speed
        let mut fast = input(Some(&terrain));
        fast.speed = 2.5;
        let (cmd, _) = nav.proc(&fast);
        assert_cmd(cmd, 0.0, 0.0, -15.0);
    }

    #[test]
    fn test_wall_follow() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(100, 2.0, 30.0);

        // Wall far away, lean right
        let far = samples(10, 40.0, 20.0);
        let mut inp = input(Some(&terrain));
        inp.wall = Some(&far);
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, -9.0);

        // Wall close, no lean
        let near = samples(10, 40.0, 12.0);
        inp.wall = Some(&near);
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, 2.0);

        // No wall at all, no lean
        let none = samples(0, 0.0, 0.0);
        inp.wall = Some(&none);
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, 2.0);
    }

    #[test]
    fn test_rock_approach() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(100, -10.0, 30.0);
        let rock = samples(10, 8.0, 20.0);

        let mut inp = input(Some(&terrain));
        inp.rock = Some(&rock);

        // Obstacles ahead are ignored while a rock is tracked
        inp.nearest_obst_dist = Some(3.0);

        let (cmd, report) = nav.proc(&inp);
        assert_cmd(cmd, 0.05, 0.0, 8.0);
        assert_eq!(nav.mode(), NavMode::Forward);
        assert!(report.rock_tracked);
        assert!(!report.emergency_stop);
    }

    #[test]
    fn test_stop_to_forward() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        nav.mode = NavMode::Stop;
        let terrain = samples(600, 7.0, 30.0);

        let mut inp = input(Some(&terrain));
        inp.speed = 0.1;

        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, 7.0);
        assert_eq!(nav.mode(), NavMode::Forward);
    }

    #[test]
    fn test_stop_turn() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        nav.mode = NavMode::Stop;
        let terrain = samples(200, -7.0, 30.0);

        // Still moving, keep braking
        let (cmd, _) = nav.proc(&input(Some(&terrain)));
        assert_cmd(cmd, 0.0, 10.0, 0.0);

        // Stopped but not enough terrain to go, turn on the spot
        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.0, 0.0, 15.0);
        assert_eq!(nav.mode(), NavMode::Stop);
    }

    #[test]
    fn test_steer_limit() {
        let mut nav = NavCtrl::new(NavCtrlParams {
            turn_steer_deg: 25.0,
            max_steer_deg: 30.0,
            ..Default::default()
        });
        nav.mode = NavMode::Stop;

        // Turning on the spot
        let terrain = samples(10, 0.0, 30.0);
        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.0, 0.0, 15.0);
        assert_eq!(nav.mode(), NavMode::Stop);

        // Driving forwards
        let terrain = samples(600, -40.0, 30.0);
        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;
        let (cmd, _) = nav.proc(&inp);
        assert_eq!(nav.mode(), NavMode::Forward);
        assert_cmd(cmd, 0.2, 0.0, -15.0);

        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, -15.0);

        // A tighter configured limit still applies
        let mut nav = NavCtrl::new(NavCtrlParams {
            max_steer_deg: 10.0,
            ..Default::default()
        });
        let terrain = samples(600, 40.0, 30.0);
        let (cmd, _) = nav.proc(&input(Some(&terrain)));
        assert_cmd(cmd, 0.2, 0.0, 10.0);
    }

    #[test]
    fn test_emergency_stop() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(600, 0.0, 30.0);

        let mut inp = input(Some(&terrain));
        inp.nearest_obst_dist = Some(5.0);

        let (cmd, report) = nav.proc(&inp);
        assert_cmd(cmd, 0.0, 10.0, 0.0);
        assert_eq!(nav.mode(), NavMode::Stop);
        assert!(report.emergency_stop);

        // Once stopped turn away, even though there's lots of terrain
        inp.speed = 0.0;
        let (cmd, _) = nav.proc(&inp);
        assert_cmd(cmd, 0.0, 0.0, 15.0);
        assert_eq!(nav.mode(), NavMode::Stop);

        // Obstacle gone, set off again
        inp.nearest_obst_dist = Some(25.0);
        let (cmd, report) = nav.proc(&inp);
        assert_cmd(cmd, 0.2, 0.0, 0.0);
        assert_eq!(nav.mode(), NavMode::Forward);
        assert!(!report.emergency_stop);
    }

    #[test]
    fn test_pickup_overrides_emergency() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(600, 0.0, 30.0);

        let mut inp = input(Some(&terrain));
        inp.nearest_obst_dist = Some(5.0);
        inp.near_sample = true;
        inp.speed = 0.1;

        let (cmd, report) = nav.proc(&inp);
        assert_eq!(nav.mode(), NavMode::Stop);
        assert!(!report.emergency_stop);
        assert!(report.need_pickup);

        // Brake held until the pickup starts
        assert_cmd(cmd, 0.0, 10.0, 0.0);
        assert!(!cmd.send_pickup);
    }

    #[test]
    fn test_pickup_request() {
        let terrain = samples(600, 0.0, 30.0);

        for &mode in &[NavMode::Forward, NavMode::Stop, NavMode::Backup] {
            for &terrain in &[Some(&terrain), None] {
                let mut nav = NavCtrl::new(NavCtrlParams::default());
                nav.mode = mode;

                let mut inp = input(terrain);
                inp.near_sample = true;
                inp.speed = 0.0;

                let (cmd, _) = nav.proc(&inp);
                assert!(cmd.send_pickup);

                // Not while already picking up, or while moving at all
                inp.picking_up = true;
                assert!(!nav.proc(&inp).0.send_pickup);

                inp.picking_up = false;
                inp.speed = 1e-6;
                assert!(!nav.proc(&inp).0.send_pickup);
            }
        }
    }

    #[test]
    fn test_no_vision() {
        for &mode in &[NavMode::Forward, NavMode::Stop, NavMode::Backup] {
            let mut nav = NavCtrl::new(NavCtrlParams::default());
            nav.mode = mode;

            let (cmd, report) = nav.proc(&input(None));
            assert_cmd(cmd, 0.2, 0.0, 0.0);
            assert_eq!(nav.mode(), mode);
            assert!(report.no_vision);
        }
    }

    #[test]
    fn test_stall_and_backup() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let terrain = samples(600, 0.0, 30.0);

        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;

        // Stalled under throttle
        for _ in 0..31 {
            let (cmd, _) = nav.proc(&inp);
            assert_cmd(cmd, 0.2, 0.0, 0.0);
            assert_eq!(nav.mode(), NavMode::Forward);
        }
        assert_eq!(nav.report().low_speed_ticks, 31);

        // Reverse until 0.4 has been covered
        let mut pos = Point2::new(10.0, 10.0);
        for _ in 0..2 {
            inp.prev_position = Some(pos);
            pos.x -= 0.15;
            inp.position = pos;

            let (cmd, report) = nav.proc(&inp);
            assert_cmd(cmd, -0.2, 0.0, 0.0);
            assert_eq!(nav.mode(), NavMode::Backup);
            assert_eq!(report.low_speed_ticks, 0);
        }

        inp.prev_position = Some(pos);
        pos.x -= 0.15;
        inp.position = pos;

        let (cmd, report) = nav.proc(&inp);
        assert_cmd(cmd, -0.2, 0.0, 0.0);
        assert_eq!(nav.mode(), NavMode::Stop);
        assert_eq!(report.backup_dist, 0.0);
    }

    #[test]
    fn test_no_stall_while_approaching() {
        let terrain = samples(600, 0.0, 30.0);
        let rock = samples(10, 3.0, 20.0);

        // Tracking a rock
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;
        inp.rock = Some(&rock);

        for _ in 0..40 {
            let (cmd, report) = nav.proc(&inp);
            assert_cmd(cmd, 0.05, 0.0, 3.0);
            assert_eq!(report.low_speed_ticks, 0);
            assert_eq!(nav.mode(), NavMode::Forward);
        }

        // Near a sample and already picking it up
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        let mut inp = input(Some(&terrain));
        inp.speed = 0.0;
        inp.near_sample = true;
        inp.picking_up = true;

        for _ in 0..40 {
            let (cmd, report) = nav.proc(&inp);
            assert_cmd(cmd, 0.2, 0.0, 0.0);
            assert!(!cmd.send_pickup);
            assert_eq!(report.low_speed_ticks, 0);
            assert_eq!(nav.mode(), NavMode::Forward);
        }

        // Picking up without being near a sample any more
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        inp.near_sample = false;

        for _ in 0..40 {
            let (_, report) = nav.proc(&inp);
            assert_eq!(report.low_speed_ticks, 0);
            assert_ne!(nav.mode(), NavMode::Backup);
        }
    }

    #[test]
    fn test_backup_bad_position() {
        let mut nav = NavCtrl::new(NavCtrlParams::default());
        nav.mode = NavMode::Backup;
        let terrain = samples(600, 0.0, 30.0);

        let mut inp = input(Some(&terrain));
        inp.prev_position = None;
        nav.proc(&inp);

        inp.prev_position = Some(Point2::new(f64::NAN, 0.0));
        nav.proc(&inp);

        assert_eq!(nav.report().backup_dist, 0.0);
        assert_eq!(nav.mode(), NavMode::Backup);
    }
}
