//! # Localisation module
//!
//! The rover's pose is supplied by the simulator every tick and trusted as given. This module only
//! defines the pose type and the checks the rest of the autonomy system performs on it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the rover in the world frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// The position in the world frame
    ///
    /// Units: map units
    pub position: Point2<f64>,

    /// Heading, anticlockwise from the world X axis.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            yaw_deg,
            pitch_deg,
            roll_deg,
        }
    }

    /// True if the position and heading are all finite numbers.
    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.yaw_deg.is_finite()
    }

    /// True if both pitch and roll are close enough to zero for the flat ground assumption to hold.
    ///
    /// Each axis passes if `degrees(1 - cos(angle)) < tolerance`, so attitudes just below 360
    /// degrees count as level as well as those just above 0. A NaN attitude is never level.
    pub fn is_level(&self, tolerance: f64) -> bool {
        let level = |angle_deg: f64| (1.0 - angle_deg.to_radians().cos()).to_degrees() < tolerance;

        level(self.pitch_deg) && level(self.roll_deg)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_level() {
        assert!(Pose::new(0.0, 0.0, 90.0, 0.0, 0.0).is_level(0.01));
        assert!(Pose::new(0.0, 0.0, 90.0, 0.5, 359.5).is_level(0.01));
        assert!(!Pose::new(0.0, 0.0, 90.0, 5.0, 0.0).is_level(0.01));
        assert!(!Pose::new(0.0, 0.0, 90.0, 0.0, 355.0).is_level(0.01));
        assert!(!Pose::new(0.0, 0.0, 90.0, std::f64::NAN, 0.0).is_level(0.01));
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose::new(10.0, 20.0, 45.0, 0.0, 0.0).is_finite());
        assert!(!Pose::new(std::f64::NAN, 20.0, 45.0, 0.0, 0.0).is_finite());
        assert!(!Pose::new(10.0, 20.0, std::f64::INFINITY, 0.0, 0.0).is_finite());
    }
}
