//! # Drive telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The command sent to the vehicle at the end of every tick.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveCmd {
    /// Throttle demand, positive forwards and negative in reverse.
    pub throttle: f64,

    /// Brake demand, always positive or zero.
    pub brake: f64,

    /// Steering angle demand, positive to the left.
    ///
    /// Units: degrees
    pub steer_deg: f64,

    /// Request the arm to pick up the sample the rover is next to.
    pub send_pickup: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveCmd {
    /// No throttle, no brake, wheels straight.
    pub fn coast() -> Self {
        Self::default()
    }

    /// Full brake with the wheels straight.
    pub fn brake(brake: f64) -> Self {
        Self {
            brake,
            ..Self::default()
        }
    }
}
