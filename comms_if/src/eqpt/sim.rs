//! # Simulator Telemetry Module
//!
//! The simulator publishes one [`SimTlm`] record per control tick. Recorded drives are stored as
//! JSON lines, one record per line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::cam::CamFrame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry for a single tick.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimTlm {
    /// Index of the tick this record belongs to
    pub tick: u64,

    /// Position of the rover in the world frame
    ///
    /// Units: map units (1 unit = 1 world map cell)
    pub position: [f64; 2],

    /// Heading of the rover, anticlockwise from the world X axis
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,

    /// Forward speed of the rover
    ///
    /// Units: map units/second
    pub speed: f64,

    /// True if the rover is close enough to a rock sample to pick it up
    #[serde(default)]
    pub near_sample: bool,

    /// True while the pickup arm is busy
    #[serde(default)]
    pub picking_up: bool,

    /// The forward camera frame, if one was captured on this tick
    #[serde(default)]
    pub frame: Option<CamFrame>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimTlmError {
    #[error("Telemetry record contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimTlm {
    /// Parse a telemetry record from a single JSON line.
    pub fn from_json(json_str: &str) -> Result<Self, SimTlmError> {
        serde_json::from_str(json_str).map_err(SimTlmError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        let tlm = SimTlm::from_json(
            r#"{"tick": 12, "position": [99.7, 85.6], "yaw_deg": 56.8, "pitch_deg": 0.0,
                "roll_deg": 359.9, "speed": 0.4, "near_sample": true}"#,
        )
        .unwrap();

        assert_eq!(tlm.tick, 12);
        assert_eq!(tlm.position, [99.7, 85.6]);
        assert!(tlm.near_sample);
        assert!(!tlm.picking_up);
        assert!(tlm.frame.is_none());

        assert!(SimTlm::from_json(r#"{"tick": 1}"#).is_err());
    }
}
