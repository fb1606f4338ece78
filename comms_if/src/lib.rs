//! # Communications interface crate.
//!
//! Provides the data exchanged between the rover software and the harness driving it: camera
//! frames and telemetry coming in, drive commands going out.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands issued by the rover software to the vehicle
pub mod tc;

/// Data produced by equipment (camera, simulator) for the rover software
pub mod eqpt;
