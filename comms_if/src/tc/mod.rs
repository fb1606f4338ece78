//! # Telecommand module
//!
//! Commands sent from the rover software to the vehicle's actuators.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive;
