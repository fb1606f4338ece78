//! # Navigation
//!
//! This module provides the reactive navigation controller, which decides the drive command for
//! each tick from the current perception output alone.
//!
//! The controller has three modes:
//! - `Forward` - drive towards the mean direction of open terrain, or towards a tracked rock. If
//!   the rover is at a standstill under throttle for too long it's assumed to be stuck.
//! - `Stop` - brake to a halt, then turn on the spot until there's enough open terrain to set off
//!   again.
//! - `Backup` - reverse a short distance to get unstuck.
//!
//! An obstacle close ahead forces an emergency stop, and being next to a rock sample forces a stop
//! so it can be picked up.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::NavCtrlParams;
pub use state::*;
