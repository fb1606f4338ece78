//! # Equipment Interface
//!
//! This module defines the structures received from the rover's equipment, or from the simulator
//! standing in for it.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod sim;
