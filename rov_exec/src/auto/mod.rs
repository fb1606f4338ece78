//! # Autonomy Module
//!
//! This module provides the autonomy for the rover, turning each camera frame and pose into a
//! drive command while building up a map of the world.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use auto_mgr::AutoMgr;

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Automation Manager module
pub mod auto_mgr;

/// Localisation module - defines the rover's pose
pub mod loc;

/// Navigation module - decides the drive command from perception
pub mod nav;

/// Map module - the persistent world map
pub mod map;

/// Perception module - converts camera frames into classified samples
pub mod per;
