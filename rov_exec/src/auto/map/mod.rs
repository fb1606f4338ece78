//! # Map
//!
//! This module implements the [`WorldMap`], the only product of the autonomy system which persists
//! for the whole mission.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`WorldMap`] type
mod world_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use world_map::{WorldMap, WorldMapLayer, WorldMapParams};
