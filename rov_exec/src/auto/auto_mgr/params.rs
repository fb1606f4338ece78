//! # AutoMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::auto::{map::WorldMapParams, nav::NavCtrlParams, per::PerMgrParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoMgrParams {
    /// Number of top-down pixels in one world map cell.
    pub grid_scale: f64,

    pub per: PerMgrParams,

    pub map: WorldMapParams,

    pub nav: NavCtrlParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AutoMgrParams {
    fn default() -> Self {
        Self {
            grid_scale: 10.0,
            per: PerMgrParams::default(),
            map: WorldMapParams::default(),
            nav: NavCtrlParams::default(),
        }
    }
}
