//! Maintenance fleet operation planning core.
//!
//! Schedules which rail maintenance vehicle occupies which base during
//! which shift. The consistency engine in [`services::validation_service`]
//! rejects overlapping time windows (overnight spans included) and broken
//! base chains before a plan reaches the store; [`services::detention_service`]
//! derives where a vehicle rests on days without an explicit plan.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
