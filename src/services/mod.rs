pub mod detention_service;
pub mod fleet_service;
pub mod plan_service;
pub mod timeline;
pub mod validation_service;
