pub mod fleet_repository;
pub mod plan_repository;
