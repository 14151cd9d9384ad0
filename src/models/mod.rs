pub mod conflict;
pub mod fleet;
pub mod operation_plan;
