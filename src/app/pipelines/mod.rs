pub mod repair_pipeline;
pub mod validate_pipeline;
