pub mod concurrent;
pub mod engine;
pub mod report;

pub use crate::app::pipelines::repair_pipeline::{RepairOptions, RepairPipeline};
pub use crate::app::pipelines::validate_pipeline::{ValidateOptions, ValidatePipeline};
pub use crate::domain::model::{CheckOutcome, ChecksumStatus, DatastreamCheck, RunReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use concurrent::ProgressHook;
