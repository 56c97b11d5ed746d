pub mod api;
pub mod app;
pub mod checksum;
pub mod config;
pub mod core;
pub mod domain;
pub mod indexdata;
pub mod models;
pub mod rdf;
pub mod repository;
pub mod utils;

pub use api::{ResourceIndex, RestApi};
pub use checksum::ChecksumType;
pub use config::{cli::LocalStorage, FedoraSettings};
pub use core::engine::CheckEngine;
pub use core::{RepairOptions, RepairPipeline, ValidateOptions, ValidatePipeline};
pub use models::{Datastream, DigitalObject};
pub use repository::Repository;
pub use utils::error::{FedoraError, Result};
