pub mod error;
pub mod logger;
#[cfg(feature = "cli")]
pub mod progress;
pub mod time;
pub mod validation;
