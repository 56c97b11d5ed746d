pub mod rest;
pub mod risearch;
pub mod xml;

pub use rest::{DatastreamOptions, FindQuery, RestApi};
pub use risearch::ResourceIndex;
