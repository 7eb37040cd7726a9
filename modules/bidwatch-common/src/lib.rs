pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FieldMap, QueryMode, SinkConfig};
pub use error::BidwatchError;
pub use types::*;
