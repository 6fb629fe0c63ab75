pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use config::{Config, RetryConfig, SourceConfig};
pub use error::FlagStatusError;
pub use types::*;
pub use validate::{validate, validate_json, validate_record, Validation};
