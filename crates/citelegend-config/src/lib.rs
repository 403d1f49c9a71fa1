//! # Citelegend Config
//!
//! TOML configuration for the citation legend tool.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
