//! # ReplyKit Config
//!
//! Configuration management for ReplyKit: the TOML schema, a loader with
//! environment expansion, a validator, and the read-only settings boundary
//! the engine consults before each request.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::{FileSettings, SettingsSource};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
