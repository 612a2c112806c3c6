//! chatline configuration.
//!
//! TOML-based configuration with validation. Every section has defaults, so
//! an empty or partial file works out of the box.

pub mod paths;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ChatlineConfig, ConnectionConfig, LogLevel, LoggingConfig, StorageConfig,
    CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use chatline_common::ConfigError;

/// Load config from an explicit path, or from the platform default path
/// (creating it when missing) when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ChatlineConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}
