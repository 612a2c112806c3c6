//! Maps the loaded config and CLI overrides onto session settings.

use std::path::PathBuf;

use chatline_common::ConfigError;
use chatline_config::ChatlineConfig;
use chatline_session::{RetryPolicy, SessionSettings};

pub fn session_settings(config: &ChatlineConfig, endpoint: Option<&str>) -> SessionSettings {
    let connection = &config.connection;
    SessionSettings {
        endpoint: endpoint
            .map(str::to_string)
            .unwrap_or_else(|| connection.endpoint.clone()),
        connect_timeout: connection.connect_timeout(),
        retry: RetryPolicy {
            max_attempts: connection.max_attempts,
            delay: connection.retry_delay(),
        },
        storage_key: config.storage.key.clone(),
    }
}

/// Directory the conversation snapshot lives in.
pub fn storage_dir(config: &ChatlineConfig) -> Result<PathBuf, ConfigError> {
    match &config.storage.directory {
        Some(dir) => Ok(dir.clone()),
        None => chatline_config::paths::data_dir(),
    }
}
