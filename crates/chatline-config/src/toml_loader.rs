//! TOML config file loading and creation.

use std::path::Path;

use crate::paths;
use crate::schema::ChatlineConfig;
use crate::validation;
use chatline_common::ConfigError;
use tracing::{info, warn};

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. A config that fails validation
/// is reported and replaced by the default config.
pub fn load_from_path(path: &Path) -> Result<ChatlineConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: ChatlineConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(ChatlineConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<ChatlineConfig, ConfigError> {
    let path = paths::config_file()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(ChatlineConfig::default());
    }

    load_from_path(&path)
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

fn default_config_toml() -> &'static str {
    r##"# chatline configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[connection]
# endpoint = "ws://localhost:8080/chat"
# max_attempts = 3            # 1-10
# retry_delay_ms = 2000       # 100-60000
# connect_timeout_secs = 15   # 1-120

[storage]
# directory = "/path/to/dir"  # defaults to the platform data directory
# key = "chatHistory"

[logging]
# level = "info"              # debug, info, warn, error
"##
}
