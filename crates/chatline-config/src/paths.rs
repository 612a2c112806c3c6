use std::path::PathBuf;

use chatline_common::ConfigError;

const APP_NAME: &str = "chatline";

/// Returns the platform-specific configuration directory for chatline.
///
/// - macOS: `~/Library/Application Support/chatline`
/// - Linux: `$XDG_CONFIG_HOME/chatline` (defaults to `~/.config/chatline`)
/// - Windows: `%APPDATA%\chatline`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

/// Returns the platform-specific data directory for chatline.
///
/// - macOS: `~/Library/Application Support/chatline`
/// - Linux: `$XDG_DATA_HOME/chatline` (defaults to `~/.local/share/chatline`)
/// - Windows: `%APPDATA%\chatline`
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| ConfigError::ParseError("could not determine data directory".into()))
}

/// Returns the path to the main configuration file.
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}
