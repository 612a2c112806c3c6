//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Comma-separated filter directives for the chatline crates at this
    /// level, one `target=level` pair per crate.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => {
                "chatline=debug,chatline_session=debug,chatline_config=debug,chatline_common=debug"
            }
            LogLevel::Info => {
                "chatline=info,chatline_session=info,chatline_config=info,chatline_common=info"
            }
            LogLevel::Warn => {
                "chatline=warn,chatline_session=warn,chatline_config=warn,chatline_common=warn"
            }
            LogLevel::Error => {
                "chatline=error,chatline_session=error,chatline_config=error,chatline_common=error"
            }
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
