use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Conversation persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the conversation snapshot. Defaults to the
    /// platform data directory.
    pub directory: Option<PathBuf>,
    /// Key the snapshot is stored under.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            key: "chatHistory".into(),
        }
    }
}
