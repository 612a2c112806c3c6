//! Backend connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the answer service lives and how hard to try reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket URL of the `/chat` endpoint.
    pub endpoint: String,
    /// Reconnect attempts after a lost connection before giving up (1-10).
    pub max_attempts: u32,
    /// Fixed delay between reconnect attempts in milliseconds (100-60000).
    pub retry_delay_ms: u64,
    /// Handshake timeout in seconds (1-120).
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/chat".into(),
            max_attempts: 3,
            retry_delay_ms: 2000,
            connect_timeout_secs: 15,
        }
    }
}

impl ConnectionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
