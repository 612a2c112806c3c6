//! Configuration schema types for chatline.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod connection;
mod storage;
mod system;

pub use connection::*;
pub use storage::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for chatline.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChatlineConfig {
    pub connection: ConnectionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}
