//! Full configuration validation.
//!
//! Validates numeric ranges and the endpoint URL scheme.

use crate::schema::ChatlineConfig;
use chatline_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ChatlineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    let endpoint = config.connection.endpoint.as_str();
    if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
        errors.push(format!(
            "connection.endpoint = {endpoint:?} must start with ws:// or wss://"
        ));
    }
    validate_range(
        &mut errors,
        "connection.max_attempts",
        u64::from(config.connection.max_attempts),
        1,
        10,
    );
    validate_range(
        &mut errors,
        "connection.retry_delay_ms",
        config.connection.retry_delay_ms,
        100,
        60_000,
    );
    validate_range(
        &mut errors,
        "connection.connect_timeout_secs",
        config.connection.connect_timeout_secs,
        1,
        120,
    );

    let key = config.storage.key.as_str();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(format!(
            "storage.key = {key:?} must be non-empty and use only [A-Za-z0-9_-]"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
