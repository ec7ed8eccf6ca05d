// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde attributes cannot express: non-empty paths,
//! positive timeouts, URL schemes, and value ranges.

use crate::diagnostic::ConfigError;
use crate::model::{PersistenceMode, RecallConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// every collected validation error (does not fail fast).
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level `{}` must be one of: {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    // The database path only matters when records are actually persisted.
    if config.memory.persistence == PersistenceMode::Real
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.storage.op_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "storage.op_timeout_ms must be greater than 0",
        ));
    }

    if config.embedding.model.trim().is_empty() {
        errors.push(ConfigError::validation("embedding.model must not be empty"));
    }

    if config.embedding.dimensions == 0 {
        errors.push(ConfigError::validation(
            "embedding.dimensions must be greater than 0",
        ));
    }

    if config.embedding.timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "embedding.timeout_ms must be greater than 0",
        ));
    }

    let url = config.ollama.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "ollama.base_url `{url}` must start with http:// or https://"
        )));
    }

    if config.ollama.model.trim().is_empty() {
        errors.push(ConfigError::validation("ollama.model must not be empty"));
    }

    if config.ollama.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "ollama.request_timeout_secs must be greater than 0",
        ));
    }

    let temperature = config.ollama.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        errors.push(ConfigError::validation(format!(
            "ollama.temperature must be between 0.0 and 2.0, got {temperature}"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
