//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, delays and timeouts > 0)
//! - Check the REST endpoint is a usable http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: &KvConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{KvConfig, StoreKind};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &KvConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.retries.max_retries < 1 {
        errors.push(ValidationError::new("retries.max_retries", "must be at least 1"));
    }
    if config.retries.base_delay_ms == 0 {
        errors.push(ValidationError::new("retries.base_delay_ms", "must be greater than 0"));
    }

    if config.store.kind == StoreKind::Rest {
        match url::Url::parse(&config.store.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "store.url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("store.url", e.to_string())),
        }
        if config.store.table.trim().is_empty() {
            errors.push(ValidationError::new("store.table", "must not be empty"));
        }
        if config.store.api_key_env.trim().is_empty() {
            errors.push(ValidationError::new("store.api_key_env", "must not be empty"));
        }
        if config.store.timeout_secs == 0 {
            errors.push(ValidationError::new("store.timeout_secs", "must be greater than 0"));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
