//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KvConfig {
    /// Retry policy applied to every store call.
    pub retries: RetryConfig,

    /// Which store to talk to and how.
    pub store: StoreConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first (>= 1).
    pub max_retries: u32,

    /// Unit of the linear backoff in milliseconds (> 0).
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Store backend selector.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-process map; nothing survives the process.
    #[default]
    Memory,
    /// PostgREST / Supabase table.
    Rest,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use.
    pub kind: StoreKind,

    /// Project base URL (e.g., "https://project.supabase.co").
    pub url: String,

    /// Table holding `(key, value)` rows.
    pub table: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Honour HTTP(S)_PROXY environment variables.
    pub proxy: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            url: "http://localhost:54321".to_string(),
            table: "kv_store".to_string(),
            api_key_env: "KV_API_KEY".to_string(),
            timeout_secs: 10,
            proxy: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
