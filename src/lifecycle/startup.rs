//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the configured store and wrap it in the retrying facade
//! - Probe the store once and report the outcome as [`Readiness`]
//!
//! # Design Decisions
//! - Fail fast on configuration errors and fatal store errors (bad key,
//!   missing table)
//! - A store that stays unreachable through every retry is reported, not
//!   fatal; reads will degrade and writes will fail until it recovers

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::schema::{KvConfig, StoreConfig, StoreKind};
use crate::config::validation::{validate_config, ValidationError};
use crate::error::{KvError, KvResult};
use crate::kv::facade::surface;
use crate::kv::RetryingKv;
use crate::lifecycle::shutdown::Shutdown;
use crate::resilience::{RetryError, RetryPolicy};
use crate::store::{KvStore, MemoryStore, RestStore};

const OP_PING: &str = "kv.ping";

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Config(Vec<ValidationError>),

    #[error("store setup failed: {0}")]
    Store(#[from] KvError),
}

/// Outcome of the startup probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// Backend that was probed.
    pub backend: &'static str,
    /// Whether the probe succeeded.
    pub reachable: bool,
    /// Attempts the probe used.
    pub attempts: u32,
    /// Wall time spent probing, backoff included.
    pub checked_in: Duration,
}

/// Everything a caller needs once startup succeeded.
pub struct Started {
    pub kv: RetryingKv<Arc<dyn KvStore>>,
    pub readiness: Readiness,
}

/// Build the store named by `config`.
pub fn build_store(config: &StoreConfig) -> KvResult<Arc<dyn KvStore>> {
    match config.kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Rest => Ok(Arc::new(RestStore::from_config(config)?)),
    }
}

/// Probe the store behind `kv` through its retry policy.
///
/// Exhausted retries yield `reachable: false`; fatal errors are returned.
pub async fn check_readiness<S: KvStore>(kv: &RetryingKv<S>) -> KvResult<Readiness> {
    let backend = kv.store().backend_name();
    let started = Instant::now();

    let mut attempts: u32 = 0;
    let result = kv
        .executor()
        .run(OP_PING, || {
            attempts += 1;
            kv.store().ping()
        })
        .await;

    let reachable = match result {
        Ok(()) => true,
        Err(RetryError::Exhausted { error, .. }) => {
            tracing::warn!(backend, attempts, error = %error, "Store unreachable at startup");
            false
        }
        Err(err) => return Err(surface(err)),
    };

    Ok(Readiness {
        backend,
        reachable,
        attempts,
        checked_in: started.elapsed(),
    })
}

/// Validate `config`, build the facade, and probe the store.
pub async fn start(config: &KvConfig, shutdown: &Shutdown) -> Result<Started, StartupError> {
    validate_config(config).map_err(StartupError::Config)?;

    let store = build_store(&config.store)?;
    let policy = RetryPolicy::from(&config.retries);
    let kv = RetryingKv::new(store, policy).with_shutdown(shutdown);

    let readiness = check_readiness(&kv).await?;
    tracing::info!(
        backend = readiness.backend,
        reachable = readiness.reachable,
        max_retries = policy.max_retries,
        base_delay_ms = policy.base_delay.as_millis() as u64,
        "Key-value store initialized"
    );

    Ok(Started { kv, readiness })
}
