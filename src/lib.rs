//! Retrying key-value accessor.
//!
//! A resilience layer in front of a remote key/value store. Every facade call
//! is one fresh round trip to the store, wrapped in a linear-backoff retry
//! loop. Reads degrade to "missing" once retries are exhausted; writes never
//! fail silently.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller
//!       │  get / set / del / mget / mset / mdel / get_by_prefix
//!       ▼
//!  ┌──────────────┐     ┌────────────────────────────────────┐
//!  │ kv::Retrying │────▶│ resilience                         │
//!  │     Kv       │     │  retries.rs  (executor, outcome)   │
//!  └──────┬───────┘     │  classify.rs (retryable | fatal)   │
//!         │             │  backoff.rs  (base * (n + 1))      │
//!         ▼             └────────────────────────────────────┘
//!  ┌──────────────┐
//!  │ store        │  MemoryStore (DashMap) | RestStore (PostgREST)
//!  └──────────────┘
//!
//!  Cross-cutting: config (TOML), observability (tracing, metrics),
//!  lifecycle (startup readiness, shutdown/cancellation)
//! ```

pub mod config;
pub mod error;
pub mod kv;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod store;

pub use config::KvConfig;
pub use error::{KvError, KvResult};
pub use kv::RetryingKv;
pub use lifecycle::Shutdown;
pub use resilience::{RetryExecutor, RetryPolicy};
pub use store::{KvStore, MemoryStore, RestStore};
