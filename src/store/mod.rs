//! Key-value store backends.
//!
//! # Responsibilities
//! - Define the primitive operations every backend offers
//! - Provide an in-memory backend for tests and local runs
//! - Provide a PostgREST (Supabase) table backend for production
//!
//! # Design Decisions
//! - Backends never retry; that is the facade's job
//! - Values are JSON; keys are plain strings
//! - Backends report typed transport errors where the client can tell

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::KvResult;

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Primitive operations of a remote key-value store.
///
/// Multi-key reads return the values that exist, in request order. Prefix
/// scans return values ordered by key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a single value.
    async fn get(&self, key: &str) -> KvResult<Option<Value>>;

    /// Insert or replace a single value.
    async fn set(&self, key: &str, value: &Value) -> KvResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn del(&self, key: &str) -> KvResult<()>;

    /// Fetch several values.
    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>>;

    /// Insert or replace several values, paired with `keys` by index.
    async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()>;

    /// Remove several keys.
    async fn mdel(&self, keys: &[String]) -> KvResult<()>;

    /// Fetch every value whose key starts with `prefix`.
    async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>>;

    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> KvResult<()> {
        Ok(())
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        (**self).set(key, value).await
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        (**self).del(key).await
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>> {
        (**self).mget(keys).await
    }

    async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()> {
        (**self).mset(keys, values).await
    }

    async fn mdel(&self, keys: &[String]) -> KvResult<()> {
        (**self).mdel(keys).await
    }

    async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>> {
        (**self).get_by_prefix(prefix).await
    }

    async fn ping(&self) -> KvResult<()> {
        (**self).ping().await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
