//! The facade callers use instead of the bare store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{KvError, KvResult};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::{RetryError, RetryExecutor, RetryPolicy};
use crate::store::KvStore;

pub const OP_GET: &str = "kv.get";
pub const OP_SET: &str = "kv.set";
pub const OP_DEL: &str = "kv.del";
pub const OP_MGET: &str = "kv.mget";
pub const OP_MSET: &str = "kv.mset";
pub const OP_MDEL: &str = "kv.mdel";
pub const OP_GET_BY_PREFIX: &str = "kv.get_by_prefix";

/// A [`KvStore`] with every call wrapped in a [`RetryExecutor`].
///
/// Holds no state beyond the store handle and the policy, so one instance
/// can serve any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct RetryingKv<S> {
    store: S,
    executor: RetryExecutor,
}

impl<S: KvStore> RetryingKv<S> {
    pub fn new(store: S, policy: RetryPolicy) -> Self {
        Self {
            store,
            executor: RetryExecutor::new(policy),
        }
    }

    /// Abandon pending retries once `shutdown` is triggered.
    pub fn with_shutdown(mut self, shutdown: &Shutdown) -> Self {
        self.executor = self.executor.with_shutdown(shutdown);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    /// Fetch a value. Exhausted retries read as a miss.
    pub async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        let result = self.executor.run(OP_GET, || self.store.get(key)).await;
        degrade_read(result, None)
    }

    /// Fetch and decode a value. A value that does not decode is an error.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> KvResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a value. Exhausted retries surface the last error.
    pub async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        let result = self.executor.run(OP_SET, || self.store.set(key, value)).await;
        result.map_err(surface)
    }

    /// Serialize and store a value.
    pub async fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KvResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value).await
    }

    /// Remove a key. Exhausted retries surface the last error.
    pub async fn del(&self, key: &str) -> KvResult<()> {
        let result = self.executor.run(OP_DEL, || self.store.del(key)).await;
        result.map_err(surface)
    }

    /// Fetch several values. Exhausted retries read as no values.
    pub async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>> {
        let result = self.executor.run(OP_MGET, || self.store.mget(keys)).await;
        degrade_read(result, Vec::new())
    }

    /// Store several values, paired with `keys` by index.
    ///
    /// Mismatched lengths fail immediately without touching the store.
    pub async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()> {
        if keys.len() != values.len() {
            tracing::error!(
                operation = OP_MSET,
                keys = keys.len(),
                values = values.len(),
                "Rejected mset with mismatched lengths"
            );
            return Err(KvError::InvalidInput(format!(
                "mset got {} keys and {} values",
                keys.len(),
                values.len()
            )));
        }
        let result = self
            .executor
            .run(OP_MSET, || self.store.mset(keys, values))
            .await;
        result.map_err(surface)
    }

    /// Remove several keys. Exhausted retries surface the last error.
    pub async fn mdel(&self, keys: &[String]) -> KvResult<()> {
        let result = self.executor.run(OP_MDEL, || self.store.mdel(keys)).await;
        result.map_err(surface)
    }

    /// Fetch every value under `prefix`. Exhausted retries read as no values.
    pub async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>> {
        let result = self
            .executor
            .run(OP_GET_BY_PREFIX, || self.store.get_by_prefix(prefix))
            .await;
        degrade_read(result, Vec::new())
    }
}

/// Exhaustion becomes `empty`; anything else surfaces.
fn degrade_read<T>(result: Result<T, RetryError<KvError>>, empty: T) -> KvResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(RetryError::Exhausted {
            operation,
            attempts,
            error,
        }) => {
            metrics::record_degraded_read(&operation);
            tracing::warn!(
                operation = %operation,
                attempts,
                error = %error,
                "Read degraded to empty result"
            );
            Ok(empty)
        }
        Err(err) => Err(surface(err)),
    }
}

/// The error a caller sees: the store's own error, or a cancellation.
pub(crate) fn surface(err: RetryError<KvError>) -> KvError {
    match err {
        RetryError::Fatal { error, .. } | RetryError::Exhausted { error, .. } => error,
        RetryError::Cancelled {
            operation,
            attempts,
        } => KvError::Cancelled {
            operation,
            attempts,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails every call with an error built from `message`.
    struct BrokenStore {
        message: &'static str,
        calls: AtomicU32,
    }

    impl BrokenStore {
        fn new(message: &'static str) -> Self {
            Self {
                message,
                calls: AtomicU32::new(0),
            }
        }

        fn fail<T>(&self) -> KvResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(KvError::Other(self.message.to_string()))
        }
    }

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn get(&self, _key: &str) -> KvResult<Option<Value>> {
            self.fail()
        }
        async fn set(&self, _key: &str, _value: &Value) -> KvResult<()> {
            self.fail()
        }
        async fn del(&self, _key: &str) -> KvResult<()> {
            self.fail()
        }
        async fn mget(&self, _keys: &[String]) -> KvResult<Vec<Value>> {
            self.fail()
        }
        async fn mset(&self, _keys: &[String], _values: &[Value]) -> KvResult<()> {
            self.fail()
        }
        async fn mdel(&self, _keys: &[String]) -> KvResult<()> {
            self.fail()
        }
        async fn get_by_prefix(&self, _prefix: &str) -> KvResult<Vec<Value>> {
            self.fail()
        }
        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_degrade_on_exhaustion() {
        let kv = RetryingKv::new(BrokenStore::new("ECONNRESET"), policy());

        assert_eq!(kv.get("user:42").await.unwrap(), None);
        assert!(kv.mget(&["a".to_string()]).await.unwrap().is_empty());
        assert!(kv.get_by_prefix("user:").await.unwrap().is_empty());
        assert_eq!(kv.store().calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_surface_exhaustion() {
        let kv = RetryingKv::new(BrokenStore::new("network unreachable"), policy());

        let err = kv.set("user:42", &json!({"plan": "pro"})).await.unwrap_err();
        assert_eq!(err.to_string(), "network unreachable");
        assert!(kv.del("user:42").await.is_err());
        assert!(kv.mdel(&["a".to_string()]).await.is_err());

        let keys = vec!["a".to_string(), "b".to_string()];
        let err = kv.mset(&keys, &[json!(1), json!(2)]).await.unwrap_err();
        assert_eq!(err.to_string(), "network unreachable");
        assert_eq!(kv.store().calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_read_is_not_degraded() {
        let kv = RetryingKv::new(BrokenStore::new("permission denied"), policy());

        let err = kv.get("user:42").await.unwrap_err();
        assert!(matches!(err, KvError::Other(ref m) if m == "permission denied"));
        assert_eq!(kv.store().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mset_length_mismatch_never_calls_store() {
        let kv = RetryingKv::new(BrokenStore::new("connection reset"), policy());

        let keys = vec!["a".to_string(), "b".to_string()];
        let err = kv.mset(&keys, &[json!(1)]).await.unwrap_err();
        assert!(matches!(err, KvError::InvalidInput(_)));
        assert_eq!(kv.store().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Campaign {
            id: u32,
            status: String,
        }

        let kv = RetryingKv::new(MemoryStore::new(), policy());
        let campaign = Campaign {
            id: 7,
            status: "pending".into(),
        };
        kv.set_as("campaign:7", &campaign).await.unwrap();

        let loaded: Option<Campaign> = kv.get_as("campaign:7").await.unwrap();
        assert_eq!(loaded, Some(campaign));

        kv.set("campaign:8", &json!("not a campaign")).await.unwrap();
        let err = kv.get_as::<Campaign>("campaign:8").await.unwrap_err();
        assert!(matches!(err, KvError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_write_reports_cancellation() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let kv = RetryingKv::new(BrokenStore::new("timeout"), policy()).with_shutdown(&shutdown);

        let err = kv.set("k", &json!(1)).await.unwrap_err();
        assert!(matches!(err, KvError::Cancelled { attempts: 0, .. }));
        assert_eq!(kv.store().calls.load(Ordering::SeqCst), 0);
    }
}
