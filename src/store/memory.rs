//! In-process store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::{KvError, KvResult};
use crate::store::KvStore;

/// A `DashMap` backed store. Cloning is not supported; share it via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>> {
        Ok(keys
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()> {
        if keys.len() != values.len() {
            return Err(KvError::InvalidInput(format!(
                "mset got {} keys and {} values",
                keys.len(),
                values.len()
            )));
        }
        for (key, value) in keys.iter().zip(values) {
            self.entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn mdel(&self, keys: &[String]) -> KvResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>> {
        let mut matches: Vec<(String, Value)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches.into_iter().map(|(_, value)| value).collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
