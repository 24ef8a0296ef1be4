//! PostgREST table backend.
//!
//! Talks to a Supabase-style REST endpoint exposing a table of
//! `(key text primary key, value jsonb)` rows.
//!
//! # Responsibilities
//! - Translate each primitive into one HTTP request
//! - Map transport failures to typed [`KvError`] variants
//! - Surface non-2xx answers as [`KvError::Remote`] with the server message
//!
//! # Design Decisions
//! - One request per call; no client-side caching or batching beyond what
//!   PostgREST filters offer (`in.(...)`, `like.`)
//! - Writes are upserts (`Prefer: resolution=merge-duplicates`)
//! - The API key comes from an environment variable, never from the file

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::StoreConfig;
use crate::error::{KvError, KvResult};
use crate::store::KvStore;

const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=minimal";
const MINIMAL_PREFERENCE: &str = "return=minimal";

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    key: Option<String>,
    value: Value,
}

#[derive(Debug, Serialize)]
struct RowRef<'a> {
    key: &'a str,
    value: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RemoteMessage {
    message: String,
}

/// HTTP client for a PostgREST key-value table.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestStore {
    /// Build a client for `{base_url}/rest/v1/{table}`.
    pub fn new(
        base_url: &str,
        table: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> KvResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(client_error)?;
        Ok(Self::with_client(client, base_url, table, api_key))
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        table: &str,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.into(),
        }
    }

    /// Build a client from configuration, reading the key from the environment.
    pub fn from_config(config: &StoreConfig) -> KvResult<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            KvError::InvalidInput(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if !config.proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(client_error)?;
        Ok(Self::with_client(client, &config.url, &config.table, api_key))
    }

    /// Full table URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> KvResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RemoteMessage>(&body)
            .map(|m| m.message)
            .unwrap_or(body);
        Err(KvError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_rows(&self, request: RequestBuilder) -> KvResult<Vec<Row>> {
        let response = self.send(request).await?;
        let body = response.text().await.map_err(transport_error)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl KvStore for RestStore {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        let request = self
            .request(Method::GET)
            .query(&[("select", "value".to_string()), ("key", eq_filter(key))]);
        let rows = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next().map(|row| row.value))
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        let request = self
            .request(Method::POST)
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&RowRef { key, value });
        self.send(request).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        let request = self
            .request(Method::DELETE)
            .header("Prefer", MINIMAL_PREFERENCE)
            .query(&[("key", eq_filter(key))]);
        self.send(request).await?;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .request(Method::GET)
            .query(&[("select", "key,value".to_string()), ("key", in_filter(keys))]);
        let rows = self.fetch_rows(request).await?;

        let by_key: HashMap<String, Value> = rows
            .into_iter()
            .filter_map(|row| row.key.map(|key| (key, row.value)))
            .collect();
        Ok(keys.iter().filter_map(|key| by_key.get(key).cloned()).collect())
    }

    async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()> {
        if keys.len() != values.len() {
            return Err(KvError::InvalidInput(format!(
                "mset got {} keys and {} values",
                keys.len(),
                values.len()
            )));
        }
        if keys.is_empty() {
            return Ok(());
        }
        let rows: Vec<RowRef<'_>> = keys
            .iter()
            .zip(values)
            .map(|(key, value)| RowRef { key, value })
            .collect();
        let request = self
            .request(Method::POST)
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&rows);
        self.send(request).await?;
        Ok(())
    }

    async fn mdel(&self, keys: &[String]) -> KvResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Method::DELETE)
            .header("Prefer", MINIMAL_PREFERENCE)
            .query(&[("key", in_filter(keys))]);
        self.send(request).await?;
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>> {
        let request = self.request(Method::GET).query(&[
            ("select", "key,value".to_string()),
            ("key", like_prefix_filter(prefix)),
            ("order", "key.asc".to_string()),
        ]);
        let rows = self.fetch_rows(request).await?;
        // `*` in the prefix is a wildcard to PostgREST; recheck literally.
        Ok(rows
            .into_iter()
            .filter(|row| row.key.as_deref().is_some_and(|key| key.starts_with(prefix)))
            .map(|row| row.value)
            .collect())
    }

    async fn ping(&self) -> KvResult<()> {
        let request = self
            .request(Method::GET)
            .query(&[("select", "key"), ("limit", "1")]);
        self.send(request).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

fn client_error(err: reqwest::Error) -> KvError {
    KvError::InvalidInput(format!("cannot build HTTP client: {err}"))
}

fn transport_error(err: reqwest::Error) -> KvError {
    if err.is_timeout() {
        KvError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() || err.is_body() {
        KvError::Connection(err.to_string())
    } else {
        KvError::Other(err.to_string())
    }
}

fn eq_filter(key: &str) -> String {
    format!("eq.{key}")
}

fn in_filter(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|key| quote(key)).collect();
    format!("in.({})", quoted.join(","))
}

/// `like.` filter for keys starting with `prefix`.
///
/// Escapes SQL wildcards; a `*` still widens the match and is filtered out
/// after the fetch.
fn like_prefix_filter(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 8);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    format!("like.{pattern}*")
}

/// Double-quote a value for a PostgREST list filter.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
