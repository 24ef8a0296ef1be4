//! `kv-cli`: run one key-value operation through the retrying facade.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use resilient_kv::config::{load_config, KvConfig};
use resilient_kv::lifecycle::{signals, start, Shutdown};
use resilient_kv::observability::logging;

#[derive(Parser)]
#[command(name = "kv-cli")]
#[command(about = "Retrying client for the key-value store", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "KV_CONFIG")]
    config: Option<PathBuf>,

    /// Override `retries.max_retries`.
    #[arg(long, env = "KV_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Override `retries.base_delay_ms`.
    #[arg(long, env = "KV_BASE_DELAY_MS")]
    base_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one value
    Get { key: String },
    /// Store one value (JSON, or a bare string)
    Set { key: String, value: String },
    /// Remove one key
    Del { key: String },
    /// Fetch several values
    Mget {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Store several KEY=JSON pairs
    Mset {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Remove several keys
    Mdel {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Fetch every value under a key prefix
    Prefix { prefix: String },
    /// Probe the store and report readiness
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => KvConfig::default(),
    };
    if let Some(max_retries) = cli.max_retries {
        config.retries.max_retries = max_retries;
    }
    if let Some(base_delay_ms) = cli.base_delay_ms {
        config.retries.base_delay_ms = base_delay_ms;
    }

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("Warning: logging already initialized: {e}");
    }

    let shutdown = Shutdown::new();
    signals::spawn_ctrl_c(shutdown.clone());

    let started = start(&config, &shutdown).await?;
    let kv = started.kv;

    let output = match cli.command {
        Commands::Get { key } => kv.get(&key).await?.unwrap_or(Value::Null),
        Commands::Set { key, value } => {
            kv.set(&key, &parse_value(&value)).await?;
            json!({ "ok": true })
        }
        Commands::Del { key } => {
            kv.del(&key).await?;
            json!({ "ok": true })
        }
        Commands::Mget { keys } => Value::Array(kv.mget(&keys).await?),
        Commands::Mset { pairs } => {
            let (keys, values) = parse_pairs(&pairs)?;
            kv.mset(&keys, &values).await?;
            json!({ "ok": true })
        }
        Commands::Mdel { keys } => {
            kv.mdel(&keys).await?;
            json!({ "ok": true })
        }
        Commands::Prefix { prefix } => Value::Array(kv.get_by_prefix(&prefix).await?),
        Commands::Check => {
            let readiness = started.readiness;
            json!({
                "backend": readiness.backend,
                "reachable": readiness.reachable,
                "attempts": readiness.attempts,
                "checked_in_ms": readiness.checked_in.as_millis() as u64,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_pairs(pairs: &[String]) -> Result<(Vec<String>, Vec<Value>), String> {
    let mut keys = Vec::with_capacity(pairs.len());
    let mut values = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{pair}'"))?;
        keys.push(key.to_string());
        values.push(parse_value(value));
    }
    Ok((keys, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_prefers_json() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_value("hello"), json!("hello"));
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = vec!["a=1".to_string(), "b=text".to_string()];
        let (keys, values) = parse_pairs(&pairs).unwrap();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(values, vec![json!(1), json!("text")]);

        assert!(parse_pairs(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["kv-cli", "--max-retries", "5", "mget", "a", "b"]).unwrap();
        assert_eq!(cli.max_retries, Some(5));
        assert!(matches!(cli.command, Commands::Mget { ref keys } if keys.len() == 2));
    }
}
