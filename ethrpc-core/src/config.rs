//! Network configuration consumed by applicability probes.
//!
//! A [`NetworkConfig`] is an opaque key/value bag owned by the caller. The
//! pipeline only reads it, and only to decide which interceptors apply to a
//! session.
//!
//! # Examples
//!
//! ```rust
//! use ethrpc_core::config::NetworkConfig;
//!
//! let config = NetworkConfig::from_toml_str(r#"
//! id = "mainnet-fork"
//! host = "http://127.0.0.1:8545"
//!
//! [cmd_settings]
//! fork = "mainnet"
//! "#).unwrap();
//!
//! assert_eq!(config.fork_origin(), Some("mainnet"));
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, PipelineError, PipelineResult};

/// Key under which a network declares the origin it was forked from.
pub const FORK_KEY: &str = "fork";

/// Opaque mapping from configuration key to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkConfig {
    entries: HashMap<String, Value>,
}

impl NetworkConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether a top-level key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The origin this network was forked from, if any.
    ///
    /// Checks the top-level `fork` key first, then `cmd_settings.fork` as
    /// written by development-network definitions. A `null` value is treated
    /// as unset at either level.
    pub fn fork_origin(&self) -> Option<&str> {
        self.get(FORK_KEY)
            .filter(|v| !v.is_null())
            .or_else(|| self.get("cmd_settings").and_then(|s| s.get(FORK_KEY)))
            .and_then(|v| match v {
                Value::String(s) => Some(s.as_str()),
                Value::Null => None,
                _ => Some(""),
            })
    }

    /// Whether the network declares a fork origin.
    pub fn is_fork(&self) -> bool {
        self.fork_origin().is_some()
    }

    /// The RPC host, if configured.
    pub fn host(&self) -> Option<&str> {
        self.get("host").and_then(Value::as_str)
    }

    /// Build from an arbitrary JSON object.
    pub fn from_json_value(value: Value) -> PipelineResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                entries: map.into_iter().collect(),
            }),
            other => Err(ConfigError::InvalidValue {
                parameter: "network".to_string(),
                value: other.to_string(),
                reason: "network configuration must be a table".to_string(),
            }
            .into()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let value: Value = toml::from_str(content).map_err(|e| ConfigError::InvalidFormat {
            path: "<toml>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_value(value)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> PipelineResult<Self> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidFormat {
                path: "<yaml>".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_json_value(value)
    }

    /// Load from a file, picking the format from its extension
    /// (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !path.exists() {
            return Err(ConfigError::FileNotFound { path: display }.into());
        }

        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let parsed = match extension.as_str() {
            "toml" => Self::from_toml_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => serde_json::from_str::<Value>(&content)
                .map_err(PipelineError::from)
                .and_then(Self::from_json_value),
            other => {
                return Err(ConfigError::InvalidFormat {
                    path: display,
                    reason: format!("unsupported configuration extension '{other}'"),
                }
                .into())
            }
        };

        parsed.map_err(|e| match e {
            PipelineError::Config(ConfigError::InvalidFormat { reason, .. }) => {
                ConfigError::InvalidFormat {
                    path: display,
                    reason,
                }
                .into()
            }
            other => other,
        })
    }
}
