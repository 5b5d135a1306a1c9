//! HTTP transport configuration.
//!
//! ```rust
//! use ethrpc_core::transport::HttpTransportConfig;
//! use std::time::Duration;
//!
//! let config: HttpTransportConfig = toml::from_str(r#"
//! url = "https://rpc.example.org"
//! timeout = "45s"
//!
//! [headers]
//! "X-Api-Key" = "secret"
//! "#).unwrap();
//!
//! assert_eq!(config.timeout, Duration::from_secs(45));
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, PipelineResult};

/// Configuration for [`HttpTransport`](super::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// JSON-RPC endpoint
    pub url: Url,

    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl HttpTransportConfig {
    /// Create a configuration for the given endpoint with default settings.
    pub fn new(url: impl AsRef<str>) -> PipelineResult<Self> {
        let url = url
            .as_ref()
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                parameter: "url".to_string(),
                value: url.as_ref().to_string(),
                reason: format!("Invalid URL: {}", e),
            })?;

        Ok(Self {
            url,
            timeout: default_timeout(),
            headers: HashMap::new(),
        })
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
