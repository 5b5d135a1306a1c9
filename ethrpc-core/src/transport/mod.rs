//! Transport abstraction underneath the interceptor chain.
//!
//! The chain treats the transport as an opaque `send(method, params)`
//! function. Structured node errors come back as `Ok` responses carrying an
//! `error` member; only failures to obtain a response at all are `Err`.
//! Timeouts and cancellation are entirely the transport's concern.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ethrpc_core::transport::{HttpTransport, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new("http://127.0.0.1:8545")?;
//!     let response = transport.send("eth_blockNumber", vec![]).await?;
//!     println!("Received: {:?}", response.result);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod http;

pub use config::HttpTransportConfig;
pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PipelineResult;
use crate::messages::JsonRpcResponse;

/// Raw JSON-RPC transport.
///
/// Implementations must be usable through a shared reference; a chain owns
/// its transport for the session's lifetime and hands interceptors only a
/// reference to it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one JSON-RPC call and wait for its response.
    async fn send(&self, method: &str, params: Vec<Value>) -> PipelineResult<JsonRpcResponse>;

    /// Get transport-specific metadata and statistics.
    fn info(&self) -> TransportInfo;
}

/// Transport information and statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransportInfo {
    /// Type of transport (http, mock, ...)
    pub transport_type: String,

    /// Endpoint the transport talks to, if any
    pub endpoint: Option<String>,

    /// Number of requests sent
    pub requests_sent: u64,

    /// Number of responses received
    pub responses_received: u64,

    /// Number of transport failures encountered
    pub errors: u64,
}

impl TransportInfo {
    /// Create a new transport info structure.
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: transport_type.into(),
            endpoint: None,
            requests_sent: 0,
            responses_received: 0,
            errors: 0,
        }
    }

    /// Attach the endpoint description.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}
