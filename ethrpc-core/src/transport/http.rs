//! HTTP JSON-RPC transport.
//!
//! Posts one JSON-RPC 2.0 envelope per call with a monotonically increasing
//! numeric id. Node-side errors are returned as responses; non-2xx statuses
//! and undecodable bodies are transport failures.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{HttpTransportConfig, Transport, TransportInfo};
use crate::error::{PipelineError, PipelineResult, TransportError};
use crate::messages::{JsonRpcRequest, JsonRpcResponse};

const TRANSPORT_TYPE: &str = "http";

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    /// HTTP client for making requests
    client: Client,
    /// Transport configuration
    config: HttpTransportConfig,
    /// Next request id
    next_id: AtomicI64,
    requests_sent: AtomicU64,
    responses_received: AtomicU64,
    errors: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for the given endpoint with default settings.
    pub fn new(url: impl AsRef<str>) -> PipelineResult<Self> {
        Self::with_config(HttpTransportConfig::new(url)?)
    }

    /// Create a transport from an explicit configuration.
    pub fn with_config(config: HttpTransportConfig) -> PipelineResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            next_id: AtomicI64::new(1),
            requests_sent: AtomicU64::new(0),
            responses_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        })
    }

    /// The configuration this transport was built from.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    async fn post(&self, request: &JsonRpcRequest) -> PipelineResult<JsonRpcResponse> {
        let json_body = serde_json::to_string(request).map_err(|e| {
            PipelineError::Transport(TransportError::SerializationError {
                transport_type: TRANSPORT_TYPE.to_string(),
                reason: format!("Failed to serialize request: {}", e),
            })
        })?;

        debug!("Sending {} (id {}) to {}", request.method, request.id, self.config.url);

        let mut request_builder = self
            .client
            .post(self.config.url.clone())
            .header("Content-Type", "application/json")
            .body(json_body);

        for (name, value) in &self.config.headers {
            request_builder = request_builder.header(name.as_str(), value.as_str());
        }

        let response = request_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Transport(TransportError::HttpError {
                status_code: status.as_u16(),
                reason: body,
            }));
        }

        let response_text = response.text().await.map_err(|e| {
            PipelineError::Transport(TransportError::SendFailed {
                transport_type: TRANSPORT_TYPE.to_string(),
                reason: format!("Failed to read response body: {}", e),
            })
        })?;

        debug!("Received response for id {}: {}", request.id, response_text);

        serde_json::from_str(&response_text).map_err(|e| {
            PipelineError::Transport(TransportError::SerializationError {
                transport_type: TRANSPORT_TYPE.to_string(),
                reason: format!("Invalid JSON-RPC response: {}", e),
            })
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: &str, params: Vec<Value>) -> PipelineResult<JsonRpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        match self.post(&request).await {
            Ok(response) => {
                self.responses_received.fetch_add(1, Ordering::Relaxed);
                Ok(response)
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn info(&self) -> TransportInfo {
        let mut info = TransportInfo::new(TRANSPORT_TYPE).with_endpoint(self.config.url.as_str());
        info.requests_sent = self.requests_sent.load(Ordering::Relaxed);
        info.responses_received = self.responses_received.load(Ordering::Relaxed);
        info.errors = self.errors.load(Ordering::Relaxed);
        info
    }
}
