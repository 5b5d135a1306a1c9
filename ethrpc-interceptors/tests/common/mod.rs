//! Common test utilities shared across integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ethrpc_core::{
    JsonRpcError, JsonRpcResponse, PipelineResult, Transport, TransportError, TransportInfo,
};
use serde_json::{json, Value};

/// What the scripted transport answers for a method.
#[derive(Clone)]
pub enum Reply {
    /// A successful result
    Result(Value),
    /// A node error payload
    NodeError(String),
    /// A transport failure
    Fail(String),
}

/// In-memory transport answering from a script and recording every call.
pub struct MockTransport {
    replies: HashMap<String, Reply>,
    fallback: Reply,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockTransport {
    /// Answer every method with `fallback` unless scripted otherwise.
    pub fn new(fallback: Reply) -> Self {
        Self {
            replies: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A node whose latest block passes strict validation.
    pub fn healthy() -> Self {
        Self::new(Reply::Result(json!("0x1"))).on("eth_getBlockByNumber", Reply::Result(plain_block()))
    }

    /// A proof-of-authority node.
    pub fn poa() -> Self {
        Self::new(Reply::Result(json!("0x1"))).on("eth_getBlockByNumber", Reply::Result(poa_block()))
    }

    /// Script the reply for one method.
    pub fn on(mut self, method: &str, reply: Reply) -> Self {
        self.replies.insert(method.to_string(), reply);
        self
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received for `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, method: &str, params: Vec<Value>) -> PipelineResult<JsonRpcResponse> {
        self.calls.lock().unwrap().push((method.to_string(), params));

        match self.replies.get(method).unwrap_or(&self.fallback) {
            Reply::Result(value) => Ok(JsonRpcResponse::success(1, value.clone())),
            Reply::NodeError(message) => Ok(JsonRpcResponse::error(
                1,
                JsonRpcError::server_error(message.clone()),
            )),
            Reply::Fail(reason) => Err(TransportError::ConnectionFailed {
                transport_type: "mock".to_string(),
                reason: reason.clone(),
            }
            .into()),
        }
    }

    fn info(&self) -> TransportInfo {
        let mut info = TransportInfo::new("mock");
        info.requests_sent = self.calls.lock().unwrap().len() as u64;
        info
    }
}

/// A block with a 32-byte-or-shorter `extraData`.
pub fn plain_block() -> Value {
    json!({
        "number": "0x1b4",
        "hash": "0xdc0818cf78f21a8e70579cb46a43643f78291264dda342ae31049421c82d21ae",
        "extraData": "0xd883010a0f846765746888676f312e31372e33856c696e7578",
    })
}

/// A block carrying a 97-byte proof-of-authority seal in `extraData`.
pub fn poa_block() -> Value {
    json!({
        "number": "0x1b4",
        "hash": "0x8b2a4c1e3f0d5b6a7c8e9f0a1b2c3d4e5f60718293a4b5c6d7e8f9012a3b4c5d",
        "extraData": format!("0x{}", "5e".repeat(97)),
    })
}
