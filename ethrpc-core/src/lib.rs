//! # ethrpc core
//!
//! `ethrpc-core` composes independent interceptors between an Ethereum
//! client and its JSON-RPC transport. Interceptors can inspect, rewrite or
//! reject every outbound call and every inbound response without the
//! transport or the application knowing about any of them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ethrpc_core::{ChainBuilder, HttpTransport, InterceptorRegistry, NetworkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = InterceptorRegistry::new();
//!     let transport = Arc::new(HttpTransport::new("http://127.0.0.1:8545")?);
//!     let config = NetworkConfig::new().with("fork", "mainnet");
//!
//!     let chain = ChainBuilder::new(&registry).build(transport, &config).await?;
//!     let block: String = chain.request("eth_blockNumber", vec![]).await?;
//!     println!("Latest block: {}", block);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`interceptor`]: the contract every interceptor implements
//! - [`registry`]: the process-wide set of known interceptor variants
//! - [`chain`]: the chain builder and the invocation pipeline
//! - [`transport`]: the raw transport abstraction and an HTTP implementation
//! - [`config`]: the network configuration probes read from
//! - [`messages`]: JSON-RPC 2.0 message types
//! - [`error`]: error types for all failure modes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod chain;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod messages;
pub mod registry;
pub mod transport;

// Re-export commonly used types for convenience
pub use chain::{Chain, ChainBuilder, ChainStats};
pub use config::NetworkConfig;
pub use error::{PipelineError, PipelineResult, TransportError};
pub use interceptor::{Interceptor, InterceptorDescriptor, InterceptorStats, Layer, Next};
pub use messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use registry::InterceptorRegistry;
pub use transport::{HttpTransport, HttpTransportConfig, Transport, TransportInfo};

/// Current version of the ethrpc-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
