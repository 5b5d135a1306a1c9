//! Chain construction and the invocation pipeline.
//!
//! [`ChainBuilder::build`] probes every registered descriptor against a live
//! transport and network configuration, keeps the ones that apply, and
//! orders them by ascending [`Layer`] (ties keep registration order). The
//! result is an immutable [`Chain`] owning the transport for the session.
//!
//! On every [`Chain::send`] the pre-call steps run in ascending layer order,
//! then the transport, then the post-call steps in exactly the reverse order:
//!
//! ```text
//! send ─► layer -5 ─► layer 2 ─► layer 7 ─► transport
//!                                              │
//! resp ◄─ layer -5 ◄─ layer 2 ◄─ layer 7 ◄────┘
//! ```
//!
//! A changed network configuration requires building a new chain.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::interceptor::{dispatch, InterceptorDescriptor, InterceptorStats, Layer, Link};
use crate::messages::JsonRpcResponse;
use crate::registry::InterceptorRegistry;
use crate::transport::{Transport, TransportInfo};

/// Builds [`Chain`]s from a registry.
#[derive(Debug, Clone, Copy)]
pub struct ChainBuilder<'r> {
    registry: &'r InterceptorRegistry,
}

impl<'r> ChainBuilder<'r> {
    /// Create a builder over `registry`.
    pub fn new(registry: &'r InterceptorRegistry) -> Self {
        Self { registry }
    }

    /// Probe every descriptor and compose the applicable ones into a chain.
    ///
    /// Probes run one at a time in registration order. If any probe fails
    /// the whole build fails and no chain is returned.
    pub async fn build(
        &self,
        transport: Arc<dyn Transport>,
        config: &NetworkConfig,
    ) -> PipelineResult<Chain> {
        let mut applicable: Vec<(Layer, &Arc<dyn InterceptorDescriptor>)> = Vec::new();

        for descriptor in self.registry.all() {
            let layer = descriptor
                .applicable_layer(&transport, config)
                .await
                .map_err(|e| {
                    warn!("Probe for {} failed: {}", descriptor.name(), e);
                    PipelineError::build(descriptor.name(), e)
                })?;

            match layer {
                Some(layer) => {
                    debug!("Interceptor {} applies at layer {}", descriptor.name(), layer);
                    applicable.push((layer, descriptor));
                }
                None => debug!("Interceptor {} does not apply", descriptor.name()),
            }
        }

        // Stable: equal layers keep registration order.
        applicable.sort_by_key(|(layer, _)| *layer);

        let links: Vec<Link> = applicable
            .into_iter()
            .map(|(layer, descriptor)| Link::new(layer, descriptor.instantiate(transport.clone())))
            .collect();

        let chain = Chain {
            links,
            transport,
            stats: RwLock::new(ChainStats::default()),
        };

        info!(
            "Built interceptor chain with {} interceptor(s): {:?}",
            chain.len(),
            chain.interceptor_names()
        );

        Ok(chain)
    }
}

/// Statistics for a chain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainStats {
    /// Total calls sent through the chain
    pub total_sends: u64,
    /// Calls that ended in an error
    pub total_failures: u64,
    /// Calls by method
    pub sends_by_method: HashMap<String, u64>,
}

/// An ordered, immutable composition of interceptors ending in a transport.
pub struct Chain {
    links: Vec<Link>,
    transport: Arc<dyn Transport>,
    stats: RwLock<ChainStats>,
}

impl Chain {
    /// Send one call through the chain.
    ///
    /// The transport is called exactly once unless an interceptor
    /// short-circuits by failing. Callers must serialise concurrent sends if
    /// any interceptor holds session state.
    pub async fn send(&self, method: &str, params: Vec<Value>) -> PipelineResult<JsonRpcResponse> {
        debug!("Sending {} through {} interceptor(s)", method, self.links.len());
        let result = dispatch(&self.links, self.transport.as_ref(), method, params).await;

        let mut stats = self.stats.write().await;
        stats.total_sends += 1;
        if result.is_err() {
            stats.total_failures += 1;
        }
        *stats.sends_by_method.entry(method.to_string()).or_insert(0) += 1;

        result
    }

    /// Send one call and deserialize its result.
    ///
    /// A node error payload becomes [`PipelineError::Rpc`].
    pub async fn request<T>(&self, method: &str, params: Vec<Value>) -> PipelineResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.send(method, params).await?.result_as()
    }

    /// Layers of the chain in pre-call order.
    pub fn layers(&self) -> Vec<Layer> {
        self.links.iter().map(|l| l.layer).collect()
    }

    /// Interceptor names in pre-call order.
    pub fn interceptor_names(&self) -> Vec<String> {
        self.links
            .iter()
            .map(|l| l.interceptor.name().to_string())
            .collect()
    }

    /// Whether an interceptor with this name is part of the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.links.iter().any(|l| l.interceptor.name() == name)
    }

    /// Number of interceptors in the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Get chain statistics.
    pub async fn stats(&self) -> ChainStats {
        self.stats.read().await.clone()
    }

    /// Get per-interceptor statistics in pre-call order.
    pub async fn interceptor_stats(&self) -> Vec<(String, InterceptorStats)> {
        let mut all = Vec::with_capacity(self.links.len());
        for link in &self.links {
            all.push((link.interceptor.name().to_string(), link.snapshot().await));
        }
        all
    }

    /// Information about the underlying transport.
    pub fn transport_info(&self) -> TransportInfo {
        self.transport.info()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.interceptor_names())
            .field("layers", &self.layers())
            .finish()
    }
}
