//! Interceptor contract.
//!
//! An interceptor comes in two halves:
//!
//! - an [`InterceptorDescriptor`], stateless and registered once per process,
//!   which decides through [`applicable_layer`](InterceptorDescriptor::applicable_layer)
//!   whether it joins a session and at which [`Layer`];
//! - an [`Interceptor`] instance, created once per session by the descriptor,
//!   bound to that session's transport, and invoked for every call.
//!
//! Instances forward a call by consuming the [`Next`] handle they are given.
//! Because `Next` is moved into [`Next::run`] it can be forwarded at most
//! once. Returning `Ok` without forwarding is reported by the chain as
//! [`PipelineError::ChainInvariantViolation`]; returning `Err` without
//! forwarding is an allowed short-circuit.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::messages::JsonRpcResponse;
use crate::transport::Transport;

/// Signed priority of an interceptor within a chain.
///
/// Chains run pre-call steps in ascending layer order and post-call steps in
/// descending order. Negative layers are inner layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(pub i32);

impl Layer {
    /// The raw priority value.
    pub fn value(self) -> i32 {
        self.0
    }

    /// Whether this is an inner (negative) layer.
    pub fn is_inner(self) -> bool {
        self.0 < 0
    }
}

impl From<i32> for Layer {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry-level description of an interceptor variant.
#[async_trait]
pub trait InterceptorDescriptor: Send + Sync + 'static {
    /// Get the name of this interceptor
    fn name(&self) -> &str;

    /// Decide whether this interceptor applies to a session, and at which layer.
    ///
    /// Called once per session before the chain exists. It may issue
    /// diagnostic calls on `transport` but must not otherwise change its
    /// state. A returned error aborts the chain build.
    async fn applicable_layer(
        &self,
        transport: &Arc<dyn Transport>,
        config: &NetworkConfig,
    ) -> PipelineResult<Option<Layer>>;

    /// Create the per-session instance bound to `transport`.
    fn instantiate(&self, transport: Arc<dyn Transport>) -> Box<dyn Interceptor>;

    /// Identity used for registry deduplication: the implementing type.
    fn descriptor_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Per-session interceptor instance.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Get the name of this interceptor
    fn name(&self) -> &str;

    /// Handle one call.
    ///
    /// Work done before `next.run(..)` is the pre-call step, work done on its
    /// result is the post-call step. `method` and `params` may be rewritten
    /// before forwarding.
    async fn invoke(
        &self,
        method: &str,
        params: Vec<Value>,
        next: Next<'_>,
    ) -> PipelineResult<JsonRpcResponse>;

    /// Counters this interceptor keeps itself.
    ///
    /// Only [`InterceptorStats::total_rewritten`] is read from here; the
    /// chain tracks invocations, failures and timing on its own.
    fn stats(&self) -> InterceptorStats {
        InterceptorStats::default()
    }
}

/// Statistics kept by the chain for each of its interceptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterceptorStats {
    /// Total calls that reached this interceptor
    pub total_invoked: u64,
    /// Calls this interceptor failed, including forwarded failures
    pub total_failed: u64,
    /// Calls failed without forwarding to the rest of the chain
    pub total_short_circuited: u64,
    /// Responses this interceptor rewrote
    pub total_rewritten: u64,
    /// Average time spent in this interceptor and everything inward of it
    pub avg_processing_time_ms: f64,
    /// Last processed timestamp
    pub last_processed: Option<chrono::DateTime<chrono::Utc>>,
}

/// One position in a built chain.
pub(crate) struct Link {
    pub(crate) layer: Layer,
    pub(crate) interceptor: Box<dyn Interceptor>,
    pub(crate) stats: RwLock<InterceptorStats>,
}

impl Link {
    pub(crate) fn new(layer: Layer, interceptor: Box<dyn Interceptor>) -> Self {
        Self {
            layer,
            interceptor,
            stats: RwLock::new(InterceptorStats::default()),
        }
    }

    /// Chain-kept counters merged with the ones the interceptor reports.
    pub(crate) async fn snapshot(&self) -> InterceptorStats {
        let mut stats = self.stats.read().await.clone();
        stats.total_rewritten = self.interceptor.stats().total_rewritten;
        stats
    }
}

/// Handle to the remainder of the chain, given to [`Interceptor::invoke`].
pub struct Next<'a> {
    links: &'a [Link],
    transport: &'a dyn Transport,
    forwarded: &'a AtomicBool,
}

impl<'a> Next<'a> {
    /// Forward the call to the next interceptor, or to the transport at the
    /// innermost end.
    pub async fn run(self, method: &str, params: Vec<Value>) -> PipelineResult<JsonRpcResponse> {
        self.forwarded.store(true, Ordering::SeqCst);
        dispatch(self.links, self.transport, method, params).await
    }

    /// Names of the interceptors still ahead of this point, innermost last.
    pub fn remaining(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.interceptor.name()).collect()
    }
}

/// Run `method` through `links` in order, then through `transport`.
pub(crate) async fn dispatch(
    links: &[Link],
    transport: &dyn Transport,
    method: &str,
    params: Vec<Value>,
) -> PipelineResult<JsonRpcResponse> {
    let Some((link, rest)) = links.split_first() else {
        debug!("Dispatching {} to transport", method);
        return transport.send(method, params).await;
    };

    let start = std::time::Instant::now();
    let name = link.interceptor.name();
    let forwarded = AtomicBool::new(false);
    let next = Next {
        links: rest,
        transport,
        forwarded: &forwarded,
    };

    debug!("Interceptor {} (layer {}) handling {}", name, link.layer, method);
    let result = link.interceptor.invoke(method, params, next).await;
    let forwarded = forwarded.load(Ordering::SeqCst);

    let result = match result {
        Ok(_) if !forwarded => {
            warn!("Interceptor {} returned a response without forwarding {}", name, method);
            Err(PipelineError::invariant(
                name,
                format!("returned a response for '{}' without calling next", method),
            ))
        }
        other => other,
    };

    let mut stats = link.stats.write().await;
    stats.total_invoked += 1;
    if result.is_err() {
        stats.total_failed += 1;
        if !forwarded {
            stats.total_short_circuited += 1;
        }
    }
    stats.last_processed = Some(chrono::Utc::now());
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    stats.avg_processing_time_ms = (stats.avg_processing_time_ms
        * (stats.total_invoked - 1) as f64
        + elapsed)
        / stats.total_invoked as f64;

    result
}
