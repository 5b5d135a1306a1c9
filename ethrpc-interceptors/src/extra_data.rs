//! Extra-data compatibility shim for proof-of-authority chains.
//!
//! Detection happens once, before the chain exists: the probe fetches the
//! latest block through the raw transport and applies the strict `extraData`
//! check. When the check fails, every block-shaped result returned through
//! the chain is relaxed with [`relax_result`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ethrpc_core::{
    Interceptor, InterceptorDescriptor, InterceptorStats, JsonRpcResponse, Layer, NetworkConfig,
    Next, PipelineError, PipelineResult, Transport,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::block::{is_extra_data_error, relax_result, validate_extra_data};

/// Layer the shim joins at when the chain needs it.
pub const EXTRA_DATA_LAYER: Layer = Layer(100);

/// Method used by the diagnostic probe.
pub const PROBE_METHOD: &str = "eth_getBlockByNumber";

/// Descriptor for the extra-data compatibility shim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtraDataShim;

#[async_trait]
impl InterceptorDescriptor for ExtraDataShim {
    fn name(&self) -> &str {
        "ExtraDataShim"
    }

    async fn applicable_layer(
        &self,
        transport: &Arc<dyn Transport>,
        _config: &NetworkConfig,
    ) -> PipelineResult<Option<Layer>> {
        let response = transport
            .send(PROBE_METHOD, vec![json!("latest"), json!(false)])
            .await?;

        if let Some(error) = &response.error {
            if is_extra_data_error(&error.message) {
                debug!("Latest block rejected by node: {}", error.message);
                return Ok(Some(EXTRA_DATA_LAYER));
            }
            // Any other node error says nothing about block validation.
            debug!("Latest block probe answered with '{}', shim not needed", error.message);
            return Ok(None);
        }

        let block = response.result.unwrap_or(Value::Null);
        match validate_extra_data(&block) {
            Ok(()) => Ok(None),
            Err(PipelineError::ExtraDataLength { length, .. }) => {
                debug!("Latest block carries {} bytes of extraData", length);
                Ok(Some(EXTRA_DATA_LAYER))
            }
            Err(e) => Err(e),
        }
    }

    fn instantiate(&self, _transport: Arc<dyn Transport>) -> Box<dyn Interceptor> {
        Box::new(ExtraDataInterceptor::default())
    }
}

/// Per-session shim.
#[derive(Default)]
struct ExtraDataInterceptor {
    /// Block objects relaxed so far
    rewritten: AtomicU64,
}

#[async_trait]
impl Interceptor for ExtraDataInterceptor {
    fn name(&self) -> &str {
        "ExtraDataShim"
    }

    async fn invoke(
        &self,
        method: &str,
        params: Vec<Value>,
        next: Next<'_>,
    ) -> PipelineResult<JsonRpcResponse> {
        let mut response = next.run(method, params).await?;

        if let Some(result) = response.result.as_mut() {
            let rewritten = relax_result(result);
            if rewritten > 0 {
                self.rewritten.fetch_add(rewritten as u64, Ordering::Relaxed);
                debug!("Relaxed extraData on {} block(s) from {}", rewritten, method);
            }
        }

        Ok(response)
    }

    fn stats(&self) -> InterceptorStats {
        InterceptorStats {
            total_rewritten: self.rewritten.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}
