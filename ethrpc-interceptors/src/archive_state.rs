//! Archive-state translator for forked networks.
//!
//! A local fork serves historical state by proxying to its origin node. Once
//! the fork is older than the origin's retained block window, the origin
//! answers with errors that read like a permissions fault. This interceptor
//! turns those into [`PipelineError::ArchiveStateUnavailable`].

use std::sync::Arc;

use async_trait::async_trait;
use ethrpc_core::{
    Interceptor, InterceptorDescriptor, JsonRpcResponse, Layer, NetworkConfig, Next,
    PipelineError, PipelineResult, Transport,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Layer the translator joins at when the network is a fork.
pub const ARCHIVE_STATE_LAYER: Layer = Layer(90);

/// Message carried by [`PipelineError::ArchiveStateUnavailable`].
pub const ARCHIVE_STATE_MESSAGE: &str = "Local fork was created more than 128 blocks ago and you do not \
     have access to archival states. Please restart your session.";

const RETURNED_ERROR_PREFIX: &str = "Returned error: ";
const NO_ARCHIVE_ACCESS: &str = "project ID does not have access to archive state";
const MISSING_TRIE_NODE: &str = "missing trie node";

/// Whether a node error message means archival state is out of reach.
///
/// Accepts messages with or without the `"Returned error: "` prefix some
/// providers add.
pub fn is_archive_state_error(message: &str) -> bool {
    let message = message.strip_prefix(RETURNED_ERROR_PREFIX).unwrap_or(message);
    message == NO_ARCHIVE_ACCESS || message.starts_with(MISSING_TRIE_NODE)
}

/// Descriptor for the archive-state translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveStateTranslator;

#[async_trait]
impl InterceptorDescriptor for ArchiveStateTranslator {
    fn name(&self) -> &str {
        "ArchiveStateTranslator"
    }

    async fn applicable_layer(
        &self,
        _transport: &Arc<dyn Transport>,
        config: &NetworkConfig,
    ) -> PipelineResult<Option<Layer>> {
        match config.fork_origin() {
            Some(origin) => {
                debug!("Network is forked from '{}'", origin);
                Ok(Some(ARCHIVE_STATE_LAYER))
            }
            None => Ok(None),
        }
    }

    fn instantiate(&self, transport: Arc<dyn Transport>) -> Box<dyn Interceptor> {
        Box::new(ArchiveStateInterceptor { transport })
    }
}

/// Per-session archive-state translator.
struct ArchiveStateInterceptor {
    transport: Arc<dyn Transport>,
}

#[async_trait]
impl Interceptor for ArchiveStateInterceptor {
    fn name(&self) -> &str {
        "ArchiveStateTranslator"
    }

    async fn invoke(
        &self,
        method: &str,
        params: Vec<Value>,
        next: Next<'_>,
    ) -> PipelineResult<JsonRpcResponse> {
        let response = next.run(method, params).await?;

        match response.error_message() {
            Some(message) if is_archive_state_error(message) => {
                let endpoint = self.transport.info().endpoint.unwrap_or_default();
                warn!(
                    "{} on {} failed with '{}': fork has aged past the archive window",
                    method, endpoint, message
                );
                Err(PipelineError::ArchiveStateUnavailable {
                    message: ARCHIVE_STATE_MESSAGE.to_string(),
                })
            }
            _ => Ok(response),
        }
    }
}
