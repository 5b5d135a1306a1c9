//! Built-in interceptors for Ethereum JSON-RPC chains
//!
//! - [`ArchiveStateTranslator`] (layer 90): on forked networks, turns
//!   archive-state errors from the origin node into
//!   [`PipelineError::ArchiveStateUnavailable`](ethrpc_core::PipelineError::ArchiveStateUnavailable).
//! - [`ExtraDataShim`] (layer 100): on chains whose blocks fail the strict
//!   `extraData` length check, relaxes every block-shaped result.
//!
//! [`default_registry`] is the static registration list of both.

pub mod archive_state;
pub mod block;
pub mod extra_data;

pub use archive_state::{ArchiveStateTranslator, ARCHIVE_STATE_LAYER, ARCHIVE_STATE_MESSAGE};
pub use extra_data::{ExtraDataShim, EXTRA_DATA_LAYER};

use ethrpc_core::InterceptorRegistry;

/// Registry holding every built-in interceptor, in registration order.
pub fn default_registry() -> InterceptorRegistry {
    InterceptorRegistry::new()
        .with(ArchiveStateTranslator)
        .with(ExtraDataShim)
}
