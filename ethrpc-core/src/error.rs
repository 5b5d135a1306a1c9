//! Error types for the interceptor pipeline.
//!
//! Every failure that can surface from [`Chain::send`](crate::chain::Chain::send)
//! or [`ChainBuilder::build`](crate::chain::ChainBuilder::build) is a
//! [`PipelineError`]. Transport failures pass through untranslated unless an
//! interceptor explicitly recognises them.
//!
//! # Examples
//!
//! ```rust
//! use ethrpc_core::error::{PipelineError, TransportError};
//!
//! let error = PipelineError::Transport(TransportError::ConnectionFailed {
//!     transport_type: "http".to_string(),
//!     reason: "connection refused".to_string(),
//! });
//!
//! assert!(error.is_retryable());
//! assert_eq!(error.category(), "transport");
//! ```

use thiserror::Error;

/// The main error type for all pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Transport-related errors (connection, HTTP status, decoding, etc.)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The node cannot serve historical state for a forked network.
    ///
    /// Not retriable: the session has to be restarted against a fresher fork.
    #[error("Archive state unavailable: {message}")]
    ArchiveStateUnavailable {
        /// Actionable description for the user
        message: String,
    },

    /// An applicability probe failed, so no chain could be built.
    #[error("Failed to build interceptor chain: probe '{interceptor}' failed: {reason}")]
    Build {
        /// Name of the interceptor whose probe failed
        interceptor: String,
        /// Underlying failure
        reason: String,
    },

    /// An interceptor broke the forwarding contract.
    #[error("Chain invariant violated by '{interceptor}': {reason}")]
    ChainInvariantViolation {
        /// Name of the offending interceptor
        interceptor: String,
        /// What went wrong
        reason: String,
    },

    /// A block failed strict `extraData` validation.
    #[error("The field extraData is {length} bytes, but should be {max}. It is quite likely that you are connected to a POA chain.")]
    ExtraDataLength {
        /// Decoded length in bytes
        length: usize,
        /// Maximum accepted length in bytes
        max: usize,
    },

    /// The node answered with a JSON-RPC error payload.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i32,
        /// JSON-RPC error message
        message: String,
    },

    /// Configuration errors (invalid files, missing parameters, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        /// The underlying serde_json error
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Generic errors for cases not covered by specific variants
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Failures of the underlying RPC transport.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum TransportError {
    /// Failed to reach the node
    #[error("Failed to connect to {transport_type} endpoint: {reason}")]
    ConnectionFailed {
        transport_type: String,
        reason: String,
    },

    /// Failed to send the request
    #[error("Failed to send request via {transport_type}: {reason}")]
    SendFailed {
        transport_type: String,
        reason: String,
    },

    /// Non-success HTTP status
    #[error("HTTP error: {status_code} - {reason}")]
    HttpError { status_code: u16, reason: String },

    /// Request or response body could not be (de)serialized
    #[error("Serialization error ({transport_type}): {reason}")]
    SerializationError {
        transport_type: String,
        reason: String,
    },

    /// The transport gave up waiting
    #[error("Operation timed out ({transport_type}): {reason}")]
    TimeoutError {
        transport_type: String,
        reason: String,
    },

    /// The request was cancelled before a response arrived
    #[error("Request cancelled ({transport_type}): {reason}")]
    Cancelled {
        transport_type: String,
        reason: String,
    },
}

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
#[allow(missing_docs)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file has invalid format
    #[error("Invalid configuration format in {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    /// Configuration parameter has invalid value
    #[error("Invalid value for parameter '{parameter}': {value} - {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Convenience type alias for Results using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create a new internal error with a custom message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a build error for the named interceptor.
    pub fn build(interceptor: impl Into<String>, reason: impl ToString) -> Self {
        Self::Build {
            interceptor: interceptor.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a chain invariant violation for the named interceptor.
    pub fn invariant(interceptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChainInvariantViolation {
            interceptor: interceptor.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable.
    ///
    /// The pipeline itself never retries; this only informs callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Transport(transport_err) => transport_err.is_retryable(),
            PipelineError::Io { .. } => true,
            PipelineError::ArchiveStateUnavailable { .. } => false,
            PipelineError::Build { .. } => false,
            PipelineError::ChainInvariantViolation { .. } => false,
            PipelineError::ExtraDataLength { .. } => false,
            PipelineError::Rpc { .. } => false,
            PipelineError::Config(_) => false,
            PipelineError::Serialization { .. } => false,
            PipelineError::Internal { .. } => false,
        }
    }

    /// Get the error category for this error.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Transport(_) => "transport",
            PipelineError::ArchiveStateUnavailable { .. } => "archive_state",
            PipelineError::Build { .. } => "build",
            PipelineError::ChainInvariantViolation { .. } => "invariant",
            PipelineError::ExtraDataLength { .. } => "validation",
            PipelineError::Rpc { .. } => "rpc",
            PipelineError::Config(_) => "config",
            PipelineError::Serialization { .. } => "serialization",
            PipelineError::Io { .. } => "io",
            PipelineError::Internal { .. } => "internal",
        }
    }
}

impl TransportError {
    /// Check if this transport error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::SendFailed { .. } => true,
            TransportError::TimeoutError { .. } => true,
            TransportError::HttpError { status_code, .. } => {
                // 5xx errors are generally retryable, 4xx are not
                *status_code >= 500
            }
            TransportError::SerializationError { .. } => false,
            TransportError::Cancelled { .. } => false,
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Transport(TransportError::TimeoutError {
                transport_type: "http".to_string(),
                reason: err.to_string(),
            })
        } else if err.is_connect() {
            PipelineError::Transport(TransportError::ConnectionFailed {
                transport_type: "http".to_string(),
                reason: err.to_string(),
            })
        } else if let Some(status) = err.status() {
            PipelineError::Transport(TransportError::HttpError {
                status_code: status.as_u16(),
                reason: err.to_string(),
            })
        } else {
            PipelineError::Transport(TransportError::SendFailed {
                transport_type: "http".to_string(),
                reason: err.to_string(),
            })
        }
    }
}

impl From<url::ParseError> for PipelineError {
    fn from(err: url::ParseError) -> Self {
        PipelineError::Config(ConfigError::InvalidValue {
            parameter: "url".to_string(),
            value: err.to_string(),
            reason: "Invalid URL format".to_string(),
        })
    }
}
