//! Chain Error Types
//!
//! Every failure is labelled with an [`ErrorCategory`] where it happens, so the
//! supervisor can decide on rotation without inspecting message text.

use thiserror::Error;

/// How a failure should be handled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Endpoint-level trouble (rate limit, timeout, dropped connection); rotate
    Transient,
    /// The transaction itself would fail on-chain; do not rotate
    Revert,
    /// Anything else; abort the operation without rotating
    Fatal,
}

impl ErrorCategory {
    pub fn should_rotate(self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Revert => write!(f, "revert"),
            ErrorCategory::Fatal => write!(f, "fatal"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Endpoint unreachable, rate limited or otherwise unhealthy
    #[error("Endpoint unavailable during {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Execution reverted during {operation}: {message}")]
    Revert {
        operation: &'static str,
        message: String,
    },

    /// The node answered with an error that is neither a revert nor transient
    #[error("Request rejected during {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Signing error: {0}")]
    Signing(String),
}

impl ChainError {
    pub fn timeout(operation: &'static str, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation,
            timeout_ms,
        }
    }

    pub fn unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation,
            message: message.into(),
        }
    }

    pub fn revert(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Revert {
            operation,
            message: message.into(),
        }
    }

    pub fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            message: message.into(),
        }
    }

    /// Build from a JSON-RPC error object returned by the node.
    pub fn from_rpc(operation: &'static str, code: i64, message: &str) -> Self {
        let text = format!("{message} (code {code})");
        match classify_rpc_error(code, message) {
            ErrorCategory::Transient => Self::unavailable(operation, text),
            ErrorCategory::Revert => Self::revert(operation, text),
            ErrorCategory::Fatal => Self::rejected(operation, text),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChainError::Timeout { .. } | ChainError::Unavailable { .. } => ErrorCategory::Transient,
            ChainError::Revert { .. } => ErrorCategory::Revert,
            ChainError::Rejected { .. }
            | ChainError::InvalidEndpoint { .. }
            | ChainError::Signing(_) => ErrorCategory::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// The endpoint itself is at fault and another one should be tried.
    ///
    /// Transient failures plus endpoints that cannot even be parsed.
    pub fn is_endpoint_fault(&self) -> bool {
        self.is_transient() || matches!(self, ChainError::InvalidEndpoint { .. })
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

/// JSON-RPC error code 3 carries revert data (geth, erigon, reth).
const RPC_EXECUTION_REVERTED: i64 = 3;
/// Limit exceeded / rate limited (Infura, Alchemy, public gateways)
const RPC_LIMIT_EXCEEDED: i64 = -32005;
/// Some gateways forward the HTTP status as the error code
const HTTP_TOO_MANY_REQUESTS: i64 = 429;

/// Categorise a JSON-RPC error object.
pub fn classify_rpc_error(code: i64, message: &str) -> ErrorCategory {
    let lowered = message.to_ascii_lowercase();
    if code == HTTP_TOO_MANY_REQUESTS
        || code == RPC_LIMIT_EXCEEDED
        || lowered.contains("rate limit")
        || lowered.contains("too many requests")
    {
        ErrorCategory::Transient
    } else if code == RPC_EXECUTION_REVERTED || lowered.contains("revert") {
        ErrorCategory::Revert
    } else {
        ErrorCategory::Fatal
    }
}
