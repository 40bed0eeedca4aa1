//! Network Resilience Infrastructure
//!
//! Round-robin endpoint fallback for unreliable public RPC/WebSocket endpoints:
//! a pure [`select`] function, monotonic [`RotationCounter`]s shared between
//! supervisors, reconnect [`BackoffPolicy`], and the [`ChainError`] taxonomy
//! whose [`ErrorCategory`] drives rotation decisions.

pub mod backoff;
pub mod error;
pub mod rotation;
pub mod selector;

pub use backoff::BackoffPolicy;
pub use error::{classify_rpc_error, ChainError, ChainResult, ErrorCategory};
pub use rotation::{RotationCounter, RotationCounters};
pub use selector::{index_for, select, SelectorError};

/// Default delay between a closed connection and the next attempt
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SUBSCRIBE_ACK_TIMEOUT_MS: u64 = 10_000;
