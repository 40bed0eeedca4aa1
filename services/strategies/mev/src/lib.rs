//! # Vigil MEV Library - Privileged Relay Submission
//!
//! ## Purpose
//!
//! Bundle construction and a Flashbots-compatible relay client. A bundle is
//! first simulated with `eth_callBundle` against the target block; only a clean
//! simulation is followed by `eth_sendBundle`, so a failing transaction never
//! reaches a builder and costs nothing.
//!
//! ## Architecture Role
//!
//! ```text
//! Signed Tx → [BundleBuilder] → [BundleRelay::simulate] → [BundleRelay::send_bundle]
//!                                     ↓ revert / error
//!                                  zero-cost abort
//! ```
//!
//! [`BundleRelay`] is the seam the execution guard depends on; [`FlashbotsClient`]
//! is the HTTP implementation.

use async_trait::async_trait;
use thiserror::Error;

pub mod bundle;
pub mod flashbots;

pub use bundle::{Bundle, BundleBuilder};
pub use flashbots::{BundleReceipt, FlashbotsClient, SimulatedTransaction, SimulationReport};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("relay transport error: {0}")]
    Transport(String),

    #[error("relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("relay JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid relay response: {0}")]
    InvalidResponse(String),

    #[error("failed to sign relay request: {0}")]
    Signing(String),
}

impl RelayError {
    /// Rate limits, timeouts and 5xx responses
    pub fn is_transient(&self) -> bool {
        match self {
            RelayError::Timeout { .. } | RelayError::Transport(_) => true,
            RelayError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Privileged relay used by the relayed execution path
#[async_trait]
pub trait BundleRelay: Send + Sync {
    /// Simulate `bundle` against its target block.
    ///
    /// A relay-level rejection of the simulation is reported inside the
    /// returned report, not as `Err`.
    async fn simulate(&self, bundle: &Bundle) -> Result<SimulationReport, RelayError>;

    /// Submit `bundle` for inclusion in its target block.
    async fn send_bundle(&self, bundle: &Bundle) -> Result<BundleReceipt, RelayError>;
}
