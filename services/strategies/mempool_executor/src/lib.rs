//! # Vigil Mempool Executor
//!
//! ## Purpose
//!
//! Watches the pending-transaction stream of several independent networks and,
//! for each observed event, runs a guarded execution attempt: a balance gate on
//! the reference network, a pluggable signal evaluator, and an execution guard
//! that only ever submits after a passing simulation or gas estimation.
//!
//! ## Architecture Role
//!
//! ```text
//! NetworkRegistry → [ConnectionSupervisor] → pending tx → [BalanceGate] → [SignalEvaluator] → [ExecutionGuard]
//!        ↓                   ↓                                 ↓                                  ↓
//!  endpoint lists     rotation + backoff                shared reference             relay bundle / direct
//!                     on every failed cycle             counter                      broadcast
//! ```
//!
//! Public endpoints fail constantly. A supervisor never stops for an endpoint
//! failure; it rotates to the next endpoint and reconnects after the backoff
//! delay. Failed or unprofitable trades abort before anything is spent.

#[macro_use]
pub mod logging;

pub mod balance_gate;
pub mod chain;
pub mod engine;
pub mod guard;
pub mod pipeline;
pub mod signal;
pub mod stream;
pub mod submission;
pub mod supervisor;

pub use balance_gate::{BalanceGate, GateDecision};
pub use chain::{ChainClientFactory, ChainQuery, EthersChainClient, EthersClientFactory};
pub use engine::Engine;
pub use guard::{AbortReason, ExecutionGuard, ExecutionOutcome, GuardSettings};
pub use pipeline::{EventPipeline, EventSink, PipelineOutcome};
pub use signal::{HeuristicEvaluator, SignalEvaluator};
pub use stream::{StreamConnector, StreamError, StreamSession, WsConnector};
pub use submission::Submission;
pub use supervisor::{
    ConnectionState, ConnectionSupervisor, SupervisorExit, SupervisorSettings,
};
