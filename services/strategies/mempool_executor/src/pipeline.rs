//! Per-event pipeline: BalanceGate → SignalEvaluator → ExecutionGuard

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use vigil_types::precision::format_eth;

use crate::balance_gate::{BalanceGate, GateDecision};
use crate::chain::ChainQuery;
use crate::guard::{AbortReason, ExecutionGuard, ExecutionOutcome};
use crate::signal::SignalEvaluator;
use crate::submission::Submission;

/// Receives each pending-transaction reference on a listening connection.
///
/// Called inline by the supervisor, one event at a time, with the query
/// client of the connection the event arrived on.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, chain: &Arc<dyn ChainQuery>, tx_ref: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Stopped at the balance gate
    Gated(GateDecision),
    /// Evaluator reported no opportunity
    NoSignal,
    Executed(ExecutionOutcome),
}

pub struct EventPipeline {
    network: String,
    gate: Arc<BalanceGate>,
    evaluator: Arc<dyn SignalEvaluator>,
    guard: ExecutionGuard,
    submission: Submission,
}

impl EventPipeline {
    pub fn new(
        network: impl Into<String>,
        gate: Arc<BalanceGate>,
        evaluator: Arc<dyn SignalEvaluator>,
        guard: ExecutionGuard,
        submission: Submission,
    ) -> Self {
        Self {
            network: network.into(),
            gate,
            evaluator,
            guard,
            submission,
        }
    }

    pub async fn process(&self, chain: &dyn ChainQuery, tx_ref: &str) -> PipelineOutcome {
        let received = Instant::now();
        let decision = self.gate.admit().await;
        if !decision.is_open() {
            return PipelineOutcome::Gated(decision);
        }

        let signal = self.evaluator.evaluate(tx_ref);
        if !signal.valid {
            return PipelineOutcome::NoSignal;
        }

        log_search!(
            "[{}] Signal {} {:.2}% on {} | Latency: {}μs",
            self.network,
            signal.action,
            signal.magnitude,
            tx_ref,
            received.elapsed().as_micros()
        );

        let outcome = self.guard.attempt(chain, &self.submission, &signal).await;
        match &outcome {
            ExecutionOutcome::Submitted { path, reference } => {
                log_execution!("[{}] Submitted via {}: {:?}", self.network, path, reference);
            }
            ExecutionOutcome::Aborted(
                reason @ (AbortReason::SimulationFailed(_) | AbortReason::EstimationFailed(_)),
            ) => {
                log_abort!("[{}] Protection triggered, nothing spent: {}", self.network, reason);
            }
            ExecutionOutcome::Aborted(AbortReason::InsufficientForCost { available, total }) => {
                tracing::debug!(
                    "{} [{}] Cost {} exceeds available {}",
                    crate::logging::LogEmoji::GAS,
                    self.network,
                    format_eth(*total),
                    format_eth(*available)
                );
            }
            ExecutionOutcome::Aborted(reason @ AbortReason::SubmissionFailed(_)) => {
                log_warning!("[{}] {}", self.network, reason);
            }
            ExecutionOutcome::Aborted(reason) => {
                tracing::debug!("[{}] Aborted: {}", self.network, reason);
            }
        }
        PipelineOutcome::Executed(outcome)
    }
}

#[async_trait]
impl EventSink for EventPipeline {
    async fn on_event(&self, chain: &Arc<dyn ChainQuery>, tx_ref: &str) {
        self.process(chain.as_ref(), tx_ref).await;
    }
}
