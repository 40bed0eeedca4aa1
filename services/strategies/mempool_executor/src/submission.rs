//! Execution paths behind one `submit` operation
//!
//! Both paths simulate before anything fee-bearing leaves the process:
//! the relayed path with `eth_callBundle` against the next block, the direct
//! path with `eth_estimateGas`.

use mev::{BundleBuilder, BundleRelay, FlashbotsClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vigil_types::{ExecutionPath, NetworkConfig, TradeIntent};

use crate::chain::ChainQuery;
use crate::guard::{AbortReason, ExecutionOutcome};

pub enum Submission {
    Relayed { relay: Arc<dyn BundleRelay> },
    Direct,
}

impl Submission {
    /// Relayed when the network has a privileged relay, direct otherwise.
    pub fn for_network(network: &NetworkConfig, timeout: Duration) -> Self {
        match network.privileged_relay() {
            Some(url) => Submission::Relayed {
                relay: Arc::new(FlashbotsClient::with_random_auth(url, timeout)),
            },
            None => Submission::Direct,
        }
    }

    pub fn path(&self) -> ExecutionPath {
        match self {
            Submission::Relayed { .. } => ExecutionPath::Relayed,
            Submission::Direct => ExecutionPath::Direct,
        }
    }

    pub async fn submit(&self, chain: &dyn ChainQuery, intent: &TradeIntent) -> ExecutionOutcome {
        match self {
            Submission::Relayed { relay } => submit_relayed(relay.as_ref(), chain, intent).await,
            Submission::Direct => submit_direct(chain, intent).await,
        }
    }
}

async fn submit_relayed(
    relay: &dyn BundleRelay,
    chain: &dyn ChainQuery,
    intent: &TradeIntent,
) -> ExecutionOutcome {
    let block = match chain.block_number().await {
        Ok(block) => block,
        Err(e) => return ExecutionOutcome::Aborted(AbortReason::QueryFailed(e)),
    };

    let raw = match chain.sign(intent).await {
        Ok(raw) => raw,
        Err(e) => return ExecutionOutcome::Aborted(AbortReason::SubmissionFailed(e.to_string())),
    };

    let bundle = BundleBuilder::new(block + 1).add_transaction(raw).build();

    match relay.simulate(&bundle).await {
        Ok(report) => {
            if let Some(reason) = report.failure() {
                return ExecutionOutcome::Aborted(AbortReason::SimulationFailed(reason));
            }
            debug!(
                "Bundle simulation passed for block {} ({:?} gas)",
                bundle.target_block, report.total_gas_used
            );
        }
        Err(e) => return ExecutionOutcome::Aborted(AbortReason::SimulationFailed(e.to_string())),
    }

    match relay.send_bundle(&bundle).await {
        Ok(receipt) => ExecutionOutcome::Submitted {
            path: ExecutionPath::Relayed,
            reference: receipt.bundle_hash,
        },
        Err(e) => ExecutionOutcome::Aborted(AbortReason::SubmissionFailed(e.to_string())),
    }
}

async fn submit_direct(chain: &dyn ChainQuery, intent: &TradeIntent) -> ExecutionOutcome {
    match chain.estimate_gas(intent).await {
        Ok(estimate) if estimate > intent.gas.gas_limit => {
            return ExecutionOutcome::Aborted(AbortReason::EstimationFailed(format!(
                "estimate {} exceeds gas limit {}",
                estimate, intent.gas.gas_limit
            )));
        }
        Ok(_) => {}
        Err(e) => return ExecutionOutcome::Aborted(AbortReason::EstimationFailed(e.to_string())),
    }

    let raw = match chain.sign(intent).await {
        Ok(raw) => raw,
        Err(e) => return ExecutionOutcome::Aborted(AbortReason::SubmissionFailed(e.to_string())),
    };

    match chain.send_raw(raw).await {
        Ok(tx_hash) => ExecutionOutcome::Submitted {
            path: ExecutionPath::Direct,
            reference: tx_hash,
        },
        Err(e) => ExecutionOutcome::Aborted(AbortReason::SubmissionFailed(e.to_string())),
    }
}
