//! Execution guard and submission path tests
//!
//! Every abort path must leave the chain untouched: no bundle sent after a
//! failed simulation, no broadcast after a failed gas estimate.

mod common;

use common::*;
use mev::{RelayError, SimulatedTransaction, SimulationReport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use vigil_mempool_executor::{
    AbortReason, ExecutionGuard, ExecutionOutcome, GuardSettings, Submission,
};
use vigil_network::ChainError;
use vigil_types::{Address, EventSignal, ExecutionPath, FeeData, SignalAction, H256, U256};

const CHAIN_ID: u64 = 1;

fn settings() -> GuardSettings {
    GuardSettings {
        gas_reserve: milli_eth(15),
        min_margin: milli_eth(5),
        allocation_bps: 10_000,
        maximize_leverage: false,
        premium_bps: 9,
        gas_limit: U256::from(650_000u64),
        fee_buffer_percent: 120,
        priority_fee_floor: gwei(7),
        executor: Address::repeat_byte(0xee),
        profit_recipient: Address::repeat_byte(0x42),
    }
}

fn guard() -> ExecutionGuard {
    ExecutionGuard::new(settings(), CHAIN_ID)
}

fn signal(magnitude: f64) -> EventSignal {
    EventSignal::new(true, SignalAction::Acquire, magnitude, Some(0.8))
}

/// 1 ETH available after the reserve, 30 gwei max fee, 2 gwei tip
fn funded_chain() -> Arc<MockChain> {
    Arc::new(MockChain::new("https://trade").with_balance(milli_eth(1_015)))
}

fn relayed(relay: &Arc<MockRelay>) -> Submission {
    Submission::Relayed {
        relay: Arc::clone(relay) as Arc<dyn mev::BundleRelay>,
    }
}

#[tokio::test]
async fn test_reverted_simulation_never_sends_bundle() {
    let chain = funded_chain();
    let relay = Arc::new(MockRelay::with_report(Ok(SimulationReport {
        results: vec![SimulatedTransaction {
            tx_hash: Some(H256::repeat_byte(1)),
            error: Some("execution reverted".to_string()),
            revert: Some("insufficient liquidity".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    })));

    let outcome = guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(5.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::SimulationFailed(_))
    ));
    assert_eq!(relay.simulations(), 1);
    assert_eq!(relay.submissions(), 0);
    assert_eq!(CallCounts::get(&chain.calls.send_raw), 0);
}

#[tokio::test]
async fn test_bundle_level_simulation_error_aborts() {
    let chain = funded_chain();
    let relay = Arc::new(MockRelay::with_report(Ok(SimulationReport::rejected(
        "reverted",
    ))));

    let outcome = guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(5.0))
        .await;

    match outcome {
        ExecutionOutcome::Aborted(AbortReason::SimulationFailed(reason)) => {
            assert!(reason.contains("reverted"))
        }
        other => panic!("expected simulation failure, got {other:?}"),
    }
    assert_eq!(relay.submissions(), 0);
}

#[tokio::test]
async fn test_relay_transport_error_aborts_without_submission() {
    let chain = funded_chain();
    let relay = Arc::new(MockRelay::with_report(Err(RelayError::Timeout {
        timeout_ms: 10_000,
    })));

    let outcome = guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(5.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::SimulationFailed(_))
    ));
    assert_eq!(relay.submissions(), 0);
}

#[tokio::test]
async fn test_passing_simulation_submits_bundle_for_next_block() {
    let chain = funded_chain();
    let relay = Arc::new(MockRelay::passing());

    let outcome = guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(5.0))
        .await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Submitted {
            path: ExecutionPath::Relayed,
            reference: relay.bundle_hash,
        }
    );
    assert_eq!(relay.simulations(), 1);
    assert_eq!(relay.submissions(), 1);

    let bundle = relay.last_bundle.lock().clone().unwrap();
    assert_eq!(bundle.target_block, chain.block + 1);
    assert_eq!(bundle.transactions.len(), 1);
    // The relayed path never broadcasts through the query endpoint
    assert_eq!(CallCounts::get(&chain.calls.send_raw), 0);
}

#[tokio::test]
async fn test_intent_carries_premium_and_buffered_fees() {
    let chain = funded_chain();
    let relay = Arc::new(MockRelay::passing());

    guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(5.0))
        .await;

    let intent = chain.intent().unwrap();
    assert_eq!(intent.chain_id, CHAIN_ID);
    assert_eq!(intent.to, Address::repeat_byte(0xee));
    assert_eq!(intent.path, ExecutionPath::Relayed);
    assert_eq!(intent.trade_size, milli_eth(1_000));
    // 9 bps of 1 ETH
    assert_eq!(intent.value, U256::from(900_000_000_000_000u64));
    // 30 gwei * 120%
    assert_eq!(intent.gas.fee_per_unit, gwei(36));
    // Observed tip of 2 gwei is raised to the 7 gwei floor
    assert_eq!(intent.gas.priority_fee, Some(gwei(7)));
    assert_eq!(intent.gas.gas_limit, U256::from(650_000u64));
    assert_eq!(&intent.calldata[..4], &ethers::utils::id("executeFlashTrade(uint256,address)")[..]);
}

#[tokio::test]
async fn test_failed_estimate_never_broadcasts() {
    let chain = Arc::new(
        MockChain::new("https://trade")
            .with_balance(milli_eth(1_015))
            .with_estimate(Err(ChainError::revert("eth_estimateGas", "execution reverted"))),
    );

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::EstimationFailed(_))
    ));
    assert_eq!(CallCounts::get(&chain.calls.estimate_gas), 1);
    assert_eq!(CallCounts::get(&chain.calls.sign), 0);
    assert_eq!(CallCounts::get(&chain.calls.send_raw), 0);
}

#[tokio::test]
async fn test_estimate_above_gas_limit_aborts() {
    let chain = Arc::new(
        MockChain::new("https://trade")
            .with_balance(milli_eth(1_015))
            .with_estimate(Ok(U256::from(900_000u64))),
    );

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::EstimationFailed(_))
    ));
    assert_eq!(CallCounts::get(&chain.calls.send_raw), 0);
}

#[tokio::test]
async fn test_direct_path_broadcasts_after_estimate() {
    let chain = funded_chain();

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Submitted {
            path: ExecutionPath::Direct,
            reference: chain.tx_hash,
        }
    );
    assert_eq!(CallCounts::get(&chain.calls.estimate_gas), 1);
    assert_eq!(CallCounts::get(&chain.calls.send_raw), 1);
    assert_eq!(chain.intent().unwrap().path, ExecutionPath::Direct);
}

#[tokio::test]
async fn test_legacy_fee_data_builds_legacy_intent() {
    let chain = Arc::new(
        MockChain::new("https://trade")
            .with_balance(milli_eth(1_015))
            .with_fees(FeeData::Legacy {
                gas_price: gwei(25),
            }),
    );

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert!(outcome.is_submitted());
    let intent = chain.intent().unwrap();
    assert_eq!(intent.gas.priority_fee, None);
    assert_eq!(intent.gas.fee_per_unit, gwei(30));
}

#[tokio::test]
async fn test_below_reserve_aborts_before_fee_query() {
    let chain = Arc::new(MockChain::new("https://trade").with_balance(milli_eth(10)));

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::BelowGasReserve {
            balance: milli_eth(10)
        })
    );
    assert_eq!(CallCounts::get(&chain.calls.fee_data), 0);
    assert_eq!(CallCounts::get(&chain.calls.estimate_gas), 0);
}

#[tokio::test]
async fn test_cost_above_available_submits_nothing() {
    // 0.001 ETH available against ~0.0234 ETH of gas
    let chain = Arc::new(MockChain::new("https://trade").with_balance(milli_eth(16)));
    let relay = Arc::new(MockRelay::passing());

    let outcome = guard()
        .attempt(chain.as_ref(), &relayed(&relay), &signal(50.0))
        .await;

    match outcome {
        ExecutionOutcome::Aborted(AbortReason::InsufficientForCost { available, total }) => {
            assert_eq!(available, milli_eth(1));
            assert!(total > available);
        }
        other => panic!("expected insufficient funds, got {other:?}"),
    }
    assert_eq!(relay.simulations(), 0);
    assert_eq!(CallCounts::get(&chain.calls.sign), 0);
}

#[tokio::test]
async fn test_unprofitable_signal_aborts() {
    let chain = funded_chain();

    // 1% of 1 ETH is below gas + premium + margin (~0.0293 ETH)
    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(1.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::Unprofitable { .. })
    ));
    assert_eq!(CallCounts::get(&chain.calls.estimate_gas), 0);
}

#[tokio::test]
async fn test_leverage_sizing_stays_within_available() {
    let chain = funded_chain();
    let guard = ExecutionGuard::new(
        GuardSettings {
            maximize_leverage: true,
            ..settings()
        },
        CHAIN_ID,
    );

    let outcome = guard
        .attempt(chain.as_ref(), &Submission::Direct, &signal(0.5))
        .await;
    assert!(outcome.is_submitted());

    let intent = chain.intent().unwrap();
    let available = milli_eth(1_000);
    assert!(intent.trade_size > available);
    assert!(intent.value + intent.max_gas_cost() <= available);
}

#[tokio::test]
async fn test_balance_query_failure_aborts() {
    let chain = Arc::new(
        MockChain::new("https://trade")
            .with_balance_error(ChainError::unavailable("eth_getBalance", "connection reset")),
    );

    let outcome = guard()
        .attempt(chain.as_ref(), &Submission::Direct, &signal(5.0))
        .await;

    assert!(matches!(
        outcome,
        ExecutionOutcome::Aborted(AbortReason::QueryFailed(_))
    ));
    assert_eq!(chain.calls.fee_data.load(Ordering::SeqCst), 0);
}
