//! # Execution Guard - Zero-Cost Abort Protocol
//!
//! Turns a signal into a conditionally submitted transaction:
//!
//! ```text
//! balance → [reserve check] → fee data → [sizing] → [cost / profit check] → intent → Submission
//!    ↓            ↓                           ↓              ↓                         ↓
//! query fail   below reserve              leverage?    insufficient / unprofitable   simulate first
//! ```
//!
//! Every branch that cannot clear returns [`ExecutionOutcome::Aborted`] before
//! anything fee-bearing is broadcast. All amounts are integer wei.

use anyhow::{Context, Result};
use ethers::abi::{encode, Token};
use ethers::utils::id;
use std::fmt;
use vigil_config::ThresholdConfig;
use vigil_network::ChainError;
use vigil_types::precision::{
    apply_bps, apply_bps_ceil, apply_percent, eth_to_wei, format_eth, gwei_to_wei, BPS_DENOMINATOR,
};
use vigil_types::{
    Address, Bytes, CostEstimate, EventSignal, ExecutionPath, FeeData, GasParams, TradeIntent, H256,
    U256,
};

use crate::chain::ChainQuery;
use crate::submission::Submission;

/// Executor contract entry point: `executeFlashTrade(uint256 size, address recipient)`
pub const EXECUTE_SIGNATURE: &str = "executeFlashTrade(uint256,address)";

/// Guard parameters in wei, derived once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSettings {
    pub gas_reserve: U256,
    pub min_margin: U256,
    pub allocation_bps: u64,
    pub maximize_leverage: bool,
    pub premium_bps: u64,
    pub gas_limit: U256,
    pub fee_buffer_percent: u64,
    pub priority_fee_floor: U256,
    pub executor: Address,
    pub profit_recipient: Address,
}

impl GuardSettings {
    pub fn from_config(
        thresholds: &ThresholdConfig,
        executor: Address,
        profit_recipient: Address,
    ) -> Result<Self> {
        Ok(Self {
            gas_reserve: eth_to_wei(thresholds.gas_reserve_eth).context("Invalid gas_reserve_eth")?,
            min_margin: eth_to_wei(thresholds.min_margin_eth).context("Invalid min_margin_eth")?,
            allocation_bps: thresholds.allocation_bps,
            maximize_leverage: thresholds.maximize_leverage,
            premium_bps: thresholds.premium_bps,
            gas_limit: U256::from(thresholds.gas_limit),
            fee_buffer_percent: thresholds.fee_buffer_percent,
            priority_fee_floor: gwei_to_wei(thresholds.priority_fee_floor_gwei),
            executor,
            profit_recipient,
        })
    }
}

/// Why a candidate trade was abandoned. None of these spend anything.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    BelowGasReserve { balance: U256 },
    InsufficientForCost { available: U256, total: U256 },
    Unprofitable { expected_gain: U256, required: U256 },
    SimulationFailed(String),
    EstimationFailed(String),
    QueryFailed(ChainError),
    SubmissionFailed(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::BelowGasReserve { balance } => {
                write!(f, "balance {} below gas reserve", format_eth(*balance))
            }
            AbortReason::InsufficientForCost { available, total } => write!(
                f,
                "available {} < total cost {}",
                format_eth(*available),
                format_eth(*total)
            ),
            AbortReason::Unprofitable {
                expected_gain,
                required,
            } => write!(
                f,
                "expected gain {} < required {}",
                format_eth(*expected_gain),
                format_eth(*required)
            ),
            AbortReason::SimulationFailed(reason) => write!(f, "simulation failed: {reason}"),
            AbortReason::EstimationFailed(reason) => write!(f, "estimation failed: {reason}"),
            AbortReason::QueryFailed(e) => write!(f, "query failed: {e}"),
            AbortReason::SubmissionFailed(reason) => write!(f, "submission failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// `reference` is the bundle hash (relayed) or transaction hash (direct)
    Submitted { path: ExecutionPath, reference: H256 },
    Aborted(AbortReason),
}

impl ExecutionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ExecutionOutcome::Submitted { .. })
    }
}

/// Fee per unit with the multiplicative buffer applied
pub fn buffered_fee(fee_per_unit: U256, buffer_percent: u64) -> U256 {
    apply_percent(fee_per_unit, buffer_percent)
}

pub fn gas_cost(gas_limit: U256, fee_per_unit: U256) -> U256 {
    gas_limit.saturating_mul(fee_per_unit)
}

/// Default size is a share of the available balance. In leverage mode the
/// size is the borrowable amount whose premium the gas-adjusted balance can
/// cover, adopted only when it exceeds the default.
pub fn trade_size(available: U256, gas_cost: U256, settings: &GuardSettings) -> U256 {
    let default_size = apply_bps(available, settings.allocation_bps);
    if !settings.maximize_leverage || available <= gas_cost || settings.premium_bps == 0 {
        return default_size;
    }

    let leverage_size = (available - gas_cost).saturating_mul(U256::from(BPS_DENOMINATOR))
        / U256::from(settings.premium_bps);
    default_size.max(leverage_size)
}

/// Gas cost plus the borrowed-capital premium, rounded up
pub fn total_cost(gas_cost: U256, size: U256, premium_bps: u64) -> CostEstimate {
    CostEstimate::new(gas_cost, apply_bps_ceil(size, premium_bps))
}

/// `max(floor, observed)`, never above the buffered max fee
pub fn priority_fee(floor: U256, observed: U256, max_fee: U256) -> U256 {
    floor.max(observed).min(max_fee)
}

pub fn encode_calldata(size: U256, recipient: Address) -> Bytes {
    let mut data = id(EXECUTE_SIGNATURE).to_vec();
    data.extend(encode(&[Token::Uint(size), Token::Address(recipient)]));
    Bytes::from(data)
}

pub struct ExecutionGuard {
    settings: GuardSettings,
    chain_id: u64,
}

impl ExecutionGuard {
    pub fn new(settings: GuardSettings, chain_id: u64) -> Self {
        Self { settings, chain_id }
    }

    /// Size, cost and build an intent for `signal`, or explain why not.
    pub async fn prepare(
        &self,
        chain: &dyn ChainQuery,
        path: ExecutionPath,
        signal: &EventSignal,
    ) -> std::result::Result<TradeIntent, AbortReason> {
        let s = &self.settings;

        let balance = chain
            .balance(chain.account())
            .await
            .map_err(AbortReason::QueryFailed)?;
        if balance < s.gas_reserve {
            return Err(AbortReason::BelowGasReserve { balance });
        }
        let available = balance - s.gas_reserve;

        let fees = chain.fee_data().await.map_err(AbortReason::QueryFailed)?;
        let fee_per_unit = buffered_fee(fees.fee_per_unit(), s.fee_buffer_percent);
        let gas = gas_cost(s.gas_limit, fee_per_unit);

        let size = trade_size(available, gas, s);
        let cost = total_cost(gas, size, s.premium_bps);
        if available < cost.total() {
            return Err(AbortReason::InsufficientForCost {
                available,
                total: cost.total(),
            });
        }

        let expected_gain = apply_bps(size, signal.magnitude_bps());
        let required = cost.total().saturating_add(s.min_margin);
        if expected_gain < required {
            return Err(AbortReason::Unprofitable {
                expected_gain,
                required,
            });
        }

        let priority = match fees {
            FeeData::Eip1559 {
                max_priority_fee_per_gas,
                ..
            } => Some(priority_fee(
                s.priority_fee_floor,
                max_priority_fee_per_gas,
                fee_per_unit,
            )),
            FeeData::Legacy { .. } => None,
        };

        Ok(TradeIntent {
            chain_id: self.chain_id,
            to: s.executor,
            value: cost.premium,
            calldata: encode_calldata(size, s.profit_recipient),
            trade_size: size,
            gas: GasParams {
                gas_limit: s.gas_limit,
                fee_per_unit,
                priority_fee: priority,
            },
            path,
        })
    }

    /// Full guarded attempt: prepare, then simulate and submit through `submission`.
    pub async fn attempt(
        &self,
        chain: &dyn ChainQuery,
        submission: &Submission,
        signal: &EventSignal,
    ) -> ExecutionOutcome {
        match self.prepare(chain, submission.path(), signal).await {
            Ok(intent) => submission.submit(chain, &intent).await,
            Err(reason) => ExecutionOutcome::Aborted(reason),
        }
    }
}
