//! Cost estimates and trade intents built by the execution guard

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee data reported by a query endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeData {
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    Legacy {
        gas_price: U256,
    },
}

impl FeeData {
    /// Per-unit fee used for cost estimation (max fee, or gas price on legacy chains)
    pub fn fee_per_unit(&self) -> U256 {
        match self {
            FeeData::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
            FeeData::Legacy { gas_price } => *gas_price,
        }
    }

    pub fn priority_fee(&self) -> Option<U256> {
        match self {
            FeeData::Eip1559 {
                max_priority_fee_per_gas,
                ..
            } => Some(*max_priority_fee_per_gas),
            FeeData::Legacy { .. } => None,
        }
    }
}

/// Cost of one candidate trade. Recomputed per event, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    pub gas_cost: U256,
    pub premium: U256,
}

impl CostEstimate {
    pub fn new(gas_cost: U256, premium: U256) -> Self {
        Self { gas_cost, premium }
    }

    pub fn total(&self) -> U256 {
        self.gas_cost.saturating_add(self.premium)
    }
}

/// Gas parameters of a trade intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub gas_limit: U256,
    /// Max fee per gas (EIP-1559) or gas price (legacy), already buffered
    pub fee_per_unit: U256,
    /// `None` selects a legacy transaction
    pub priority_fee: Option<U256>,
}

/// How an intent reaches the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionPath {
    /// Simulated and submitted as a bundle through a privileged relay
    Relayed,
    /// Gas-estimated and broadcast through the query endpoint
    Direct,
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPath::Relayed => write!(f, "relayed"),
            ExecutionPath::Direct => write!(f, "direct"),
        }
    }
}

/// A transaction the guard has cleared for simulation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeIntent {
    pub chain_id: u64,
    /// External executor contract
    pub to: Address,
    /// Borrowed-capital premium sent with the call
    pub value: U256,
    /// Encoded `executeFlashTrade(size, recipient)`
    pub calldata: Bytes,
    /// Notional trade size encoded in `calldata`
    pub trade_size: U256,
    pub gas: GasParams,
    pub path: ExecutionPath,
}

impl TradeIntent {
    /// Upper bound on the fee this intent can burn
    pub fn max_gas_cost(&self) -> U256 {
        self.gas.gas_limit.saturating_mul(self.gas.fee_per_unit)
    }
}
