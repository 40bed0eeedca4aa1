//! Wei-precision conversions and basis-point arithmetic
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT** for balances, fees or premiums: everything is `U256` wei
//! 2. **Explicit Rounding**: [`apply_bps`] floors, [`apply_bps_ceil`] ceils; costs use the ceiling
//! 3. **Config Amounts**: human-readable ETH values arrive as `Decimal` and are converted once

use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};
use rust_decimal::Decimal;
use thiserror::Error;

/// 100% expressed in basis points
pub const BPS_DENOMINATOR: u64 = 10_000;

/// 1 gwei in wei
pub const GWEI: u64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum PrecisionError {
    #[error("Negative amount not allowed: {0}")]
    Negative(Decimal),

    #[error("Amount {value} is not representable in wei: {reason}")]
    Unrepresentable { value: Decimal, reason: String },
}

/// Convert an ETH-denominated decimal (e.g. `0.005`) to wei.
pub fn eth_to_wei(value: Decimal) -> Result<U256, PrecisionError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PrecisionError::Negative(value));
    }

    parse_ether(value.normalize().to_string()).map_err(|e| PrecisionError::Unrepresentable {
        value,
        reason: e.to_string(),
    })
}

pub fn gwei_to_wei(gwei: u64) -> U256 {
    U256::from(gwei) * U256::from(GWEI)
}

/// Human-readable ETH amount for log lines.
pub fn format_eth(wei: U256) -> String {
    format_ether(wei)
}

/// `amount × bps / 10_000`, rounded down.
pub fn apply_bps(amount: U256, bps: u64) -> U256 {
    amount.saturating_mul(U256::from(bps)) / U256::from(BPS_DENOMINATOR)
}

/// `amount × bps / 10_000`, rounded up.
pub fn apply_bps_ceil(amount: U256, bps: u64) -> U256 {
    let numerator = amount.saturating_mul(U256::from(bps));
    let denominator = U256::from(BPS_DENOMINATOR);
    let (quotient, remainder) = numerator.div_mod(denominator);
    if remainder.is_zero() {
        quotient
    } else {
        quotient.saturating_add(U256::one())
    }
}

/// `amount × percent / 100`, rounded down. Used for fee buffers (120 = 1.2×).
pub fn apply_percent(amount: U256, percent: u64) -> U256 {
    amount.saturating_mul(U256::from(percent)) / U256::from(100u64)
}
