//! # Vigil Types Library
//!
//! Shared domain types for every Vigil crate.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: balances, fees and premiums are `U256` wei, never floats
//! - **Immutable Registry**: [`NetworkConfig`] is validated once at startup and never mutated
//! - **Ephemeral Trade Data**: [`CostEstimate`] and [`TradeIntent`] live for one event only
//!
//! ## Quick Start
//!
//! ```rust
//! use vigil_types::{NetworkConfig, precision};
//! use rust_decimal_macros::dec;
//!
//! let base = NetworkConfig::new(
//!     "BASE",
//!     8453,
//!     vec!["https://mainnet.base.org".to_string()],
//!     vec!["wss://base.publicnode.com".to_string()],
//!     None,
//!     false,
//! )?;
//! assert_eq!(base.chain_id, 8453);
//!
//! let threshold = precision::eth_to_wei(dec!(0.005))?;
//! assert_eq!(threshold.as_u64(), 5_000_000_000_000_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod network;
pub mod precision;
pub mod signal;
pub mod trade;

pub use network::{NetworkConfig, NetworkEntry, NetworkRegistry, RegistryError};
pub use precision::PrecisionError;
pub use signal::{EventSignal, SignalAction};
pub use trade::{CostEstimate, ExecutionPath, FeeData, GasParams, TradeIntent};

pub use ethers::types::{Address, Bytes, H256, U256};
