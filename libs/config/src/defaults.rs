//! Default configuration values
//!
//! Built-in values used when neither the config file nor the environment
//! overrides them.

/// Network defaults. The first entry of each endpoint list is an
/// environment placeholder for a private endpoint; the rest are public.
pub mod networks {
    pub const REFERENCE_NETWORK: &str = "BASE";

    pub const ETHEREUM_CHAIN_ID: u64 = 1;
    pub const ETHEREUM_QUERY: &[&str] = &[
        "${ETH_RPC}",
        "https://eth.llamarpc.com",
        "https://rpc.ankr.com/eth",
    ];
    pub const ETHEREUM_STREAM: &[&str] = &[
        "${ETH_WSS}",
        "wss://eth.llamarpc.com",
        "wss://ethereum.publicnode.com",
    ];
    pub const ETHEREUM_RELAY: &str = "https://relay.flashbots.net";

    pub const BASE_CHAIN_ID: u64 = 8453;
    pub const BASE_QUERY: &[&str] = &[
        "${BASE_RPC}",
        "https://mainnet.base.org",
        "https://base.llamarpc.com",
    ];
    pub const BASE_STREAM: &[&str] = &[
        "${BASE_WSS}",
        "wss://base.publicnode.com",
        "wss://base-rpc.publicnode.com",
    ];

    pub const POLYGON_CHAIN_ID: u64 = 137;
    pub const POLYGON_QUERY: &[&str] = &[
        "${POLYGON_RPC}",
        "https://polygon-rpc.com",
        "https://rpc-mainnet.maticvigil.com",
    ];
    pub const POLYGON_STREAM: &[&str] = &["${POLYGON_WSS}", "wss://polygon-bor-rpc.publicnode.com"];

    pub const ARBITRUM_CHAIN_ID: u64 = 42161;
    pub const ARBITRUM_QUERY: &[&str] = &[
        "${ARBITRUM_RPC}",
        "https://arb1.arbitrum.io/rpc",
        "https://arbitrum.llamarpc.com",
    ];
    pub const ARBITRUM_STREAM: &[&str] = &["${ARBITRUM_WSS}", "wss://arbitrum-one.publicnode.com"];
}

/// Execution guard defaults (ETH amounts as decimal strings)
pub mod thresholds {
    /// Minimum balance on the reference network before any event is evaluated
    pub const MIN_REFERENCE_BALANCE_ETH: &str = "0.005";

    /// Balance never committed to a trade
    pub const GAS_RESERVE_ETH: &str = "0.015";

    /// Required expected gain above total cost
    pub const MIN_MARGIN_ETH: &str = "0.005";

    /// Share of available balance used as the default size
    pub const ALLOCATION_BPS: u64 = 10_000;

    /// Borrowed-capital premium (0.09%)
    pub const PREMIUM_BPS: u64 = 9;

    pub const GAS_LIMIT: u64 = 650_000;

    /// Multiplier applied to the observed fee (percent)
    pub const FEE_BUFFER_PERCENT: u64 = 120;
    pub const FEE_BUFFER_PERCENT_MIN: u64 = 100;
    pub const FEE_BUFFER_PERCENT_MAX: u64 = 150;

    pub const PRIORITY_FEE_FLOOR_GWEI: u64 = 7;
}

/// Account defaults
pub mod accounts {
    pub const DEFAULT_PROFIT_RECIPIENT: &str = "0x458f94e935f829DCAD18Ae0A18CA5C3E223B71DE";

    pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
    pub const EXECUTOR_ADDRESS_VAR: &str = "EXECUTOR_ADDRESS";
    pub const PROFIT_RECIPIENT_VAR: &str = "PROFIT_RECIPIENT";
}
