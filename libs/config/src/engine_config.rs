//! Engine Configuration Module
//!
//! Layered loading: built-in defaults, then an optional TOML file, then
//! `VIGIL_`-prefixed environment variables (`__` separates nested keys, e.g.
//! `VIGIL_THRESHOLDS__GAS_LIMIT=700000`). Endpoint strings may reference
//! environment variables (`${ETH_RPC}`); entries that cannot be expanded are
//! dropped.

use anyhow::{bail, ensure, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};
use vigil_network::{
    BackoffPolicy, DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_QUERY_TIMEOUT_MS,
    DEFAULT_SUBSCRIBE_ACK_TIMEOUT_MS,
};
use vigil_types::{Address, NetworkConfig, NetworkEntry, NetworkRegistry, RegistryError};

use crate::defaults::{accounts, networks, thresholds};

/// Main engine configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Monitored networks, in startup order
    pub networks: Vec<NetworkEntry>,

    /// Network whose balance gates every event
    pub reference_network: String,

    pub thresholds: ThresholdConfig,

    /// Delay policy between a failed connection cycle and the next attempt
    pub reconnect: BackoffPolicy,

    pub timeouts: TimeoutConfig,
}

/// Execution guard thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub min_reference_balance_eth: Decimal,
    pub gas_reserve_eth: Decimal,
    pub min_margin_eth: Decimal,
    pub allocation_bps: u64,
    /// Size against borrowed capital instead of the wallet balance
    pub maximize_leverage: bool,
    pub premium_bps: u64,
    pub gas_limit: u64,
    pub fee_buffer_percent: u64,
    pub priority_fee_floor_gwei: u64,
}

/// Per-call network timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub query_timeout_ms: u64,
    pub connection_timeout_ms: u64,
    pub subscribe_ack_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            reference_network: networks::REFERENCE_NETWORK.to_string(),
            thresholds: ThresholdConfig::default(),
            reconnect: BackoffPolicy::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_reference_balance_eth: decimal(thresholds::MIN_REFERENCE_BALANCE_ETH),
            gas_reserve_eth: decimal(thresholds::GAS_RESERVE_ETH),
            min_margin_eth: decimal(thresholds::MIN_MARGIN_ETH),
            allocation_bps: thresholds::ALLOCATION_BPS,
            maximize_leverage: false,
            premium_bps: thresholds::PREMIUM_BPS,
            gas_limit: thresholds::GAS_LIMIT,
            fee_buffer_percent: thresholds::FEE_BUFFER_PERCENT,
            priority_fee_floor_gwei: thresholds::PRIORITY_FEE_FLOOR_GWEI,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            subscribe_ack_timeout_ms: DEFAULT_SUBSCRIBE_ACK_TIMEOUT_MS,
        }
    }
}

fn decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_default()
}

fn entry(
    name: &str,
    chain_id: u64,
    query: &[&str],
    stream: &[&str],
    relay: Option<&str>,
) -> NetworkEntry {
    NetworkEntry {
        name: name.to_string(),
        chain_id,
        query_endpoints: query.iter().map(|s| s.to_string()).collect(),
        stream_endpoints: stream.iter().map(|s| s.to_string()).collect(),
        relay_endpoint: relay.map(str::to_string),
        supports_privileged_relay: relay.is_some(),
    }
}

fn default_networks() -> Vec<NetworkEntry> {
    vec![
        entry(
            "ETHEREUM",
            networks::ETHEREUM_CHAIN_ID,
            networks::ETHEREUM_QUERY,
            networks::ETHEREUM_STREAM,
            Some(networks::ETHEREUM_RELAY),
        ),
        entry(
            "BASE",
            networks::BASE_CHAIN_ID,
            networks::BASE_QUERY,
            networks::BASE_STREAM,
            None,
        ),
        entry(
            "POLYGON",
            networks::POLYGON_CHAIN_ID,
            networks::POLYGON_QUERY,
            networks::POLYGON_STREAM,
            None,
        ),
        entry(
            "ARBITRUM",
            networks::ARBITRUM_CHAIN_ID,
            networks::ARBITRUM_QUERY,
            networks::ARBITRUM_STREAM,
            None,
        ),
    ]
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Endpoints are expanded and the result validated before returning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&EngineConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            info!("Loading config file: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (VIGIL_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("VIGIL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut engine: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        engine.expand_env_vars();
        engine.validate()?;
        Ok(engine)
    }

    /// Expand environment variables in endpoint strings.
    ///
    /// Unset variables and empty results drop the endpoint; a network whose
    /// list ends up empty is rejected later by [`build_registry`](Self::build_registry).
    pub fn expand_env_vars(&mut self) {
        for network in &mut self.networks {
            network.query_endpoints = expand_list(&network.name, &network.query_endpoints);
            network.stream_endpoints = expand_list(&network.name, &network.stream_endpoints);

            if let Some(relay) = network.relay_endpoint.take() {
                network.relay_endpoint = expand_endpoint(&network.name, &relay);
            }
        }
    }

    /// Validate global settings. Invalid values abort startup.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.networks.is_empty(), "no networks configured");
        ensure!(
            self.networks.iter().any(|n| n.name == self.reference_network),
            "reference network {} is not configured",
            self.reference_network
        );

        self.thresholds.validate()?;

        if let Err(reason) = self.reconnect.validate() {
            bail!("invalid reconnect policy: {reason}");
        }

        let t = &self.timeouts;
        ensure!(
            t.query_timeout_ms > 0 && t.connection_timeout_ms > 0 && t.subscribe_ack_timeout_ms > 0,
            "timeouts must be greater than 0"
        );
        Ok(())
    }

    /// Build the network registry.
    ///
    /// Networks that fail validation are skipped and returned alongside the
    /// registry. Losing the reference network is fatal.
    pub fn build_registry(&self) -> Result<(NetworkRegistry, Vec<RegistryError>)> {
        let mut valid = Vec::with_capacity(self.networks.len());
        let mut skipped = Vec::new();

        for entry in &self.networks {
            match NetworkConfig::try_from(entry.clone()) {
                Ok(network) => {
                    debug!(
                        "{}: {} query / {} stream endpoints",
                        network.name,
                        network.query_endpoints().len(),
                        network.stream_endpoints().len()
                    );
                    valid.push(network);
                }
                Err(e) => {
                    warn!("Skipping network: {}", e);
                    skipped.push(e);
                }
            }
        }

        let registry = NetworkRegistry::new(valid, self.reference_network.clone())
            .context("Failed to build network registry")?;
        Ok((registry, skipped))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_reference_balance_eth", self.min_reference_balance_eth),
            ("gas_reserve_eth", self.gas_reserve_eth),
            ("min_margin_eth", self.min_margin_eth),
        ] {
            ensure!(!value.is_sign_negative(), "{name} must not be negative");
        }

        ensure!(
            self.allocation_bps > 0 && self.allocation_bps <= 10_000,
            "allocation_bps must be in 1..=10000"
        );
        ensure!(self.premium_bps > 0, "premium_bps must be greater than 0");
        ensure!(self.gas_limit > 0, "gas_limit must be greater than 0");
        ensure!(
            (thresholds::FEE_BUFFER_PERCENT_MIN..=thresholds::FEE_BUFFER_PERCENT_MAX)
                .contains(&self.fee_buffer_percent),
            "fee_buffer_percent must be in {}..={}",
            thresholds::FEE_BUFFER_PERCENT_MIN,
            thresholds::FEE_BUFFER_PERCENT_MAX
        );
        Ok(())
    }
}

fn expand_list(network: &str, endpoints: &[String]) -> Vec<String> {
    endpoints
        .iter()
        .filter_map(|raw| expand_endpoint(network, raw))
        .collect()
}

fn expand_endpoint(network: &str, raw: &str) -> Option<String> {
    match shellexpand::env(raw) {
        Ok(expanded) => {
            let expanded = expanded.trim();
            if expanded.is_empty() {
                warn!("{}: endpoint {:?} expanded to nothing, dropping", network, raw);
                None
            } else {
                Some(expanded.to_string())
            }
        }
        Err(e) => {
            warn!("{}: dropping endpoint {:?}: {}", network, raw, e);
            None
        }
    }
}

/// Operating-account secrets. Environment only, never from files.
#[derive(Clone)]
pub struct Credentials {
    pub private_key: String,
    pub executor_address: Address,
    pub profit_recipient: Address,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"<redacted>")
            .field("executor_address", &self.executor_address)
            .field("profit_recipient", &self.profit_recipient)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var(accounts::PRIVATE_KEY_VAR).ok(),
            std::env::var(accounts::EXECUTOR_ADDRESS_VAR).ok(),
            std::env::var(accounts::PROFIT_RECIPIENT_VAR).ok(),
        )
    }

    pub fn from_values(
        private_key: Option<String>,
        executor_address: Option<String>,
        profit_recipient: Option<String>,
    ) -> Result<Self> {
        let private_key = private_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .with_context(|| format!("{} is not set", accounts::PRIVATE_KEY_VAR))?;

        let executor_address = executor_address
            .filter(|a| !a.trim().is_empty())
            .with_context(|| format!("{} is not set", accounts::EXECUTOR_ADDRESS_VAR))?;
        let executor_address = parse_address(accounts::EXECUTOR_ADDRESS_VAR, &executor_address)?;

        let profit_recipient = match profit_recipient.filter(|a| !a.trim().is_empty()) {
            Some(addr) => parse_address(accounts::PROFIT_RECIPIENT_VAR, &addr)?,
            None => parse_address("default profit recipient", accounts::DEFAULT_PROFIT_RECIPIENT)?,
        };

        Ok(Self {
            private_key,
            executor_address,
            profit_recipient,
        })
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("{name} is not a valid address: {value}"))
}
