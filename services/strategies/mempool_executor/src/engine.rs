//! Process wiring: one pipeline and one supervisor per network
//!
//! A network that cannot be built (bad endpoint, client failure) is logged
//! and skipped; the others keep running. Invalid global settings or a bad
//! key abort startup.

use anyhow::{bail, Context, Result};
use ethers::signers::{LocalWallet, Signer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};
use vigil_config::{Credentials, EngineConfig};
use vigil_network::RotationCounters;
use vigil_types::precision::{eth_to_wei, format_eth};
use vigil_types::{NetworkConfig, NetworkRegistry};

use crate::balance_gate::BalanceGate;
use crate::chain::{ChainClientFactory, EthersClientFactory};
use crate::guard::{ExecutionGuard, GuardSettings};
use crate::pipeline::EventPipeline;
use crate::signal::{HeuristicEvaluator, SignalEvaluator};
use crate::stream::{StreamConnector, WsConnector};
use crate::submission::Submission;
use crate::supervisor::{ConnectionSupervisor, SupervisorSettings};

pub struct Engine {
    config: EngineConfig,
    credentials: Credentials,
    only: Vec<String>,
}

/// Networks to supervise: all of them, or those named in `only` (case-insensitive).
pub fn selected_networks<'a>(registry: &'a NetworkRegistry, only: &[String]) -> Vec<&'a NetworkConfig> {
    registry
        .networks()
        .iter()
        .filter(|n| only.is_empty() || only.iter().any(|o| o.eq_ignore_ascii_case(&n.name)))
        .collect()
}

impl Engine {
    pub fn new(config: EngineConfig, credentials: Credentials, only: Vec<String>) -> Self {
        Self {
            config,
            credentials,
            only,
        }
    }

    pub async fn run(self) -> Result<()> {
        let (registry, skipped) = self.config.build_registry()?;
        for e in &skipped {
            log_error!("Network disabled: {}", e);
        }

        let wallet = self
            .credentials
            .private_key
            .parse::<LocalWallet>()
            .context("Invalid private key format")?;
        let account = wallet.address();

        let thresholds = &self.config.thresholds;
        let timeouts = &self.config.timeouts;
        let query_timeout = Duration::from_millis(timeouts.query_timeout_ms);

        let guard_settings = GuardSettings::from_config(
            thresholds,
            self.credentials.executor_address,
            self.credentials.profit_recipient,
        )?;
        let minimum = eth_to_wei(thresholds.min_reference_balance_eth)
            .context("Invalid min_reference_balance_eth")?;

        let reference = Arc::new(registry.reference().clone());
        let reference_clients: Arc<dyn ChainClientFactory> = Arc::new(
            EthersClientFactory::new(wallet.clone(), reference.chain_id, query_timeout)
                .context("Failed to build reference network client")?,
        );

        let names: Vec<String> = registry.networks().iter().map(|n| n.name.clone()).collect();
        let counters = RotationCounters::new(names);

        let gate = Arc::new(BalanceGate::new(
            Arc::clone(&reference),
            counters.reference(),
            reference_clients,
            minimum,
            account,
        ));
        let evaluator: Arc<dyn SignalEvaluator> = Arc::new(HeuristicEvaluator::new());
        let connector: Arc<dyn StreamConnector> = Arc::new(WsConnector);

        let settings = SupervisorSettings {
            connect_timeout: Duration::from_millis(timeouts.connection_timeout_ms),
            ack_timeout: Duration::from_millis(timeouts.subscribe_ack_timeout_ms),
            backoff: self.config.reconnect.clone(),
        };

        info!("🚀 Starting Vigil mempool executor");
        info!("   - Account: {:?}", account);
        info!("   - Profit recipient: {:?}", self.credentials.profit_recipient);
        info!(
            "   - Reference network: {} (minimum {} ETH)",
            reference.name,
            format_eth(minimum)
        );

        let mut tasks = JoinSet::new();
        for network in selected_networks(&registry, &self.only) {
            let Some(counter) = counters.network(&network.name) else {
                warn!("[{}] No rotation counter, skipping", network.name);
                continue;
            };

            let clients: Arc<dyn ChainClientFactory> =
                match EthersClientFactory::new(wallet.clone(), network.chain_id, query_timeout) {
                    Ok(factory) => Arc::new(factory),
                    Err(e) => {
                        log_error!("[{}] Startup failed: {}", network.name, e);
                        continue;
                    }
                };

            let submission = Submission::for_network(network, query_timeout);
            info!(
                "[{}] chain {} · {} query / {} stream endpoints · {} path",
                network.name,
                network.chain_id,
                network.query_endpoints().len(),
                network.stream_endpoints().len(),
                submission.path()
            );

            let pipeline = EventPipeline::new(
                network.name.clone(),
                Arc::clone(&gate),
                Arc::clone(&evaluator),
                ExecutionGuard::new(guard_settings.clone(), network.chain_id),
                submission,
            );

            let supervisor = ConnectionSupervisor::new(
                Arc::new(network.clone()),
                counter,
                Arc::clone(&connector),
                clients,
                Arc::new(pipeline),
                settings.clone(),
            );

            let name = network.name.clone();
            tasks.spawn(async move { (name, supervisor.run().await) });
        }

        if tasks.is_empty() {
            bail!("no networks to monitor");
        }

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping {} supervisors", tasks.len());
                    tasks.abort_all();
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((name, exit))) => {
                        log_warning!("[{}] Supervisor stopped: {:?}", name, exit);
                    }
                    Some(Err(e)) => {
                        log_error!("Supervisor task failed: {}", e);
                    }
                    None => {
                        warn!("All networks unavailable, exiting");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
