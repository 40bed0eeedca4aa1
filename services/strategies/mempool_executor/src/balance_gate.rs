//! Reference-network balance gate
//!
//! Every event is admitted only while the operating account holds at least the
//! configured minimum on the balance-reference network. The query endpoint is
//! picked with the shared reference counter; an endpoint fault seen at counter
//! value `k` rotates the counter from `k` once, however many supervisors saw it.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};
use vigil_network::{select, ChainError, ChainResult, ErrorCategory, RotationCounter};
use vigil_types::precision::format_eth;
use vigil_types::{Address, NetworkConfig, U256};

use crate::chain::{ChainClientFactory, ChainQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Open { balance: U256 },
    /// Balance below the minimum; the event is dropped silently
    Closed { balance: U256 },
    /// Balance could not be read; no trade this round
    Unavailable { category: ErrorCategory },
}

impl GateDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open { .. })
    }
}

pub struct BalanceGate {
    reference: Arc<NetworkConfig>,
    counter: Arc<RotationCounter>,
    clients: Arc<dyn ChainClientFactory>,
    minimum: U256,
    account: Address,
    /// Client for the most recently selected endpoint
    cached: Mutex<Option<Arc<dyn ChainQuery>>>,
}

impl BalanceGate {
    pub fn new(
        reference: Arc<NetworkConfig>,
        counter: Arc<RotationCounter>,
        clients: Arc<dyn ChainClientFactory>,
        minimum: U256,
        account: Address,
    ) -> Self {
        Self {
            reference,
            counter,
            clients,
            minimum,
            account,
            cached: Mutex::new(None),
        }
    }

    fn client_for(&self, url: &str) -> ChainResult<Arc<dyn ChainQuery>> {
        let mut cached = self.cached.lock();
        if let Some(client) = cached.as_ref().filter(|c| c.endpoint() == url) {
            return Ok(Arc::clone(client));
        }
        let client = self.clients.connect(url)?;
        *cached = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Balance of `account` on the reference network.
    pub async fn check_balance(&self, account: Address) -> ChainResult<U256> {
        let observed = self.counter.current();
        let url = select(self.reference.query_endpoints(), observed).map_err(|e| {
            ChainError::InvalidEndpoint {
                url: String::new(),
                reason: e.to_string(),
            }
        })?;

        let result = match self.client_for(url) {
            Ok(client) => client.balance(account).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            if e.is_endpoint_fault() && self.counter.rotate_from(observed) {
                warn!(
                    "[{}] Balance check failed on {} ({}), rotating reference endpoint",
                    self.reference.name, url, e
                );
            }
        }
        result
    }

    /// Admit or drop one event.
    pub async fn admit(&self) -> GateDecision {
        match self.check_balance(self.account).await {
            Ok(balance) if balance >= self.minimum => GateDecision::Open { balance },
            Ok(balance) => {
                debug!(
                    "[{}] Balance {} below minimum {}",
                    self.reference.name,
                    format_eth(balance),
                    format_eth(self.minimum)
                );
                GateDecision::Closed { balance }
            }
            Err(e) => {
                debug!("[{}] Balance unavailable: {}", self.reference.name, e);
                GateDecision::Unavailable {
                    category: e.category(),
                }
            }
        }
    }
}
