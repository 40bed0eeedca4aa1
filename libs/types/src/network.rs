//! Static description of monitored networks

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry construction failures. Each one disables a single network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("network {network}: no query endpoints configured")]
    NoQueryEndpoints { network: String },

    #[error("network {network}: no streaming endpoints configured")]
    NoStreamEndpoints { network: String },

    #[error("balance reference network {network} is not in the registry")]
    UnknownReference { network: String },

    #[error("duplicate network name {network}")]
    DuplicateNetwork { network: String },
}

/// Immutable per-network configuration.
///
/// Both endpoint lists are guaranteed non-empty; the only way to build one is
/// [`NetworkConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    query_endpoints: Vec<String>,
    stream_endpoints: Vec<String>,
    pub relay_endpoint: Option<String>,
    pub supports_privileged_relay: bool,
}

impl NetworkConfig {
    pub fn new(
        name: impl Into<String>,
        chain_id: u64,
        query_endpoints: Vec<String>,
        stream_endpoints: Vec<String>,
        relay_endpoint: Option<String>,
        supports_privileged_relay: bool,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if query_endpoints.is_empty() {
            return Err(RegistryError::NoQueryEndpoints { network: name });
        }
        if stream_endpoints.is_empty() {
            return Err(RegistryError::NoStreamEndpoints { network: name });
        }

        Ok(Self {
            name,
            chain_id,
            query_endpoints,
            stream_endpoints,
            relay_endpoint,
            supports_privileged_relay,
        })
    }

    pub fn query_endpoints(&self) -> &[String] {
        &self.query_endpoints
    }

    pub fn stream_endpoints(&self) -> &[String] {
        &self.stream_endpoints
    }

    /// Relay URI when this network submits through a privileged relay.
    pub fn privileged_relay(&self) -> Option<&str> {
        if self.supports_privileged_relay {
            self.relay_endpoint.as_deref()
        } else {
            None
        }
    }
}

/// Process-wide, read-only set of networks plus the balance-reference network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
    reference: String,
}

impl NetworkRegistry {
    pub fn new(
        networks: Vec<NetworkConfig>,
        reference: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let reference = reference.into();

        for (i, network) in networks.iter().enumerate() {
            if networks[..i].iter().any(|n| n.name == network.name) {
                return Err(RegistryError::DuplicateNetwork {
                    network: network.name.clone(),
                });
            }
        }

        if !networks.iter().any(|n| n.name == reference) {
            return Err(RegistryError::UnknownReference { network: reference });
        }

        Ok(Self {
            networks,
            reference,
        })
    }

    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }

    pub fn get(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.name == name)
    }

    /// Network whose balance gates every event.
    pub fn reference(&self) -> &NetworkConfig {
        // Checked in `new`.
        self.get(&self.reference)
            .unwrap_or_else(|| &self.networks[0])
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Raw, unvalidated form used by configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkEntry {
    pub name: String,
    pub chain_id: u64,
    pub query_endpoints: Vec<String>,
    pub stream_endpoints: Vec<String>,
    pub relay_endpoint: Option<String>,
    pub supports_privileged_relay: bool,
}

impl TryFrom<NetworkEntry> for NetworkConfig {
    type Error = RegistryError;

    fn try_from(entry: NetworkEntry) -> Result<Self, Self::Error> {
        NetworkConfig::new(
            entry.name,
            entry.chain_id,
            entry.query_endpoints,
            entry.stream_endpoints,
            entry.relay_endpoint,
            entry.supports_privileged_relay,
        )
    }
}
