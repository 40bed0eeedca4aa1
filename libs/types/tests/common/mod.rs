//! Common Test Utilities for Vigil types
//!
//! Network entry fixtures shaped like the ones configuration files produce.

#![allow(dead_code)]

use vigil_types::NetworkEntry;

pub struct NetworkFixtures;

impl NetworkFixtures {
    pub fn ethereum() -> NetworkEntry {
        NetworkEntry {
            name: "ETHEREUM".to_string(),
            chain_id: 1,
            query_endpoints: vec![
                "https://eth.llamarpc.com".to_string(),
                "https://rpc.ankr.com/eth".to_string(),
            ],
            stream_endpoints: vec!["wss://ethereum-rpc.publicnode.com".to_string()],
            relay_endpoint: Some("https://relay.flashbots.net".to_string()),
            supports_privileged_relay: true,
        }
    }

    pub fn base() -> NetworkEntry {
        NetworkEntry {
            name: "BASE".to_string(),
            chain_id: 8453,
            query_endpoints: vec!["https://mainnet.base.org".to_string()],
            stream_endpoints: vec!["wss://base-rpc.publicnode.com".to_string()],
            relay_endpoint: None,
            supports_privileged_relay: false,
        }
    }

    /// Entry whose streaming list is empty after env expansion dropped everything
    pub fn without_stream(name: &str) -> NetworkEntry {
        NetworkEntry {
            name: name.to_string(),
            chain_id: 137,
            query_endpoints: vec!["https://polygon-rpc.com".to_string()],
            ..Default::default()
        }
    }
}
