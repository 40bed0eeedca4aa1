//! Bundle construction for relay submission

use ethers::types::U64;
use serde::Serialize;
use vigil_types::{Bytes, H256};

/// Bundle of signed transactions for atomic inclusion in one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Raw RLP-encoded signed transactions, in execution order
    pub transactions: Vec<Bytes>,
    pub target_block: u64,
    pub min_timestamp: Option<u64>,
    pub max_timestamp: Option<u64>,
    /// Transactions allowed to revert without invalidating the bundle
    pub reverting_hashes: Vec<H256>,
}

/// Builder for relay bundles
pub struct BundleBuilder {
    bundle: Bundle,
}

impl BundleBuilder {
    pub fn new(target_block: u64) -> Self {
        Self {
            bundle: Bundle {
                transactions: Vec::new(),
                target_block,
                min_timestamp: None,
                max_timestamp: None,
                reverting_hashes: Vec::new(),
            },
        }
    }

    pub fn add_transaction(mut self, raw: Bytes) -> Self {
        self.bundle.transactions.push(raw);
        self
    }

    pub fn set_timestamp_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.bundle.min_timestamp = min;
        self.bundle.max_timestamp = max;
        self
    }

    pub fn allow_reverting(mut self, tx_hash: H256) -> Self {
        self.bundle.reverting_hashes.push(tx_hash);
        self
    }

    pub fn build(self) -> Bundle {
        self.bundle
    }
}

/// `eth_callBundle` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleParams<'a> {
    pub txs: &'a [Bytes],
    pub block_number: U64,
    pub state_block_number: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// `eth_sendBundle` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendBundleParams<'a> {
    pub txs: &'a [Bytes],
    pub block_number: U64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "<[H256]>::is_empty")]
    pub reverting_tx_hashes: &'a [H256],
}

impl Bundle {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub(crate) fn call_params(&self) -> CallBundleParams<'_> {
        CallBundleParams {
            txs: &self.transactions,
            block_number: U64::from(self.target_block),
            state_block_number: "latest",
            timestamp: self.min_timestamp,
        }
    }

    pub(crate) fn send_params(&self) -> SendBundleParams<'_> {
        SendBundleParams {
            txs: &self.transactions,
            block_number: U64::from(self.target_block),
            min_timestamp: self.min_timestamp,
            max_timestamp: self.max_timestamp,
            reverting_tx_hashes: &self.reverting_hashes,
        }
    }
}
