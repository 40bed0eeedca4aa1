//! Flashbots relay client
//!
//! JSON-RPC over HTTPS. Every request carries an `X-Flashbots-Signature`
//! header: the auth key's address and its EIP-191 signature over the hex
//! keccak hash of the request body. The auth key only identifies the searcher
//! to the relay and never holds funds.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::keccak256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use vigil_types::H256;

use crate::{Bundle, BundleRelay, RelayError};

pub const FLASHBOTS_SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Outcome of `eth_callBundle`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Relay-level rejection of the whole simulation
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub bundle_hash: Option<H256>,
    #[serde(default)]
    pub total_gas_used: Option<u64>,
    #[serde(default)]
    pub results: Vec<SimulatedTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedTransaction {
    #[serde(default)]
    pub tx_hash: Option<H256>,
    #[serde(default)]
    pub gas_used: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub revert: Option<String>,
}

impl SimulationReport {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// First reason this bundle must not be submitted, if any.
    pub fn failure(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if self.results.is_empty() {
            return Some("simulation returned no results".to_string());
        }
        self.results.iter().find_map(|tx| {
            tx.error
                .as_ref()
                .or(tx.revert.as_ref())
                .map(|reason| format!("transaction reverted: {reason}"))
        })
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }
}

/// Result of `eth_sendBundle`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleReceipt {
    pub bundle_hash: H256,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: [P; 1],
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Client for Flashbots relay interaction
pub struct FlashbotsClient {
    http: reqwest::Client,
    relay_url: String,
    auth: LocalWallet,
    timeout: Duration,
    next_id: AtomicU64,
}

impl FlashbotsClient {
    pub fn new(relay_url: impl Into<String>, auth: LocalWallet, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url: relay_url.into(),
            auth,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    /// Client with a throwaway auth identity
    pub fn with_random_auth(relay_url: impl Into<String>, timeout: Duration) -> Self {
        let auth = LocalWallet::new(&mut ethers::core::rand::thread_rng());
        Self::new(relay_url, auth, timeout)
    }

    pub fn auth_address(&self) -> ethers::types::Address {
        self.auth.address()
    }

    async fn signature_header(&self, body: &str) -> Result<String, RelayError> {
        let digest = format!("0x{}", hex::encode(keccak256(body.as_bytes())));
        let signature = self
            .auth
            .sign_message(digest)
            .await
            .map_err(|e| RelayError::Signing(e.to_string()))?;
        Ok(format!("{:?}:0x{}", self.auth.address(), signature))
    }

    async fn request<P, T>(&self, method: &str, params: P) -> Result<Result<T, JsonRpcError>, RelayError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: [params],
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| RelayError::InvalidResponse(format!("failed to encode request: {e}")))?;
        let signature = self.signature_header(&body).await?;

        debug!("{} -> {}", method, self.relay_url);

        let response = self
            .http
            .post(&self.relay_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(FLASHBOTS_SIGNATURE_HEADER, signature)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            // Relays report JSON-RPC errors with 4xx codes; surface the envelope when present.
            if let Ok(envelope) = serde_json::from_str::<JsonRpcResponse<T>>(&text) {
                if let Some(error) = envelope.error {
                    return Ok(Err(error));
                }
            }
            return Err(RelayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: JsonRpcResponse<T> = serde_json::from_str(&text)
            .map_err(|e| RelayError::InvalidResponse(format!("{e}: {text}")))?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Ok(Err(error)),
            (Some(result), None) => Ok(Ok(result)),
            (None, None) => Err(RelayError::InvalidResponse(
                "response carries neither result nor error".to_string(),
            )),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RelayError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl BundleRelay for FlashbotsClient {
    async fn simulate(&self, bundle: &Bundle) -> Result<SimulationReport, RelayError> {
        match self
            .request::<_, SimulationReport>("eth_callBundle", bundle.call_params())
            .await?
        {
            Ok(report) => Ok(report),
            Err(error) => Ok(SimulationReport::rejected(format!(
                "{} (code {})",
                error.message, error.code
            ))),
        }
    }

    async fn send_bundle(&self, bundle: &Bundle) -> Result<BundleReceipt, RelayError> {
        self.request::<_, BundleReceipt>("eth_sendBundle", bundle.send_params())
            .await?
            .map_err(|error| RelayError::Rpc {
                code: error.code,
                message: error.message,
            })
    }
}
