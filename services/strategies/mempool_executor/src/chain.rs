//! # Query Endpoint Client
//!
//! Everything the executor asks of a chain goes through [`ChainQuery`]:
//! balance, fee data, block height, gas estimation, signing and raw
//! broadcast. [`EthersChainClient`] is the JSON-RPC over HTTP implementation.
//!
//! Each call is bounded by a timeout, and every failure is mapped to a
//! [`ChainError`] here, at its origin, so callers branch on
//! [`ChainError::category`] instead of message text.

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;
use vigil_network::{ChainError, ChainResult};
use vigil_types::{FeeData, TradeIntent};

#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// URL this client talks to
    fn endpoint(&self) -> &str;

    /// Operating account used for balance checks and signing
    fn account(&self) -> Address;

    async fn balance(&self, account: Address) -> ChainResult<U256>;

    async fn fee_data(&self) -> ChainResult<FeeData>;

    async fn block_number(&self) -> ChainResult<u64>;

    /// `eth_estimateGas`; an `Err` means the transaction would not succeed.
    async fn estimate_gas(&self, intent: &TradeIntent) -> ChainResult<U256>;

    /// Sign `intent` with the next pending nonce, returning the raw transaction.
    async fn sign(&self, intent: &TradeIntent) -> ChainResult<Bytes>;

    async fn send_raw(&self, raw: Bytes) -> ChainResult<H256>;
}

/// Builds a query client for one endpoint URL
pub trait ChainClientFactory: Send + Sync {
    fn connect(&self, url: &str) -> ChainResult<Arc<dyn ChainQuery>>;
}

/// Classify a provider failure where it happens.
///
/// A JSON-RPC error object is categorised by code and message. Anything
/// without one (HTTP failure, refused connection, garbage body) is an
/// endpoint problem.
pub fn map_provider_error(operation: &'static str, err: ProviderError) -> ChainError {
    if let Some(response) = RpcError::as_error_response(&err) {
        return ChainError::from_rpc(operation, response.code, &response.message);
    }

    match err {
        ProviderError::JsonRpcClientError(_)
        | ProviderError::HTTPError(_)
        | ProviderError::SerdeJson(_) => ChainError::unavailable(operation, err.to_string()),
        other => ChainError::rejected(operation, other.to_string()),
    }
}

/// JSON-RPC over HTTP client with per-call timeouts
pub struct EthersChainClient {
    endpoint: String,
    provider: Provider<Http>,
    wallet: LocalWallet,
    timeout: Duration,
}

impl EthersChainClient {
    pub fn new(
        endpoint: &str,
        http: reqwest::Client,
        wallet: LocalWallet,
        timeout: Duration,
    ) -> ChainResult<Self> {
        let url: Url = endpoint.parse().map_err(|e: url::ParseError| ChainError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let provider = Provider::new(Http::new_with_client(url, http));

        Ok(Self {
            endpoint: endpoint.to_string(),
            provider,
            wallet,
            timeout,
        })
    }

    async fn call<T, F>(&self, operation: &'static str, request: F) -> ChainResult<T>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        match timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_provider_error(operation, e)),
            Err(_) => Err(ChainError::timeout(operation, self.timeout.as_millis() as u64)),
        }
    }

    fn typed_transaction(&self, intent: &TradeIntent) -> TypedTransaction {
        let from = self.wallet.address();
        match intent.gas.priority_fee {
            Some(priority_fee) => Eip1559TransactionRequest::new()
                .from(from)
                .to(intent.to)
                .value(intent.value)
                .data(intent.calldata.clone())
                .gas(intent.gas.gas_limit)
                .max_fee_per_gas(intent.gas.fee_per_unit)
                .max_priority_fee_per_gas(priority_fee)
                .chain_id(intent.chain_id)
                .into(),
            None => TransactionRequest::new()
                .from(from)
                .to(intent.to)
                .value(intent.value)
                .data(intent.calldata.clone())
                .gas(intent.gas.gas_limit)
                .gas_price(intent.gas.fee_per_unit)
                .chain_id(intent.chain_id)
                .into(),
        }
    }
}

#[async_trait]
impl ChainQuery for EthersChainClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn account(&self) -> Address {
        self.wallet.address()
    }

    async fn balance(&self, account: Address) -> ChainResult<U256> {
        self.call("get_balance", self.provider.get_balance(account, None))
            .await
    }

    async fn fee_data(&self) -> ChainResult<FeeData> {
        match self
            .call("estimate_eip1559_fees", self.provider.estimate_eip1559_fees(None))
            .await
        {
            Ok((max_fee_per_gas, max_priority_fee_per_gas)) => Ok(FeeData::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            }),
            // Chains without fee history fall back to the legacy gas price
            Err(e) if !e.is_transient() => {
                debug!("{}: EIP-1559 fees unavailable ({}), using gas price", self.endpoint, e);
                let gas_price = self
                    .call("get_gas_price", self.provider.get_gas_price())
                    .await?;
                Ok(FeeData::Legacy { gas_price })
            }
            Err(e) => Err(e),
        }
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.call("get_block_number", self.provider.get_block_number())
            .await
            .map(|n| n.as_u64())
    }

    async fn estimate_gas(&self, intent: &TradeIntent) -> ChainResult<U256> {
        let tx = self.typed_transaction(intent);
        self.call("estimate_gas", self.provider.estimate_gas(&tx, None))
            .await
    }

    async fn sign(&self, intent: &TradeIntent) -> ChainResult<Bytes> {
        let mut tx = self.typed_transaction(intent);
        let nonce = self
            .call(
                "get_transaction_count",
                self.provider
                    .get_transaction_count(self.wallet.address(), Some(BlockNumber::Pending.into())),
            )
            .await?;
        tx.set_nonce(nonce);

        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(tx.rlp_signed(&signature))
    }

    async fn send_raw(&self, raw: Bytes) -> ChainResult<H256> {
        let pending = self
            .call("send_raw_transaction", self.provider.send_raw_transaction(raw))
            .await?;
        Ok(pending.tx_hash())
    }
}

/// Factory sharing one pooled HTTP client and signing key across endpoints
#[derive(Clone)]
pub struct EthersClientFactory {
    http: reqwest::Client,
    wallet: LocalWallet,
    timeout: Duration,
}

impl EthersClientFactory {
    /// `wallet` is bound to `chain_id` for EIP-155 signatures.
    pub fn new(wallet: LocalWallet, chain_id: u64, timeout: Duration) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60)) // Keep connections alive
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ChainError::unavailable("build_http_client", e.to_string()))?;

        Ok(Self {
            http,
            wallet: wallet.with_chain_id(chain_id),
            timeout,
        })
    }
}

impl ChainClientFactory for EthersClientFactory {
    fn connect(&self, url: &str) -> ChainResult<Arc<dyn ChainQuery>> {
        let client = EthersChainClient::new(url, self.http.clone(), self.wallet.clone(), self.timeout)?;
        Ok(Arc::new(client))
    }
}
