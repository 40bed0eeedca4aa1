//! Common test doubles for the executor integration tests
//!
//! Scripted chain clients, relays, stream connectors, sinks and evaluators.
//! Every double counts its calls so tests can assert that guarded operations
//! never happened.

#![allow(dead_code)]

use async_trait::async_trait;
use mev::{Bundle, BundleReceipt, BundleRelay, RelayError, SimulationReport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Barrier};
use tokio::time::Instant;
use vigil_mempool_executor::{
    ChainClientFactory, ChainQuery, EventSink, SignalEvaluator, StreamConnector, StreamError,
    StreamSession,
};
use vigil_network::{ChainError, ChainResult};
use vigil_types::{
    Address, Bytes, EventSignal, FeeData, NetworkConfig, SignalAction, TradeIntent, H256, U256,
};

pub const ETH: u64 = 1_000_000_000_000_000_000;
pub const GWEI: u64 = 1_000_000_000;

/// `milli` thousandths of an ETH in wei
pub fn milli_eth(milli: u64) -> U256 {
    U256::from(milli) * U256::from(ETH / 1_000)
}

pub fn gwei(n: u64) -> U256 {
    U256::from(n) * U256::from(GWEI)
}

pub fn urls(prefix: &str, names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("{prefix}{n}")).collect()
}

pub fn network(name: &str, query: &[&str], stream: &[&str]) -> NetworkConfig {
    NetworkConfig::new(
        name,
        1,
        urls("https://", query),
        urls("wss://", stream),
        None,
        false,
    )
    .unwrap()
}

#[derive(Debug, Default)]
pub struct CallCounts {
    pub balance: AtomicUsize,
    pub fee_data: AtomicUsize,
    pub block_number: AtomicUsize,
    pub estimate_gas: AtomicUsize,
    pub sign: AtomicUsize,
    pub send_raw: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        [
            &self.balance,
            &self.fee_data,
            &self.block_number,
            &self.estimate_gas,
            &self.sign,
            &self.send_raw,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

/// Scripted query client
pub struct MockChain {
    pub endpoint: String,
    pub account: Address,
    pub balance: Mutex<ChainResult<U256>>,
    pub fees: Mutex<ChainResult<FeeData>>,
    pub block: u64,
    pub estimate: Mutex<ChainResult<U256>>,
    pub tx_hash: H256,
    pub calls: CallCounts,
    pub last_intent: Mutex<Option<TradeIntent>>,
    /// When set, every balance call waits here before answering
    pub balance_barrier: Mutex<Option<Arc<Barrier>>>,
    pub send_error: Mutex<Option<ChainError>>,
}

impl MockChain {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            account: Address::repeat_byte(0xaa),
            balance: Mutex::new(Ok(U256::zero())),
            fees: Mutex::new(Ok(FeeData::Eip1559 {
                max_fee_per_gas: gwei(30),
                max_priority_fee_per_gas: gwei(2),
            })),
            block: 1_000,
            estimate: Mutex::new(Ok(U256::from(400_000u64))),
            tx_hash: H256::repeat_byte(0x77),
            calls: CallCounts::default(),
            last_intent: Mutex::new(None),
            balance_barrier: Mutex::new(None),
            send_error: Mutex::new(None),
        }
    }

    pub fn with_balance(self, balance: U256) -> Self {
        *self.balance.lock() = Ok(balance);
        self
    }

    pub fn with_balance_error(self, error: ChainError) -> Self {
        *self.balance.lock() = Err(error);
        self
    }

    pub fn with_fees(self, fees: FeeData) -> Self {
        *self.fees.lock() = Ok(fees);
        self
    }

    pub fn with_estimate(self, estimate: ChainResult<U256>) -> Self {
        *self.estimate.lock() = estimate;
        self
    }

    pub fn with_balance_barrier(self, barrier: Arc<Barrier>) -> Self {
        *self.balance_barrier.lock() = Some(barrier);
        self
    }

    pub fn with_send_error(self, error: ChainError) -> Self {
        *self.send_error.lock() = Some(error);
        self
    }

    pub fn intent(&self) -> Option<TradeIntent> {
        self.last_intent.lock().clone()
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn account(&self) -> Address {
        self.account
    }

    async fn balance(&self, _account: Address) -> ChainResult<U256> {
        self.calls.balance.fetch_add(1, Ordering::SeqCst);
        let barrier = self.balance_barrier.lock().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        self.balance.lock().clone()
    }

    async fn fee_data(&self) -> ChainResult<FeeData> {
        self.calls.fee_data.fetch_add(1, Ordering::SeqCst);
        self.fees.lock().clone()
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.calls.block_number.fetch_add(1, Ordering::SeqCst);
        Ok(self.block)
    }

    async fn estimate_gas(&self, intent: &TradeIntent) -> ChainResult<U256> {
        self.calls.estimate_gas.fetch_add(1, Ordering::SeqCst);
        *self.last_intent.lock() = Some(intent.clone());
        self.estimate.lock().clone()
    }

    async fn sign(&self, intent: &TradeIntent) -> ChainResult<Bytes> {
        self.calls.sign.fetch_add(1, Ordering::SeqCst);
        *self.last_intent.lock() = Some(intent.clone());
        Ok(Bytes::from(vec![0x02, 0xf8, 0x71]))
    }

    async fn send_raw(&self, _raw: Bytes) -> ChainResult<H256> {
        self.calls.send_raw.fetch_add(1, Ordering::SeqCst);
        match self.send_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(self.tx_hash),
        }
    }
}

/// Hands out pre-built mock clients by endpoint URL
#[derive(Default)]
pub struct MockFactory {
    chains: Vec<Arc<MockChain>>,
    pub connected: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn new(chains: Vec<Arc<MockChain>>) -> Self {
        Self {
            chains,
            connected: Mutex::new(Vec::new()),
        }
    }

    /// One default client per URL
    pub fn for_urls(urls: &[String]) -> Self {
        Self::new(urls.iter().map(|u| Arc::new(MockChain::new(u))).collect())
    }

    pub fn chain(&self, url: &str) -> Arc<MockChain> {
        self.chains
            .iter()
            .find(|c| c.endpoint == url)
            .cloned()
            .unwrap()
    }

    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().clone()
    }
}

impl ChainClientFactory for MockFactory {
    fn connect(&self, url: &str) -> ChainResult<Arc<dyn ChainQuery>> {
        self.connected.lock().push(url.to_string());
        match self.chains.iter().find(|c| c.endpoint == url) {
            Some(chain) => Ok(Arc::clone(chain) as Arc<dyn ChainQuery>),
            None => Err(ChainError::InvalidEndpoint {
                url: url.to_string(),
                reason: "no mock registered".to_string(),
            }),
        }
    }
}

/// Relay double with a fixed simulation verdict
pub struct MockRelay {
    pub report: Mutex<Result<SimulationReport, RelayError>>,
    pub bundle_hash: H256,
    pub simulations: AtomicUsize,
    pub submissions: AtomicUsize,
    pub last_bundle: Mutex<Option<Bundle>>,
}

impl MockRelay {
    pub fn passing() -> Self {
        Self::with_report(Ok(SimulationReport {
            total_gas_used: Some(420_000),
            results: vec![mev::SimulatedTransaction {
                gas_used: Some(420_000),
                ..Default::default()
            }],
            ..Default::default()
        }))
    }

    pub fn with_report(report: Result<SimulationReport, RelayError>) -> Self {
        Self {
            report: Mutex::new(report),
            bundle_hash: H256::repeat_byte(0xb0),
            simulations: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            last_bundle: Mutex::new(None),
        }
    }

    pub fn simulations(&self) -> usize {
        self.simulations.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleRelay for MockRelay {
    async fn simulate(&self, bundle: &Bundle) -> Result<SimulationReport, RelayError> {
        self.simulations.fetch_add(1, Ordering::SeqCst);
        *self.last_bundle.lock() = Some(bundle.clone());
        self.report.lock().clone()
    }

    async fn send_bundle(&self, bundle: &Bundle) -> Result<BundleReceipt, RelayError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        *self.last_bundle.lock() = Some(bundle.clone());
        Ok(BundleReceipt {
            bundle_hash: self.bundle_hash,
        })
    }
}

/// How each scripted connection behaves
#[derive(Debug, Clone)]
pub enum SessionScript {
    /// The connect call itself fails
    Refuse,
    /// Deliver these payloads in order, then close
    Deliver(Vec<String>),
    /// Accept the connection and never send anything
    Silent,
}

pub fn ack(subscription: &str) -> String {
    format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{subscription}"}}"#)
}

pub fn notification(tx_ref: &str) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","method":"eth_subscription","params":{{"subscription":"0x1","result":"{tx_ref}"}}}}"#
    )
}

/// Records each connection attempt with its (virtual) time
pub struct MockConnector {
    script: SessionScript,
    pub attempts: Mutex<Vec<(String, Instant)>>,
    pub sent: Arc<Mutex<Vec<String>>>,
    notify: mpsc::UnboundedSender<String>,
}

impl MockConnector {
    pub fn new(script: SessionScript) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (notify, rx) = mpsc::unbounded_channel();
        (
            Self {
                script,
                attempts: Mutex::new(Vec::new()),
                sent: Arc::new(Mutex::new(Vec::new())),
                notify,
            },
            rx,
        )
    }

    pub fn attempted_urls(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamSession>, StreamError> {
        self.attempts.lock().push((url.to_string(), Instant::now()));
        let _ = self.notify.send(url.to_string());

        match &self.script {
            SessionScript::Refuse => Err(StreamError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            SessionScript::Deliver(payloads) => Ok(Box::new(ScriptedSession {
                incoming: payloads.iter().cloned().collect(),
                sent: Arc::clone(&self.sent),
                silent: false,
            })),
            SessionScript::Silent => Ok(Box::new(ScriptedSession {
                incoming: VecDeque::new(),
                sent: Arc::clone(&self.sent),
                silent: true,
            })),
        }
    }
}

struct ScriptedSession {
    incoming: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
    silent: bool,
}

#[async_trait]
impl StreamSession for ScriptedSession {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.sent.lock().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, StreamError>> {
        if self.silent {
            std::future::pending::<()>().await;
        }
        self.incoming.pop_front().map(Ok)
    }
}

/// Records every event handed over by a supervisor
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn tx_refs(&self) -> Vec<String> {
        self.events.lock().iter().map(|(_, tx)| tx.clone()).collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_event(&self, chain: &Arc<dyn ChainQuery>, tx_ref: &str) {
        self.events
            .lock()
            .push((chain.endpoint().to_string(), tx_ref.to_string()));
    }
}

/// Always returns the same signal
pub struct FixedEvaluator {
    signal: EventSignal,
    pub calls: AtomicUsize,
}

impl FixedEvaluator {
    pub fn new(magnitude: f64) -> Self {
        Self {
            signal: EventSignal::new(true, SignalAction::Acquire, magnitude, Some(0.9)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignalEvaluator for FixedEvaluator {
    fn evaluate(&self, _event_ref: &str) -> EventSignal {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.signal.clone()
    }
}

/// In-memory log sink for asserting on status lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Every level down to debug, no ANSI colours
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
