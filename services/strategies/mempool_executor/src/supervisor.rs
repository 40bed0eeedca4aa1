//! # Connection Supervisor - Per-Network Resilience State Machine
//!
//! ```text
//! Connecting → Subscribing → Listening → (error | close) → Backoff → Connecting
//!                                                              ↓ ceiling reached
//!                                                         Unavailable
//! ```
//!
//! One supervisor runs per network for the life of the process. Endpoints are
//! chosen with the network's rotation counter, which advances exactly once per
//! failed cycle, so after `m` failed cycles the selected index is `m mod n`.
//! Events are handed to the [`EventSink`] inline and in arrival order; the
//! next message is not read until the previous event has been handled.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};
use vigil_network::{select, BackoffPolicy, ChainError, RotationCounter, SelectorError};
use vigil_types::NetworkConfig;

use crate::chain::{ChainClientFactory, ChainQuery};
use crate::pipeline::EventSink;
use crate::stream::{
    parse_inbound, subscribe_request, Inbound, StreamConnector, StreamError, StreamSession,
    SUBSCRIBE_REQUEST_ID,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Subscribing,
    Listening,
    Backoff,
    /// Consecutive-failure ceiling reached; terminal
    Unavailable,
}

/// Why one connection cycle ended
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("no endpoint: {0}")]
    NoEndpoint(#[from] SelectorError),

    #[error("query client: {0}")]
    Query(#[from] ChainError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Gave up after this many consecutive failed cycles
    Unavailable { consecutive_failures: u32 },
}

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub connect_timeout: Duration,
    pub ack_timeout: Duration,
    pub backoff: BackoffPolicy,
}

/// Live state of one connection. Discarded when the connection ends.
pub struct ConnectionSession {
    pub stream_endpoint: String,
    pub subscription_id: String,
    pub chain: Arc<dyn ChainQuery>,
    stream: Box<dyn StreamSession>,
}

pub struct ConnectionSupervisor {
    network: Arc<NetworkConfig>,
    counter: Arc<RotationCounter>,
    connector: Arc<dyn StreamConnector>,
    clients: Arc<dyn ChainClientFactory>,
    sink: Arc<dyn EventSink>,
    settings: SupervisorSettings,
    state: watch::Sender<ConnectionState>,
    rng: StdRng,
}

impl ConnectionSupervisor {
    pub fn new(
        network: Arc<NetworkConfig>,
        counter: Arc<RotationCounter>,
        connector: Arc<dyn StreamConnector>,
        clients: Arc<dyn ChainClientFactory>,
        sink: Arc<dyn EventSink>,
        settings: SupervisorSettings,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            network,
            counter,
            connector,
            clients,
            sink,
            settings,
            state,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn publish(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Run until the failure ceiling is reached. With no ceiling this never returns.
    pub async fn run(mut self) -> SupervisorExit {
        let name = self.network.name.clone();
        let mut consecutive_failures: u32 = 0;

        loop {
            let (reached_listening, reason) = match self.run_cycle().await {
                Ok(reached) => (reached, "connection closed".to_string()),
                Err((reached, e)) => (reached, e.to_string()),
            };

            let next = self.counter.next();
            // A cycle that reached listening never counts towards the ceiling
            consecutive_failures = if reached_listening {
                0
            } else {
                consecutive_failures.saturating_add(1)
            };

            if !reached_listening && self.settings.backoff.exhausted(consecutive_failures) {
                self.publish(ConnectionState::Unavailable);
                log_error!(
                    "[{}] Giving up after {} consecutive failures: {}",
                    name,
                    consecutive_failures,
                    reason
                );
                return SupervisorExit::Unavailable {
                    consecutive_failures,
                };
            }

            let delay = self
                .settings
                .backoff
                .jittered_delay(consecutive_failures.max(1), &mut self.rng);
            self.publish(ConnectionState::Backoff);
            log_warning!(
                "[{}] {}. {} Rotating to pool index {} in {}ms",
                name,
                reason,
                crate::logging::LogEmoji::CLOCK,
                next % self.network.stream_endpoints().len() as u64,
                delay.as_millis()
            );
            sleep(delay).await;
        }
    }

    /// One connect → subscribe → listen cycle. Every cycle ends in failure;
    /// the flag reports whether it got as far as listening.
    async fn run_cycle(&self) -> Result<bool, (bool, SupervisorError)> {
        let session = self.open_session().await.map_err(|e| (false, e))?;
        self.listen(session).await.map(|_| true).map_err(|e| (true, e))
    }

    async fn open_session(&self) -> Result<ConnectionSession, SupervisorError> {
        self.publish(ConnectionState::Connecting);

        let k = self.counter.current();
        let stream_endpoint = select(self.network.stream_endpoints(), k)?.clone();
        let query_endpoint = select(self.network.query_endpoints(), k)?;

        let chain = self.clients.connect(query_endpoint)?;

        debug!("[{}] Connecting to {}", self.network.name, stream_endpoint);
        let connect_timeout = self.settings.connect_timeout;
        let mut stream = match timeout(connect_timeout, self.connector.connect(&stream_endpoint)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(StreamError::Timeout {
                    stage: "connect",
                    timeout_ms: connect_timeout.as_millis() as u64,
                }
                .into())
            }
        };

        log_network!(
            "[{}] Connected to {} (pool index {})",
            self.network.name,
            host_of(&stream_endpoint),
            k % self.network.stream_endpoints().len() as u64
        );

        self.publish(ConnectionState::Subscribing);
        stream
            .send_text(subscribe_request(SUBSCRIBE_REQUEST_ID))
            .await?;

        let subscription_id = self.await_ack(stream.as_mut()).await?;
        log_success!(
            "[{}] Subscribed to pending transactions ({})",
            self.network.name,
            subscription_id
        );

        Ok(ConnectionSession {
            stream_endpoint,
            subscription_id,
            chain,
            stream,
        })
    }

    /// Wait for the response correlated to the subscribe request.
    async fn await_ack(&self, stream: &mut dyn StreamSession) -> Result<String, StreamError> {
        let ack_timeout = self.settings.ack_timeout;
        let deadline = Instant::now() + ack_timeout;

        loop {
            let message = match tokio::time::timeout_at(deadline, stream.next_text()).await {
                Ok(message) => message,
                Err(_) => {
                    return Err(StreamError::Timeout {
                        stage: "subscribe ack",
                        timeout_ms: ack_timeout.as_millis() as u64,
                    })
                }
            };

            let text = match message {
                Some(Ok(text)) => text,
                Some(Err(e)) => return Err(e),
                None => return Err(StreamError::Closed),
            };

            match parse_inbound(&text) {
                Some(Inbound::Ack {
                    id: Some(SUBSCRIBE_REQUEST_ID),
                    subscription,
                    error,
                }) => {
                    if let Some(error) = error {
                        return Err(StreamError::SubscriptionRejected(error));
                    }
                    return Ok(subscription.unwrap_or_default());
                }
                // Anything else before the ack is ignored
                _ => continue,
            }
        }
    }

    async fn listen(&self, mut session: ConnectionSession) -> Result<(), SupervisorError> {
        self.publish(ConnectionState::Listening);
        info!(
            "[{}] Listening on {} via query endpoint {}",
            self.network.name,
            session.stream_endpoint,
            session.chain.endpoint()
        );

        while let Some(message) = session.stream.next_text().await {
            let text = message?;
            match parse_inbound(&text) {
                Some(Inbound::Notification { tx_ref, .. }) => {
                    self.sink.on_event(&session.chain, &tx_ref).await;
                }
                Some(Inbound::Ack { id, error, .. }) => {
                    debug!("[{}] Ack for request {:?} (error: {:?})", self.network.name, id, error);
                }
                None => {}
            }
        }
        Ok(())
    }
}

fn host_of(endpoint: &str) -> &str {
    endpoint
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(endpoint)
}
