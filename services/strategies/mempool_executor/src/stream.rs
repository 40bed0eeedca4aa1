//! Streaming endpoint transport and inbound message parsing

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Request id of the pending-transaction subscription
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    #[error("failed to send: {0}")]
    Send(String),

    #[error("stream error: {0}")]
    Receive(String),

    #[error("stream closed")]
    Closed,

    #[error("subscription rejected: {0}")]
    SubscriptionRejected(String),
}

/// Opens streaming connections
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamSession>, StreamError>;
}

/// One open streaming connection
#[async_trait]
pub trait StreamSession: Send {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError>;

    /// Next text payload, or `None` once the connection is closed.
    async fn next_text(&mut self) -> Option<Result<String, StreamError>>;
}

/// WebSocket connector over tokio-tungstenite
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

struct WsSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamSession>, StreamError> {
        let (stream, _) = connect_async(url).await.map_err(|e| StreamError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(WsSession { stream }))
    }
}

#[async_trait]
impl StreamSession for WsSession {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| StreamError::Send(e.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, StreamError>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => continue,
                },
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(StreamError::Receive(e.to_string()))),
            }
        }
        None
    }
}

/// `eth_subscribe` request for pending transactions
pub fn subscribe_request(id: u64) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "eth_subscribe",
        "params": ["newPendingTransactions"],
    })
    .to_string()
}

/// A parsed inbound stream message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Response to a request we sent
    Ack {
        id: Option<u64>,
        subscription: Option<String>,
        error: Option<String>,
    },
    /// Subscription push carrying a transaction reference
    Notification {
        subscription: Option<String>,
        tx_ref: String,
    },
}

/// Parse one text payload. Malformed or unrecognised payloads yield `None`.
pub fn parse_inbound(text: &str) -> Option<Inbound> {
    let value: Value = serde_json::from_str(text).ok()?;

    if let Some(result) = value.get("params").and_then(|p| p.get("result")) {
        let tx_ref = match result {
            Value::String(hash) => hash.clone(),
            // Full-transaction subscriptions push objects
            Value::Object(tx) => tx.get("hash")?.as_str()?.to_string(),
            _ => return None,
        };
        let subscription = value
            .get("params")
            .and_then(|p| p.get("subscription"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return Some(Inbound::Notification {
            subscription,
            tx_ref,
        });
    }

    let id = value.get("id").filter(|id| !id.is_null())?;
    let error = value.get("error").filter(|e| !e.is_null()).map(|e| {
        e.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string())
    });

    Some(Inbound::Ack {
        id: id.as_u64().or_else(|| id.as_str().and_then(|s| s.parse().ok())),
        subscription: value
            .get("result")
            .and_then(Value::as_str)
            .map(str::to_string),
        error,
    })
}
