use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use url::Url;

use crate::error::TransportError;

pub const DEFAULT_BROKER_URL: &str = "ws://ironman:3000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Ready,
    Disconnected(String),
    Closed,
}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub broker_url: Url,
    pub keep_alive: Duration,
    /// Publishes accepted before the broker acknowledges the connection are
    /// held here, in order; past this many the newest one is dropped.
    pub queue_capacity: usize,
    /// `None` stops the event loop on the first connection error.
    pub reconnect_period: Option<Duration>,
}

impl ConnectOptions {
    pub fn new(broker_url: Url) -> Self {
        Self {
            broker_url,
            keep_alive: Duration::from_secs(60),
            queue_capacity: 64,
            reconnect_period: Some(Duration::from_secs(1)),
        }
    }
}

/// Outbound side of a broker connection.
///
/// `send` must not block: it either enqueues the whole payload as one
/// message or fails. Messages enqueued by one caller reach the wire in the
/// order they were enqueued.
#[async_trait]
pub trait Transport: Send + Sync {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
    fn subscribe_state(&self) -> watch::Receiver<ConnectionState>;
    async fn close(&self) -> Result<(), TransportError>;
}
