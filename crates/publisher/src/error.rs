use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("unsupported broker url scheme '{0}' (expected ws, wss, mqtt or tcp)")]
    UnsupportedScheme(String),
    #[error("broker url '{0}' has no host")]
    MissingHost(String),
    #[error("broker not ready after {0:?}")]
    ConnectTimeout(Duration),
    #[error("outbound queue is full")]
    QueueFull,
    #[error("not connected: {0}")]
    NotConnected(String),
    #[error("connection closed")]
    Closed,
    #[error("failed to encode payload: {0}")]
    Encode(String),
    #[error("transport request failed: {0}")]
    Request(String),
}
