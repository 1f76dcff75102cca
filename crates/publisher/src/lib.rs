use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use shared::protocol::NormalizedMessage;
use tracing::{info, warn};

mod dispatch;
pub mod error;
pub mod identity;
pub mod mqtt;
pub mod transport;

pub use dispatch::CommandDispatcher;
pub use error::TransportError;
pub use identity::{ClientId, DEFAULT_CLIENT_ID_PREFIX};
pub use mqtt::MqttTransport;
pub use transport::{ConnectOptions, ConnectionState, Transport, DEFAULT_BROKER_URL};

#[derive(Default)]
struct PublishStats {
    sent: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishStatsSnapshot {
    pub sent: u64,
    pub failed: u64,
}

struct ConnectionInner {
    client_id: ClientId,
    transport: Arc<dyn Transport>,
    stats: PublishStats,
}

/// The process's single broker connection. Cheap to clone; all clones share
/// one transport and one identity.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<ConnectionInner>,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("client_id", &self.inner.client_id)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Opens the MQTT connection in the background and returns immediately.
///
/// Publishes issued before the broker acknowledges the connection are queued
/// (up to `options.queue_capacity`) and flushed in order once it does; beyond
/// that capacity they are dropped and logged. Call
/// [`ConnectionHandle::wait_ready`] to suspend until the broker is reachable.
pub fn connect(
    options: &ConnectOptions,
    client_id: ClientId,
) -> Result<ConnectionHandle, TransportError> {
    info!(
        client_id = %client_id,
        broker_url = %options.broker_url,
        queue_capacity = options.queue_capacity,
        "connecting to broker"
    );
    let transport = MqttTransport::start(options, &client_id)?;
    Ok(ConnectionHandle::with_transport(client_id, Arc::new(transport)))
}

impl ConnectionHandle {
    pub fn with_transport(client_id: ClientId, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                client_id,
                transport,
                stats: PublishStats::default(),
            }),
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.inner.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.transport.subscribe_state().borrow().clone()
    }

    pub fn stats(&self) -> PublishStatsSnapshot {
        PublishStatsSnapshot {
            sent: self.inner.stats.sent.load(Ordering::Relaxed),
            failed: self.inner.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Suspends until the broker acknowledges the connection, for at most
    /// `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), TransportError> {
        let mut state = self.inner.transport.subscribe_state();
        let ready = async {
            loop {
                let current = state.borrow_and_update().clone();
                match current {
                    ConnectionState::Ready => return Ok(()),
                    ConnectionState::Closed => return Err(TransportError::Closed),
                    ConnectionState::Connecting | ConnectionState::Disconnected(_) => {}
                }
                if state.changed().await.is_err() {
                    return Err(TransportError::Closed);
                }
            }
        };
        tokio::time::timeout(timeout, ready)
            .await
            .map_err(|_| TransportError::ConnectTimeout(timeout))?
    }

    /// Serializes the payload and hands it to the transport as one message.
    ///
    /// Never fails towards the caller: a command has no retry path, so
    /// failures are logged and counted instead.
    pub fn publish(&self, message: &NormalizedMessage) {
        let client_id = &self.inner.client_id;
        let result = message
            .payload_json()
            .map_err(|err| TransportError::Encode(err.to_string()))
            .and_then(|payload| {
                info!(
                    client_id = %client_id,
                    topic = %message.topic,
                    payload = %String::from_utf8_lossy(&payload),
                    "publish"
                );
                self.inner.transport.send(message.topic.as_str(), payload)
            });

        match result {
            Ok(()) => {
                self.inner.stats.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.inner.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    client_id = %client_id,
                    topic = %message.topic,
                    %err,
                    "publish failed"
                );
            }
        }
    }

    pub async fn disconnect(&self) {
        if let Err(err) = self.inner.transport.close().await {
            warn!(client_id = %self.inner.client_id, %err, "disconnect failed");
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
