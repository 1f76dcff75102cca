//! MQTT transport backed by `rumqttc`.
//!
//! The client half enqueues publishes into a bounded request channel; a
//! spawned task drives the event loop, which drains that channel in order once
//! the broker has acknowledged the connection.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    Transport as WireTransport,
};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::TransportError,
    identity::ClientId,
    transport::{ConnectOptions, ConnectionState, Transport},
};

const CLOSE_GRACE: Duration = Duration::from_secs(2);
const DEFAULT_MQTT_PORT: u16 = 1883;

pub struct MqttTransport {
    client: AsyncClient,
    state: Arc<watch::Sender<ConnectionState>>,
    closing: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    /// Starts connecting in the background and returns at once. Must be called
    /// from within a tokio runtime.
    pub fn start(options: &ConnectOptions, client_id: &ClientId) -> Result<Self, TransportError> {
        let mqtt_options = mqtt_options(options, client_id)?;
        let (client, event_loop) =
            AsyncClient::new(mqtt_options, options.queue_capacity.max(1));
        let state = Arc::new(watch::Sender::new(ConnectionState::Connecting));
        let closing = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(drive_event_loop(
            event_loop,
            EventLoopContext {
                state: Arc::clone(&state),
                client_id: client_id.clone(),
                broker_url: options.broker_url.clone(),
                reconnect_period: options.reconnect_period,
                closing: Arc::clone(&closing),
                running: Arc::clone(&running),
            },
        ));

        Ok(Self {
            client,
            state,
            closing,
            running,
            event_loop: Mutex::new(Some(task)),
        })
    }
}

#[async_trait]
impl Transport for MqttTransport {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.closing.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|err| match err {
                ClientError::TryRequest(_) if self.running.load(Ordering::SeqCst) => {
                    TransportError::QueueFull
                }
                ClientError::TryRequest(_) => match &*self.state.borrow() {
                    ConnectionState::Disconnected(reason) => {
                        TransportError::NotConnected(reason.clone())
                    }
                    _ => TransportError::Closed,
                },
                other => TransportError::Request(other.to_string()),
            })
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // A full request queue cannot take the DISCONNECT; stop the loop instead.
        let disconnect_queued =
            self.running.load(Ordering::SeqCst) && match self.client.try_disconnect() {
                Ok(()) => true,
                Err(err) => {
                    debug!(%err, "mqtt: disconnect request not queued");
                    false
                }
            };

        if let Some(task) = self.event_loop.lock().await.take() {
            let abort = task.abort_handle();
            if !disconnect_queued {
                abort.abort();
            } else if tokio::time::timeout(CLOSE_GRACE, task).await.is_err() {
                warn!("mqtt: event loop did not stop within {CLOSE_GRACE:?}, aborting");
                abort.abort();
            }
        }
        self.running.store(false, Ordering::SeqCst);
        self.state.send_replace(ConnectionState::Closed);
        Ok(())
    }
}

fn mqtt_options(
    options: &ConnectOptions,
    client_id: &ClientId,
) -> Result<MqttOptions, TransportError> {
    let url = &options.broker_url;
    let host = url
        .host_str()
        .ok_or_else(|| TransportError::MissingHost(url.to_string()))?;

    let mut mqtt_options = match url.scheme() {
        // Websocket transports take the full URL as the broker address.
        "ws" | "wss" => {
            let port = url.port_or_known_default().unwrap_or(80);
            let mut mqtt_options = MqttOptions::new(client_id.as_str(), url.as_str(), port);
            mqtt_options.set_transport(if url.scheme() == "ws" {
                WireTransport::Ws
            } else {
                WireTransport::wss_with_default_config()
            });
            mqtt_options
        }
        "mqtt" | "tcp" => MqttOptions::new(
            client_id.as_str(),
            host,
            url.port().unwrap_or(DEFAULT_MQTT_PORT),
        ),
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    };
    mqtt_options.set_keep_alive(options.keep_alive);
    mqtt_options.set_clean_session(true);
    Ok(mqtt_options)
}

struct EventLoopContext {
    state: Arc<watch::Sender<ConnectionState>>,
    client_id: ClientId,
    broker_url: Url,
    reconnect_period: Option<Duration>,
    closing: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

async fn drive_event_loop(mut event_loop: EventLoop, ctx: EventLoopContext) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(
                    client_id = %ctx.client_id,
                    broker_url = %ctx.broker_url,
                    "client {} is connected to {}",
                    ctx.client_id,
                    ctx.broker_url
                );
                ctx.state.send_replace(ConnectionState::Ready);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!(client_id = %ctx.client_id, "mqtt: disconnected from broker");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                if ctx.closing.load(Ordering::SeqCst) {
                    break;
                }
                warn!(
                    client_id = %ctx.client_id,
                    broker_url = %ctx.broker_url,
                    %err,
                    "mqtt: connection error"
                );
                ctx.state
                    .send_replace(ConnectionState::Disconnected(err.to_string()));
                match ctx.reconnect_period {
                    Some(period) => tokio::time::sleep(period).await,
                    None => {
                        ctx.running.store(false, Ordering::SeqCst);
                        return;
                    }
                }
            }
        }
    }
    ctx.running.store(false, Ordering::SeqCst);
    ctx.state.send_replace(ConnectionState::Closed);
}
