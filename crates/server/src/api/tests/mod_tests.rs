use super::*;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use publisher::{ConnectionHandle, Transport, TransportError};
use shared::{
    domain::{EntityKind, Side},
    error::ErrorCode,
};
use tokio::sync::watch;
use translator::Translator;

pub(crate) struct RecordingTransport {
    pub(crate) sent: Mutex<Vec<(String, Vec<u8>)>>,
    state: watch::Sender<ConnectionState>,
}

impl RecordingTransport {
    pub(crate) fn topics(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((topic.to_string(), payload));
        Ok(())
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.send_replace(ConnectionState::Closed);
        Ok(())
    }
}

pub(crate) fn test_context() -> (ApiContext, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport {
        sent: Mutex::new(Vec::new()),
        state: watch::Sender::new(ConnectionState::Ready),
    });
    let connection =
        ConnectionHandle::with_transport(ClientId::generate("test"), transport.clone());
    (
        ApiContext {
            dispatcher: CommandDispatcher::new(Translator::default(), connection),
            broker_url: "ws://ironman:3000".into(),
        },
        transport,
    )
}

#[test]
fn submit_command_publishes_translation() {
    let (ctx, transport) = test_context();
    let cmd = LogicalCommand::new(EntityKind::Hand)
        .with_side(Side::Right)
        .with_action("horizontal_left");

    let response = submit_command(&ctx, &cmd).expect("submit");

    assert_eq!(response.published.len(), 1);
    assert_eq!(response.published[0].payload.abs_position, Some(-25));
    assert_eq!(transport.topics(), vec!["im/command/righthand/set"]);
}

#[test]
fn rejected_command_maps_to_validation_error() {
    let (ctx, transport) = test_context();
    let cmd = LogicalCommand::new(EntityKind::Helmet).with_action("up");

    let err = submit_command(&ctx, &cmd).expect_err("should fail");

    assert!(matches!(err.code, ErrorCode::Validation));
    assert_eq!(err.message, "action 'up' not allowed with helmet");
    assert!(transport.topics().is_empty());
}

#[test]
fn status_reports_identity_and_counters() {
    let (ctx, _transport) = test_context();
    submit_command(
        &ctx,
        &LogicalCommand::new(EntityKind::EnergyEyes).with_color("#112233"),
    )
    .expect("submit");

    let status = status(&ctx);
    assert!(status.client_id.as_str().starts_with("test_"));
    assert_eq!(status.connection, ConnectionState::Ready);
    assert_eq!(status.calibration_revision, "asymmetric");
    assert_eq!(status.color_policy, ColorPolicy::Strict);
    assert_eq!(status.publishes.sent, 2);
}

#[test]
fn catalog_covers_all_entities() {
    let (ctx, _) = test_context();
    let entities: Vec<EntityKind> = catalog(&ctx).into_iter().map(|e| e.entity).collect();
    assert_eq!(entities, EntityKind::ALL.to_vec());
}
