use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use publisher::{
    ClientId, CommandDispatcher, ConnectionHandle, ConnectionState, Transport, TransportError,
};
use shared::{
    domain::{EntityKind, LogicalCommand},
    protocol::CommandPayload,
};
use tokio::sync::watch;
use translator::Translator;

#[derive(Default)]
struct WireLog {
    frames: Mutex<Vec<(String, Vec<u8>)>>,
}

struct WireTransport {
    log: Arc<WireLog>,
    state: watch::Sender<ConnectionState>,
}

#[async_trait]
impl Transport for WireTransport {
    fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.log
            .frames
            .lock()
            .expect("frames lock")
            .push((topic.to_string(), payload));
        Ok(())
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_combined_commands_keep_per_caller_order() {
    let log = Arc::new(WireLog::default());
    let transport = Arc::new(WireTransport {
        log: Arc::clone(&log),
        state: watch::Sender::new(ConnectionState::Ready),
    });
    let connection = ConnectionHandle::with_transport(ClientId::generate("it"), transport);
    let dispatcher = CommandDispatcher::new(Translator::default(), connection);

    let callers = 16;
    let mut tasks = Vec::new();
    for caller in 0..callers {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let color = format!("#{caller:06x}");
            dispatcher
                .dispatch(&LogicalCommand::new(EntityKind::EnergyEyes).with_color(color))
                .expect("dispatch");
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    let frames = log.frames.lock().expect("frames lock").clone();
    assert_eq!(frames.len(), callers * 2);

    for caller in 0..callers {
        let rgb = format!("{caller:06x}");
        let positions: Vec<(usize, &str)> = frames
            .iter()
            .enumerate()
            .filter_map(|(index, (topic, payload))| {
                // Every frame must be one intact JSON document.
                let payload: CommandPayload =
                    serde_json::from_slice(payload).expect("intact payload");
                (payload.rgb.as_deref() == Some(rgb.as_str())).then_some((index, topic.as_str()))
            })
            .collect();
        assert_eq!(positions.len(), 2, "caller {caller}");
        assert_eq!(positions[0].1, "im/command/energy/colorize");
        assert_eq!(positions[1].1, "im/command/eyes/colorize");
        assert!(positions[0].0 < positions[1].0);
    }

    assert_eq!(dispatcher.connection().stats().sent, (callers * 2) as u64);
}
