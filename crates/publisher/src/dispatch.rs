use shared::{domain::LogicalCommand, error::TranslateError, protocol::NormalizedMessage};
use tracing::warn;
use translator::Translator;

use crate::ConnectionHandle;

/// Front door for block executions: translate, then publish every resulting
/// message in order on the shared connection.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    translator: Translator,
    connection: ConnectionHandle,
}

impl CommandDispatcher {
    pub fn new(translator: Translator, connection: ConnectionHandle) -> Self {
        Self {
            translator,
            connection,
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Rejected commands are logged and returned; nothing reaches the bus.
    pub fn dispatch(
        &self,
        cmd: &LogicalCommand,
    ) -> Result<Vec<NormalizedMessage>, TranslateError> {
        let messages = self.translator.translate(cmd).map_err(|err| {
            warn!(
                client_id = %self.connection.client_id(),
                entity = %err.entity(),
                %err,
                "command rejected"
            );
            err
        })?;

        for message in &messages {
            self.connection.publish(message);
        }
        Ok(messages)
    }
}
