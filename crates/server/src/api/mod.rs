use publisher::{ClientId, CommandDispatcher, ConnectionState, PublishStatsSnapshot};
use serde::{Deserialize, Serialize};
use shared::{domain::LogicalCommand, error::ApiError, protocol::NormalizedMessage};
use translator::{ColorPolicy, EntityCatalog};

#[derive(Clone)]
pub struct ApiContext {
    pub dispatcher: CommandDispatcher,
    pub broker_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub published: Vec<NormalizedMessage>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub client_id: ClientId,
    pub broker_url: String,
    pub connection: ConnectionState,
    pub calibration_revision: String,
    pub color_policy: ColorPolicy,
    pub publishes: PublishStatsSnapshot,
}

pub fn commands_route() -> &'static str {
    "/commands"
}

pub fn catalog_route() -> &'static str {
    "/catalog"
}

pub fn status_route() -> &'static str {
    "/status"
}

/// Publishing failures are not reported here; they surface in the logs and
/// the status counters.
pub fn submit_command(
    ctx: &ApiContext,
    cmd: &LogicalCommand,
) -> Result<CommandResponse, ApiError> {
    let published = ctx.dispatcher.dispatch(cmd)?;
    Ok(CommandResponse { published })
}

pub fn status(ctx: &ApiContext) -> StatusResponse {
    let connection = ctx.dispatcher.connection();
    let translator = ctx.dispatcher.translator();
    StatusResponse {
        client_id: connection.client_id().clone(),
        broker_url: ctx.broker_url.clone(),
        connection: connection.state(),
        calibration_revision: translator.revision().to_string(),
        color_policy: translator.color_policy(),
        publishes: connection.stats(),
    }
}

pub fn catalog(ctx: &ApiContext) -> Vec<EntityCatalog> {
    ctx.dispatcher.translator().catalog()
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
pub(crate) mod tests;
