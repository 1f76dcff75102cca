use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use publisher::{ClientId, CommandDispatcher};
use shared::{
    domain::LogicalCommand,
    error::{ApiError, ErrorCode},
};
use tracing::{info, warn};
use translator::EntityCatalog;

mod api;
mod app_state;
mod config;

use api::{ApiContext, CommandResponse, StatusResponse};
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let translator = settings.translator()?;
    let options = settings.connect_options()?;
    let client_id = ClientId::generate(&settings.client_id_prefix);

    let connection = publisher::connect(&options, client_id)?;
    if let Err(err) = connection.wait_ready(settings.connect_timeout()).await {
        warn!(
            broker_url = %options.broker_url,
            %err,
            "broker not ready yet; commands will queue until it is"
        );
    }

    info!(
        calibration = translator.revision(),
        color_policy = ?translator.color_policy(),
        "translator ready"
    );
    let api = ApiContext {
        dispatcher: CommandDispatcher::new(translator, connection.clone()),
        broker_url: settings.broker_url.clone(),
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connection.disconnect().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(api::status_route(), get(http_status))
        .route(api::catalog_route(), get(http_catalog))
        .route(api::commands_route(), post(http_submit_command))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(api::status(&state.api))
}

async fn http_catalog(State(state): State<Arc<AppState>>) -> Json<Vec<EntityCatalog>> {
    Json(api::catalog(&state.api))
}

async fn http_submit_command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LogicalCommand>, JsonRejection>,
) -> Result<Json<CommandResponse>, (StatusCode, Json<ApiError>)> {
    let Json(cmd) = body.map_err(|rejection| {
        (
            rejection.status(),
            Json(ApiError::new(ErrorCode::InvalidBody, rejection.body_text())),
        )
    })?;
    api::submit_command(&state.api, &cmd)
        .map(Json)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, Json(e)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
