//! HTTP gateway
//!
//! Thin axum surface over the transfer service. The only contract exposed
//! outward is the one the dashboard's dialogs consume: execute a transfer,
//! look one up, list accounts and ledger entries, deposit.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::transfer::TransferService;
use state::AppState;

/// Build the full router for the given service
pub fn build_router(service: Arc<TransferService>) -> Router {
    let state = AppState::new(service);

    let private_routes = Router::new()
        .route("/transfer", post(handlers::create_transfer))
        .route("/transfer/{transfer_id}", get(handlers::get_transfer))
        .route("/accounts", get(handlers::list_accounts))
        .route("/accounts/{account_id}/ledger", get(handlers::get_ledger))
        .route("/deposit", post(handlers::create_deposit));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/private", private_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until shutdown
pub async fn start_gateway(
    config: &AppConfig,
    service: Arc<TransferService>,
) -> std::io::Result<()> {
    let app = build_router(service);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Gateway listening on http://{}", addr);
    info!("API docs: http://{}/docs", addr);

    axum::serve(listener, app).await
}
