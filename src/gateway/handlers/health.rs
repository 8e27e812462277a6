//! Health check handler

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
    /// Backing store name
    pub store: &'static str,
}

/// Health check endpoint
///
/// Pings the backing store; no internal details leak into the response
/// beyond the store flavor.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let store = state.service.store();

    if let Err(e) = store.ping().await {
        tracing::error!(error = %e, "Store ping failed");
        return Err(ApiError::service_unavailable("unavailable"));
    }

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    ok(HealthResponse {
        timestamp_ms,
        store: store.name(),
    })
}
