use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use crate::state::AppState;

/// Liveness/readiness probe. The gateway holds no connections to check
/// beyond the adapter handle, so this only reports the configured backend.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "backend": state.adapter.backend_type().to_string(),
    }))
}
