use axum::Json;
use axum::extract::State;
use herald_dispatch::MetricsSnapshot;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub metrics: MetricsSnapshot,
}

/// `GET /health` -- service status with a dispatch metrics snapshot.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        metrics: state.metrics.snapshot(),
    })
}
