use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use herald_audit::{LogPage, LogQuery};

use super::AppState;
use crate::error::ServerError;

/// `GET /v1/integration-logs` -- newest-first page of integration logs.
///
/// Accepts every [`LogQuery`] field as a query parameter, e.g.
/// `?status=pending&created_before=2026-01-01T00:00:00Z` to find dispatches
/// that never completed.
pub async fn query_logs(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<LogPage>, ServerError> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let page = state.logs.query(&query).await?;
    Ok(Json(page))
}
