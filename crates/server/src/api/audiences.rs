use axum::Json;
use axum::extract::{Path, State};
use herald_core::AudienceId;
use herald_dispatch::{AudiencePurge, purge_audience};

use super::AppState;
use crate::error::ServerError;

/// `DELETE /v1/audiences/{id}` -- remove an audience, its subscribers and
/// links, and their integration logs.
pub async fn delete_audience(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AudiencePurge>, ServerError> {
    let purge = purge_audience(
        state.store.as_ref(),
        state.logs.as_ref(),
        &AudienceId::new(id),
    )
    .await?;
    Ok(Json(purge))
}
