use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use herald_core::ConfigMap;
use serde_json::{Value, json};

use super::AppState;

/// `GET /v1/integrations/kinds` -- registered provider kinds, sorted.
pub async fn list_kinds(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .registry
            .kinds()
            .into_iter()
            .map(str::to_owned)
            .collect(),
    )
}

/// `GET /v1/integrations/config-schema/{kind}` -- config template for one
/// kind, used by admin forms to pre-fill an integration's config.
///
/// An unknown kind yields an empty schema rather than an error.
pub async fn config_schema(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Json<Value> {
    let schema = state.registry.config_schema(&kind).unwrap_or_default();
    Json(json!({ "schema": schema }))
}

/// `GET /v1/integrations/config-schemas` -- every kind's config template.
pub async fn config_schemas(State(state): State<AppState>) -> Json<BTreeMap<String, ConfigMap>> {
    Json(state.registry.schemas())
}
