pub mod audiences;
pub mod health;
pub mod integrations;
pub mod logs;
pub mod subscribers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use herald_audit::IntegrationLogStore;
use herald_dispatch::{DispatchMetrics, SubscriberIntake};
use herald_provider::ProviderRegistry;
use herald_store::EntityStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Stores submissions and queues their dispatch.
    pub intake: Arc<SubscriberIntake>,
    pub store: Arc<dyn EntityStore>,
    /// Frozen provider registry.
    pub registry: Arc<ProviderRegistry>,
    pub logs: Arc<dyn IntegrationLogStore>,
    /// Counters shared with the dispatch pipeline.
    pub metrics: Arc<DispatchMetrics>,
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/subscribers", post(subscribers::create_subscriber))
        .route("/v1/audiences/{id}", delete(audiences::delete_audience))
        .route("/v1/integrations/kinds", get(integrations::list_kinds))
        .route(
            "/v1/integrations/config-schema/{kind}",
            get(integrations::config_schema),
        )
        .route(
            "/v1/integrations/config-schemas",
            get(integrations::config_schemas),
        )
        .route("/v1/integration-logs", get(logs::query_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
