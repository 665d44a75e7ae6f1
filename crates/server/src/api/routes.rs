use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{api_key_middleware, metrics_middleware};
use super::{download, handlers, newznab};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Newznab endpoint, guarded by the optional API key
    let newznab_routes = Router::new()
        .route("/api", get(newznab::newznab))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ));

    // Management routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config));

    Router::new()
        .merge(newznab_routes)
        .route("/download", get(download::resolve_download))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
