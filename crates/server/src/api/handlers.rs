use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use mediathekarr_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub rulesets_loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rulesets_loaded_at: Option<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.search().rulesets().snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        rulesets_loaded: snapshot.len(),
        rulesets_loaded_at: snapshot.loaded_at().map(|t| t.to_rfc3339()),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
        .into_response()
}
