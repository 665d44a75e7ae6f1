//! API key and metrics middleware.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use mediathekarr_core::release::xml::{error_codes, render_error};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::newznab::xml_response;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

#[derive(Debug, Default, Deserialize)]
struct ApiKeyParam {
    apikey: Option<String>,
}

/// Newznab API key check.
///
/// Clients pass the key as the `apikey` query parameter. With no key
/// configured every request passes; otherwise a missing or wrong key gets a
/// Newznab error document (code 100) with status 401.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key() else {
        return next.run(request).await;
    };

    let provided = Query::<ApiKeyParam>::try_from_uri(request.uri())
        .map(|Query(p)| p.apikey)
        .unwrap_or_default()
        .filter(|k| !k.is_empty());

    match provided {
        Some(key) if key == expected => next.run(request).await,
        Some(_) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["invalid_key"]).inc();
            debug!("Rejected request with invalid API key");
            unauthorized()
        }
        None => {
            AUTH_FAILURES_TOTAL.with_label_values(&["missing_key"]).inc();
            debug!("Rejected request without API key");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    xml_response(
        StatusCode::UNAUTHORIZED,
        render_error(error_codes::INCORRECT_CREDENTIALS, "Incorrect user credentials"),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use mediathekarr_core::testing::{MockEpisodeLookup, MockItemSource, MockRulesetSource};
    use mediathekarr_core::{Config, RulesetStore, SearchService};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn create_test_state(api_key: Option<&str>) -> Arc<AppState> {
        let mut config = Config::default();
        config.server.api_key = api_key.map(str::to_string);

        let rulesets = Arc::new(RulesetStore::new(
            Arc::new(MockRulesetSource::default()),
            10,
        ));
        let search = SearchService::new(
            Arc::new(MockItemSource::default()),
            rulesets,
            Arc::new(MockEpisodeLookup::default()),
            &config.server.public_url,
            Duration::from_secs(60),
        );
        Arc::new(AppState::new(config, Arc::new(search)))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(dummy_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                api_key_middleware,
            ))
            .with_state(state)
    }

    async fn call(app: Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_no_key_configured_allows_all() {
        let response = call(app(create_test_state(None)), "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_configured_key_allows_all() {
        let response = call(app(create_test_state(Some(""))), "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_key() {
        let response = call(
            app(create_test_state(Some("secret-key"))),
            "/test?t=caps&apikey=secret-key",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let response = call(
            app(create_test_state(Some("secret-key"))),
            "/test?apikey=wrong-key",
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("code=\"100\""));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let response = call(app(create_test_state(Some("secret-key"))), "/test?t=caps").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_through() {
        let app = Router::new()
            .route("/test", get(dummy_handler))
            .layer(middleware::from_fn(metrics_middleware));

        let response = call(app, "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .get() >= 1);
    }
}
