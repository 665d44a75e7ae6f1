//! Common test utilities for in-process testing with mocks.
//!
//! This module provides a test fixture that builds the router with mock
//! content search, ruleset and episode lookup services injected, so the
//! Newznab surface can be exercised without any external service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mediathekarr_core::testing::{MockEpisodeLookup, MockItemSource, MockRulesetSource};
use mediathekarr_core::{Config, RulesetStore, SearchService};
use mediathekarr_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use mediathekarr_core::testing::fixtures;

pub const PUBLIC_URL: &str = "http://bridge.test:5007";

/// Test fixture with fully controllable mocks for:
/// - Content search (MockItemSource)
/// - Ruleset metadata (MockRulesetSource)
/// - Episode lookup (MockEpisodeLookup)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub items: Arc<MockItemSource>,
    pub ruleset_source: Arc<MockRulesetSource>,
    pub episodes: Arc<MockEpisodeLookup>,
    pub rulesets: Arc<RulesetStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub text: String,
}

impl TestResponse {
    /// Body parsed as JSON, `Null` when it is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub api_key: Option<String>,
    pub refresh_on_search: bool,
}

impl TestConfig {
    pub fn with_api_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let items = Arc::new(MockItemSource::new());
        let ruleset_source = Arc::new(MockRulesetSource::new());
        let episodes = Arc::new(MockEpisodeLookup::new());

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.server.public_url = PUBLIC_URL.to_string();
        config.server.api_key = test_config.api_key;
        config.rulesets.refresh_on_search = test_config.refresh_on_search;

        let rulesets = Arc::new(RulesetStore::new(
            Arc::clone(&ruleset_source) as Arc<dyn mediathekarr_core::RulesetSource>,
            config.rulesets.max_pages,
        ));
        let search = SearchService::new(
            Arc::clone(&items) as Arc<dyn mediathekarr_core::ItemSource>,
            Arc::clone(&rulesets),
            Arc::clone(&episodes) as Arc<dyn mediathekarr_core::EpisodeLookup>,
            &config.server.public_url,
            Duration::from_secs(config.cache.ttl_secs),
        )
        .with_refresh_on_search(config.rulesets.refresh_on_search);

        let state = Arc::new(AppState::new(config, Arc::new(search)));
        let router = create_router(state);

        Self {
            router,
            items,
            ruleset_source,
            episodes,
            rulesets,
        }
    }

    /// Load rulesets from the mock source, as the startup refresh would.
    pub async fn load_rulesets(&self) {
        self.rulesets
            .refresh(mediathekarr_core::RefreshTrigger::Startup)
            .await
            .expect("Failed to load rulesets");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_value(header::CONTENT_TYPE);
        let content_disposition = header_value(header::CONTENT_DISPOSITION);

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            content_type,
            content_disposition,
            text: String::from_utf8_lossy(&body_bytes).into_owned(),
        }
    }
}

/// Path and query of every enclosure download link in a result document.
pub fn download_paths(xml: &str) -> Vec<String> {
    const MARKER: &str = "<enclosure url=\"";
    let prefix = format!("{}/download?", PUBLIC_URL);
    xml.match_indices(MARKER)
        .filter_map(|(start, _)| {
            let rest = &xml[start + MARKER.len()..];
            let end = rest.find('"')?;
            let link = rest[..end].replace("&amp;", "&");
            link.strip_prefix(&prefix)
                .map(|query| format!("/download?{}", query))
        })
        .collect()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
