//! MediathekViewWeb content search client.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::MediathekConfig;
use crate::metrics::record_external_call;

use super::types::{ApiQueryRequest, ApiQueryResponse};
use super::{ItemQuery, ItemSource, MediathekError, RawItem};

/// HTTP client for the MediathekViewWeb query API.
pub struct MediathekClient {
    client: Client,
    config: MediathekConfig,
}

impl MediathekClient {
    pub fn new(config: MediathekConfig) -> Result<Self, MediathekError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("mediathekarr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediathekError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn query_url(&self) -> String {
        format!("{}/api/query", self.config.url.trim_end_matches('/'))
    }

    async fn execute(&self, query: &ItemQuery) -> Result<Vec<RawItem>, MediathekError> {
        let request = ApiQueryRequest {
            queries: &query.clauses,
            sort_by: "timestamp",
            sort_order: "desc",
            future: false,
            offset: 0,
            size: self.config.page_size,
        };
        // The API rejects application/json; it wants the JSON as a plain text body.
        let body = serde_json::to_string(&request)
            .map_err(|e| MediathekError::InvalidResponse(e.to_string()))?;

        let response = self
            .client
            .post(self.query_url())
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediathekError::Timeout
                } else if e.is_connect() {
                    MediathekError::ConnectionFailed(e.to_string())
                } else {
                    MediathekError::ApiError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediathekError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ApiQueryResponse = response
            .json()
            .await
            .map_err(|e| MediathekError::InvalidResponse(e.to_string()))?;

        if let Some(err) = parsed.err.filter(|e| !e.is_null()) {
            return Err(MediathekError::ApiError(err.to_string()));
        }

        let result = parsed
            .result
            .ok_or_else(|| MediathekError::InvalidResponse("missing result".to_string()))?;

        debug!(
            returned = result.results.len(),
            total = result.query_info.as_ref().map(|i| i.total_results),
            "Mediathek query complete"
        );

        Ok(result.results.into_iter().map(RawItem::from).collect())
    }
}

#[async_trait]
impl ItemSource for MediathekClient {
    fn name(&self) -> &str {
        "mediathekviewweb"
    }

    async fn query(&self, query: &ItemQuery) -> Result<Vec<RawItem>, MediathekError> {
        let start = Instant::now();
        debug!(clauses = ?query.clauses, "Querying Mediathek");
        let result = self.execute(query).await;
        record_external_call(
            self.name(),
            "query",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_trims_trailing_slash() {
        let client = MediathekClient::new(MediathekConfig {
            url: "https://mediathekviewweb.de/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.query_url(), "https://mediathekviewweb.de/api/query");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let client = MediathekClient::new(MediathekConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let result = client.query(&ItemQuery::topic("Tatort")).await;
        assert!(result.is_err());
    }
}
