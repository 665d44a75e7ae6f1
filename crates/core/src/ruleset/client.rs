//! HTTP client for the ruleset metadata API.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::RulesetConfig;
use crate::metrics::record_external_call;

use super::{RulesetError, RulesetPage, RulesetSource};

/// Fetches ruleset pages from `{base}/rulesets.php?page=N`.
pub struct HttpRulesetSource {
    client: Client,
    base_url: String,
}

impl HttpRulesetSource {
    pub fn new(config: &RulesetConfig) -> Result<Self, RulesetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("mediathekarr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RulesetError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/rulesets.php?page={}", self.base_url, page)
    }

    async fn get_page(&self, page: u32) -> Result<RulesetPage, RulesetError> {
        let response = self
            .client
            .get(self.page_url(page))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RulesetError::Timeout
                } else {
                    RulesetError::ConnectionFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(RulesetError::HttpStatus {
                page,
                status: response.status().as_u16(),
            });
        }

        response
            .json::<RulesetPage>()
            .await
            .map_err(|e| RulesetError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RulesetSource for HttpRulesetSource {
    async fn fetch_page(&self, page: u32) -> Result<RulesetPage, RulesetError> {
        let start = Instant::now();
        let result = self.get_page(page).await;
        record_external_call(
            "rulesets",
            "fetch_page",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        if let Ok(p) = &result {
            debug!(
                page,
                total_pages = p.pagination.total_pages,
                rulesets = p.rulesets.len(),
                "Fetched ruleset page"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let source = HttpRulesetSource::new(&RulesetConfig {
            url: "http://localhost:8000/api/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            source.page_url(3),
            "http://localhost:8000/api/rulesets.php?page=3"
        );
    }
}
