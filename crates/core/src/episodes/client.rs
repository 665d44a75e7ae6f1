//! HTTP episode lookup client.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::EpisodeLookupConfig;
use crate::metrics::record_external_call;

use super::types::ApiShowResponse;
use super::{EpisodeLookup, EpisodeLookupError, SeriesInfo};

/// Resolves shows via `GET {base}/get_show.php?tvdbid=N`.
pub struct HttpEpisodeLookup {
    client: Client,
    base_url: String,
}

impl HttpEpisodeLookup {
    pub fn new(config: &EpisodeLookupConfig) -> Result<Self, EpisodeLookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("mediathekarr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, tvdb_id: u64) -> Result<SeriesInfo, EpisodeLookupError> {
        let url = format!("{}/get_show.php", self.base_url);

        debug!(tvdb_id, "Episode lookup");

        let response = self
            .client
            .get(&url)
            .query(&[("tvdbid", tvdb_id)])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(EpisodeLookupError::NotFound(tvdb_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EpisodeLookupError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: ApiShowResponse = response
            .json()
            .await
            .map_err(|e| EpisodeLookupError::ParseError(e.to_string()))?;

        if parsed.status.as_deref() == Some("error") {
            debug!(tvdb_id, message = ?parsed.message, "Episode lookup reported error");
            return Err(EpisodeLookupError::NotFound(tvdb_id));
        }

        let show = parsed.data.ok_or(EpisodeLookupError::NotFound(tvdb_id))?;
        Ok(show.into_series(tvdb_id))
    }
}

#[async_trait]
impl EpisodeLookup for HttpEpisodeLookup {
    async fn resolve(&self, tvdb_id: u64) -> Result<Arc<SeriesInfo>, EpisodeLookupError> {
        let start = Instant::now();
        let result = self.fetch(tvdb_id).await;
        record_external_call(
            "episodes",
            "resolve",
            start.elapsed().as_secs_f64(),
            result.is_ok() || matches!(result, Err(EpisodeLookupError::NotFound(_))),
        );
        if let Ok(series) = &result {
            debug!(
                tvdb_id,
                name = %series.name,
                episodes = series.episodes.len(),
                "Resolved show"
            );
        }
        result.map(Arc::new)
    }
}
