//! Episode lookup: resolves an external show ID to its names and episodes.

mod cache;
mod client;
mod types;

pub use cache::CachedEpisodeLookup;
pub use client::HttpEpisodeLookup;
pub use types::{Episode, SeriesInfo, DAILY_SEASON_THRESHOLD};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the episode lookup service.
#[derive(Debug, Error)]
pub enum EpisodeLookupError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The show is unknown to the lookup service.
    #[error("Show not found: tvdb id {0}")]
    NotFound(u64),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Resolves shows by external show database ID.
#[async_trait]
pub trait EpisodeLookup: Send + Sync {
    async fn resolve(&self, tvdb_id: u64) -> Result<Arc<SeriesInfo>, EpisodeLookupError>;
}
