//! Raw item source: free-text search over the broadcaster archives.
//!
//! The `ItemSource` trait abstracts the content search API so the search
//! pipeline can be driven by a mock in tests.

mod client;
mod types;

pub use client::MediathekClient;
pub use types::{FieldValue, ItemQuery, Language, Quality, QueryClause, RawItem};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the content search API.
#[derive(Debug, Clone, Error)]
pub enum MediathekError {
    #[error("Content search connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Content search API error: {0}")]
    ApiError(String),

    #[error("Content search returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Source of raw candidate items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Backend name for logging/metrics.
    fn name(&self) -> &str;

    /// Run a query, newest items first.
    async fn query(&self, query: &ItemQuery) -> Result<Vec<RawItem>, MediathekError>;
}
