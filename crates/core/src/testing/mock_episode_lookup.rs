//! Mock episode lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::episodes::{EpisodeLookup, EpisodeLookupError, SeriesInfo};

/// Mock implementation of the EpisodeLookup trait. Unknown IDs resolve to
/// `NotFound`.
#[derive(Debug, Default)]
pub struct MockEpisodeLookup {
    series: Arc<RwLock<HashMap<u64, Arc<SeriesInfo>>>>,
    resolves: Arc<RwLock<Vec<u64>>>,
}

impl MockEpisodeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_series(&self, series: SeriesInfo) {
        self.series
            .write()
            .await
            .insert(series.tvdb_id, Arc::new(series));
    }

    /// Number of `resolve` calls so far, successful or not.
    pub async fn resolve_count(&self) -> usize {
        self.resolves.read().await.len()
    }
}

#[async_trait]
impl EpisodeLookup for MockEpisodeLookup {
    async fn resolve(&self, tvdb_id: u64) -> Result<Arc<SeriesInfo>, EpisodeLookupError> {
        self.resolves.write().await.push(tvdb_id);
        self.series
            .read()
            .await
            .get(&tvdb_id)
            .cloned()
            .ok_or(EpisodeLookupError::NotFound(tvdb_id))
    }
}
