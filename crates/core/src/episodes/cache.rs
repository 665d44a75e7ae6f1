//! In-memory TTL cache in front of an episode lookup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::{EpisodeLookup, EpisodeLookupError, SeriesInfo};

/// Caches successful lookups for a fixed TTL. Failures are not cached.
pub struct CachedEpisodeLookup {
    inner: Arc<dyn EpisodeLookup>,
    ttl: Duration,
    entries: RwLock<HashMap<u64, (Instant, Arc<SeriesInfo>)>>,
}

impl CachedEpisodeLookup {
    pub fn new(inner: Arc<dyn EpisodeLookup>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EpisodeLookup for CachedEpisodeLookup {
    async fn resolve(&self, tvdb_id: u64) -> Result<Arc<SeriesInfo>, EpisodeLookupError> {
        {
            let entries = self.entries.read().await;
            if let Some((stored_at, series)) = entries.get(&tvdb_id) {
                if stored_at.elapsed() < self.ttl {
                    debug!(tvdb_id, "Episode cache hit");
                    return Ok(Arc::clone(series));
                }
            }
        }

        let series = self.inner.resolve(tvdb_id).await?;

        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(tvdb_id, (Instant::now(), Arc::clone(&series)));
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockEpisodeLookup};

    #[tokio::test]
    async fn test_second_resolve_is_served_from_cache() {
        let mock = Arc::new(MockEpisodeLookup::new());
        mock.add_series(fixtures::series(42, "Show", vec![])).await;
        let cached = CachedEpisodeLookup::new(mock.clone(), Duration::from_secs(60));

        cached.resolve(42).await.unwrap();
        cached.resolve(42).await.unwrap();
        assert_eq!(mock.resolve_count().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let mock = Arc::new(MockEpisodeLookup::new());
        mock.add_series(fixtures::series(42, "Show", vec![])).await;
        let cached = CachedEpisodeLookup::new(mock.clone(), Duration::ZERO);

        cached.resolve(42).await.unwrap();
        cached.resolve(42).await.unwrap();
        assert_eq!(mock.resolve_count().await, 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock = Arc::new(MockEpisodeLookup::new());
        let cached = CachedEpisodeLookup::new(mock.clone(), Duration::from_secs(60));

        assert!(matches!(
            cached.resolve(7).await,
            Err(EpisodeLookupError::NotFound(7))
        ));
        mock.add_series(fixtures::series(7, "Late", vec![])).await;
        assert_eq!(cached.resolve(7).await.unwrap().name, "Late");
    }
}
