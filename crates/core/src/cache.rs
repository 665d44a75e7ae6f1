//! TTL cache of rendered search documents.
//!
//! Entries hold the final XML, so a hit skips the whole search pipeline,
//! ruleset refresh included.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::matching::EpisodeSelector;
use crate::metrics::CACHE_LOOKUPS;

/// Identity of a search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a search anchored to a show ID.
    pub fn anchored(
        mode: &str,
        tvdb_id: u64,
        season: Option<i32>,
        episode: Option<&EpisodeSelector>,
        limit: Option<usize>,
    ) -> Self {
        Self(format!(
            "{}|tvdb:{}|{}|{}|{}",
            mode,
            tvdb_id,
            opt(season),
            selector(episode),
            opt(limit)
        ))
    }

    /// Key for a free-text search. Queries differing only in case or
    /// surrounding whitespace share an entry.
    pub fn free_text(
        mode: &str,
        query: &str,
        season: Option<i32>,
        episode: Option<&EpisodeSelector>,
        limit: Option<usize>,
    ) -> Self {
        Self(format!(
            "{}|q:{}|{}|{}|{}",
            mode,
            query.trim().to_lowercase(),
            opt(season),
            selector(episode),
            opt(limit)
        ))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn selector(episode: Option<&EpisodeSelector>) -> String {
    match episode {
        Some(EpisodeSelector::Number(n)) => n.to_string(),
        Some(EpisodeSelector::MonthDay { month, day }) => format!("{:02}/{:02}", month, day),
        None => String::new(),
    }
}

struct CacheEntry {
    document: String,
    expires_at: Instant,
}

/// Rendered documents keyed by request identity.
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cached document, if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let hit = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|e| Instant::now() < e.expires_at)
                .map(|e| e.document.clone())
        };

        let result = if hit.is_some() { "hit" } else { "miss" };
        CACHE_LOOKUPS.with_label_values(&[result]).inc();
        debug!(key = %key, result, "Result cache lookup");
        hit
    }

    /// Store a document, evicting expired entries on the way.
    pub async fn insert(&self, key: CacheKey, document: String) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                document,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
