//! Ruleset store: paginated fetch, topic index, atomic snapshot publication.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::{RULESETS_LOADED, RULESET_REFRESHES};

use super::{RawRuleset, Ruleset, RulesetError, RulesetSource};

/// What caused a refresh. Used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Search,
    Timer,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Startup => "startup",
            RefreshTrigger::Search => "search",
            RefreshTrigger::Timer => "timer",
        }
    }
}

/// Immutable, fully built index of rulesets.
///
/// Every list is sorted by ascending priority (ties broken by id).
#[derive(Debug, Default)]
pub struct RulesetIndex {
    by_topic: HashMap<String, Vec<Arc<Ruleset>>>,
    by_show: HashMap<u64, Vec<Arc<Ruleset>>>,
    count: usize,
    loaded_at: Option<DateTime<Utc>>,
}

impl RulesetIndex {
    pub fn build(rulesets: Vec<Ruleset>) -> Self {
        let mut rulesets: Vec<Arc<Ruleset>> = rulesets.into_iter().map(Arc::new).collect();
        rulesets.sort_by_key(|r| (r.priority, r.id));

        let mut by_topic: HashMap<String, Vec<Arc<Ruleset>>> = HashMap::new();
        let mut by_show: HashMap<u64, Vec<Arc<Ruleset>>> = HashMap::new();
        for ruleset in &rulesets {
            for topic in ruleset.topics() {
                by_topic.entry(topic).or_default().push(Arc::clone(ruleset));
            }
            if let Some(tvdb_id) = ruleset.tvdb_id {
                by_show.entry(tvdb_id).or_default().push(Arc::clone(ruleset));
            }
        }

        Self {
            by_topic,
            by_show,
            count: rulesets.len(),
            loaded_at: Some(Utc::now()),
        }
    }

    /// Rulesets for a topic in priority order; empty when the topic is unknown.
    pub fn rulesets_for_topic(&self, topic: &str) -> &[Arc<Ruleset>] {
        self.by_topic.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rulesets owned by a show in priority order.
    pub fn rulesets_for_show(&self, tvdb_id: u64) -> &[Arc<Ruleset>] {
        self.by_show.get(&tvdb_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// Holds the currently published ruleset index.
///
/// Readers take a cheap `Arc` snapshot; a refresh builds a complete new index
/// and swaps it in, so readers never observe a partially built index.
pub struct RulesetStore {
    source: Arc<dyn RulesetSource>,
    max_pages: u32,
    index: RwLock<Arc<RulesetIndex>>,
}

impl RulesetStore {
    pub fn new(source: Arc<dyn RulesetSource>, max_pages: u32) -> Self {
        Self {
            source,
            max_pages: max_pages.max(1),
            index: RwLock::new(Arc::new(RulesetIndex::default())),
        }
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Arc<RulesetIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Rulesets for a topic from the current snapshot.
    pub async fn rulesets_for_topic(&self, topic: &str) -> Vec<Arc<Ruleset>> {
        self.snapshot().await.rulesets_for_topic(topic).to_vec()
    }

    /// Fetch every page and publish a new index.
    ///
    /// Returns the number of rulesets published. When the first page cannot be
    /// fetched the previous index stays in place and the error is returned.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<usize, RulesetError> {
        let raw = match self.fetch_all().await {
            Ok(raw) => raw,
            Err(e) => {
                RULESET_REFRESHES
                    .with_label_values(&[trigger.as_str(), "error"])
                    .inc();
                return Err(e);
            }
        };

        let fetched = raw.len();
        let rulesets: Vec<Ruleset> = raw
            .into_iter()
            .filter_map(|r| match Ruleset::compile(r) {
                Ok(ruleset) => Some(ruleset),
                Err(e) => {
                    warn!(error = %e, "Dropping ruleset");
                    None
                }
            })
            .collect();

        let index = Arc::new(RulesetIndex::build(rulesets));
        let count = index.len();
        *self.index.write().await = index;

        RULESETS_LOADED.set(count as i64);
        RULESET_REFRESHES
            .with_label_values(&[trigger.as_str(), "success"])
            .inc();
        info!(
            trigger = trigger.as_str(),
            fetched,
            published = count,
            "Ruleset index refreshed"
        );
        Ok(count)
    }

    async fn fetch_all(&self) -> Result<Vec<RawRuleset>, RulesetError> {
        let mut all = Vec::new();
        for page in 1..=self.max_pages {
            let result = match self.source.fetch_page(page).await {
                Ok(result) => result,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Ruleset page fetch failed, keeping pages fetched so far");
                    break;
                }
            };

            all.extend(result.rulesets);
            if result.pagination.current_page >= result.pagination.total_pages {
                break;
            }
            if page == self.max_pages {
                warn!(max_pages = self.max_pages, "Ruleset page cap reached");
            }
        }
        debug!(rulesets = all.len(), "Fetched all ruleset pages");
        Ok(all)
    }

    /// Refresh on a fixed interval until a shutdown signal arrives.
    pub fn spawn_refresh_loop(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Ruleset refresh loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Ruleset refresh loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = self.refresh(RefreshTrigger::Timer).await {
                            warn!(error = %e, "Scheduled ruleset refresh failed");
                        }
                    }
                }
            }
        })
    }
}
