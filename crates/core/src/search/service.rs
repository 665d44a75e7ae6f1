//! Search service - runs one Newznab search end to end.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::episodes::{EpisodeLookup, SeriesInfo};
use crate::matching::{classify, match_show};
use crate::mediathek::{ItemQuery, ItemSource, RawItem};
use crate::metrics::{RESULT_ENTRIES, SEARCHES_TOTAL};
use crate::release::{xml, DocumentSynthesizer, ReleaseCandidate, ResultDocument};
use crate::ruleset::{RefreshTrigger, RulesetStore};

use super::types::{SearchMode, SearchRequest};
use super::SearchError;

/// A built document and whether an upstream failure shaped it.
struct Outcome {
    document: ResultDocument,
    degraded: bool,
}

/// Coordinates cache, rulesets, content search, matching and synthesis.
pub struct SearchService {
    items: Arc<dyn ItemSource>,
    rulesets: Arc<RulesetStore>,
    episodes: Arc<dyn EpisodeLookup>,
    cache: ResultCache,
    synthesizer: DocumentSynthesizer,
    feed_link: String,
    refresh_on_search: bool,
}

impl SearchService {
    pub fn new(
        items: Arc<dyn ItemSource>,
        rulesets: Arc<RulesetStore>,
        episodes: Arc<dyn EpisodeLookup>,
        public_url: &str,
        cache_ttl: Duration,
    ) -> Self {
        let public_url = public_url.trim_end_matches('/').to_string();
        Self {
            items,
            rulesets,
            episodes,
            cache: ResultCache::new(cache_ttl),
            synthesizer: DocumentSynthesizer::new(public_url.clone()),
            feed_link: public_url,
            refresh_on_search: true,
        }
    }

    /// Refresh the ruleset index before every uncached search (default on).
    pub fn with_refresh_on_search(mut self, enabled: bool) -> Self {
        self.refresh_on_search = enabled;
        self
    }

    pub fn rulesets(&self) -> &Arc<RulesetStore> {
        &self.rulesets
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Run a search and return the rendered Newznab feed.
    ///
    /// Only episode lookup failures on anchored searches are errors; any
    /// other upstream failure yields a valid, possibly empty, feed that is
    /// not cached.
    pub async fn search(&self, request: &SearchRequest) -> Result<String, SearchError> {
        let mode = request.mode.as_str();

        // The complete set is always returned on the first page.
        if request.offset > 0 {
            debug!(mode, offset = request.offset, "Offset beyond single page");
            SEARCHES_TOTAL.with_label_values(&[mode, "ok"]).inc();
            return Ok(xml::render_results(
                &ResultDocument::empty(),
                &self.feed_link,
                request.offset,
            ));
        }

        let key = self.cache_key(request);
        if let Some(cached) = self.cache.get(&key).await {
            SEARCHES_TOTAL.with_label_values(&[mode, "cached"]).inc();
            return Ok(cached);
        }

        let mut degraded = false;
        if self.refresh_on_search {
            if let Err(e) = self.rulesets.refresh(RefreshTrigger::Search).await {
                warn!(error = %e, "Ruleset refresh failed, using previous index");
                degraded = true;
            }
        }

        let outcome = match request.anchor() {
            Some(tvdb_id) => match self.search_anchored(tvdb_id, request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(tvdb_id, error = %e, "Anchored search failed");
                    SEARCHES_TOTAL.with_label_values(&[mode, "error"]).inc();
                    return Err(e);
                }
            },
            None => self.search_free_text(request).await,
        };
        degraded |= outcome.degraded;

        let mut document = outcome.document;
        if let Some(limit) = request.limit {
            document.truncate(limit);
        }
        RESULT_ENTRIES
            .with_label_values(&[])
            .observe(document.total() as f64);

        let rendered = xml::render_results(&document, &self.feed_link, 0);
        if degraded {
            SEARCHES_TOTAL.with_label_values(&[mode, "degraded"]).inc();
        } else {
            self.cache.insert(key, rendered.clone()).await;
            SEARCHES_TOTAL.with_label_values(&[mode, "ok"]).inc();
        }

        info!(
            mode,
            query = request.query_text().unwrap_or(""),
            tvdb_id = ?request.anchor(),
            season = ?request.season,
            entries = document.total(),
            degraded,
            "Search complete"
        );
        Ok(rendered)
    }

    fn cache_key(&self, request: &SearchRequest) -> CacheKey {
        let mode = request.mode.as_str();
        match request.anchor() {
            Some(tvdb_id) => CacheKey::anchored(
                mode,
                tvdb_id,
                request.season,
                request.episode.as_ref(),
                request.limit,
            ),
            None => CacheKey::free_text(
                mode,
                request.query_text().unwrap_or(""),
                request.season,
                request.episode.as_ref(),
                request.limit,
            ),
        }
    }

    async fn search_anchored(
        &self,
        tvdb_id: u64,
        request: &SearchRequest,
    ) -> Result<Outcome, SearchError> {
        let series = self.episodes.resolve(tvdb_id).await?;
        let (items, degraded) = self.fetch_show_items(&series).await;

        let index = self.rulesets.snapshot().await;
        let matches = match_show(
            &index,
            &series,
            &items,
            request.season,
            request.episode.as_ref(),
        );
        let candidates: Vec<ReleaseCandidate> =
            matches.iter().map(ReleaseCandidate::from_match).collect();

        Ok(Outcome {
            document: self.synthesizer.synthesize(&candidates),
            degraded,
        })
    }

    /// Items for every name the show is known by, merged and de-duplicated.
    async fn fetch_show_items(&self, series: &SeriesInfo) -> (Vec<RawItem>, bool) {
        let queries: Vec<ItemQuery> = series
            .search_names()
            .into_iter()
            .map(ItemQuery::topic)
            .collect();
        let results = futures::future::join_all(queries.iter().map(|q| self.items.query(q))).await;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut degraded = false;
        for result in results {
            match result {
                Ok(batch) => {
                    for item in batch {
                        if seen.insert(item.dedup_key().to_string()) {
                            items.push(item);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        source = self.items.name(),
                        tvdb_id = series.tvdb_id,
                        error = %e,
                        "Content search failed"
                    );
                    degraded = true;
                }
            }
        }
        debug!(tvdb_id = series.tvdb_id, items = items.len(), "Fetched show items");
        (items, degraded)
    }

    async fn search_free_text(&self, request: &SearchRequest) -> Outcome {
        let query = match request.query_text() {
            Some(text) => ItemQuery::free_text(text),
            None => ItemQuery::newest(),
        };

        let items = match self.items.query(&query).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = self.items.name(), error = %e, "Content search failed");
                return Outcome {
                    document: ResultDocument::empty(),
                    degraded: true,
                };
            }
        };

        let season = match request.mode {
            SearchMode::Movie => None,
            SearchMode::Search | SearchMode::TvSearch => request.season,
        };
        let kind = request.mode.content_kind();
        let candidates: Vec<ReleaseCandidate> = classify(items, season, request.episode.as_ref())
            .iter()
            .map(|m| ReleaseCandidate::from_free_text(m, kind))
            .collect();

        Outcome {
            document: self.synthesizer.synthesize(&candidates),
            degraded: false,
        }
    }
}
