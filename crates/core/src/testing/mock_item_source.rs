//! Mock content search for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::mediathek::{ItemQuery, ItemSource, MediathekError, RawItem};

/// Mock implementation of the ItemSource trait.
///
/// Returns the configured items for every query unless a per-query response
/// was registered for the query text. Queries are recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use mediathekarr_core::testing::{MockItemSource, fixtures};
///
/// let source = MockItemSource::new();
/// source.set_items(vec![fixtures::raw_item("Tatort", "Murot")]).await;
/// source.add_response("Polizeiruf 110", vec![]).await;
/// ```
#[derive(Debug, Default)]
pub struct MockItemSource {
    /// Items returned for queries without a dedicated response.
    items: Arc<RwLock<Vec<RawItem>>>,
    /// Responses keyed by the first clause's query text.
    responses: Arc<RwLock<HashMap<String, Vec<RawItem>>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<ItemQuery>>>,
    /// If set, every query fails with this error.
    error: Arc<RwLock<Option<MediathekError>>>,
}

impl MockItemSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the items returned for every query.
    pub async fn set_items(&self, items: Vec<RawItem>) {
        *self.items.write().await = items;
    }

    /// Register a response for one query text.
    pub async fn add_response(&self, query: &str, items: Vec<RawItem>) {
        self.responses
            .write()
            .await
            .insert(query.to_string(), items);
    }

    /// Make every query fail (or succeed again with `None`).
    pub async fn set_error(&self, error: Option<MediathekError>) {
        *self.error.write().await = error;
    }

    pub async fn recorded_queries(&self) -> Vec<ItemQuery> {
        self.queries.read().await.clone()
    }

    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl ItemSource for MockItemSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, query: &ItemQuery) -> Result<Vec<RawItem>, MediathekError> {
        self.queries.write().await.push(query.clone());

        if let Some(err) = self.error.read().await.clone() {
            return Err(err);
        }

        let text = query
            .clauses
            .first()
            .map(|c| c.query.as_str())
            .unwrap_or_default();
        if let Some(items) = self.responses.read().await.get(text) {
            return Ok(items.clone());
        }
        Ok(self.items.read().await.clone())
    }
}
