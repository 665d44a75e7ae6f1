//! Mock ruleset metadata service for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ruleset::{Pagination, RawRuleset, RulesetError, RulesetPage, RulesetSource};

/// Mock implementation of the RulesetSource trait.
///
/// Serves the configured pages with accurate pagination. With no pages
/// configured it serves a single empty page.
#[derive(Debug, Default)]
pub struct MockRulesetSource {
    pages: Arc<RwLock<Vec<Vec<RawRuleset>>>>,
    /// Pages that answer with a server error.
    failing: Arc<RwLock<HashSet<u32>>>,
    /// Requested page numbers, in order.
    requested: Arc<RwLock<Vec<u32>>>,
}

impl MockRulesetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the served pages; the outer index is the page number minus one.
    pub async fn set_pages(&self, pages: Vec<Vec<RawRuleset>>) {
        *self.pages.write().await = pages;
    }

    /// Make a page fail until `clear_failures` is called.
    pub async fn fail_page(&self, page: u32) {
        self.failing.write().await.insert(page);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl RulesetSource for MockRulesetSource {
    async fn fetch_page(&self, page: u32) -> Result<RulesetPage, RulesetError> {
        self.requested.write().await.push(page);

        if self.failing.read().await.contains(&page) {
            return Err(RulesetError::HttpStatus { page, status: 500 });
        }

        let pages = self.pages.read().await;
        let total_pages = pages.len().max(1) as u32;
        let rulesets = pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();

        Ok(RulesetPage {
            rulesets,
            pagination: Pagination {
                current_page: page,
                total_pages,
            },
        })
    }
}
