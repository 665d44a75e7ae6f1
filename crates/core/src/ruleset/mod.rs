//! Rulesets: per-show matching configuration served by the metadata API.
//!
//! `RulesetStore` pages through the `RulesetSource`, compiles every ruleset
//! once, indexes them by topic and publishes the index as an immutable
//! snapshot.

mod client;
mod store;
mod types;

pub use client::HttpRulesetSource;
pub use store::{RefreshTrigger, RulesetIndex, RulesetStore};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching or compiling rulesets.
#[derive(Debug, Clone, Error)]
pub enum RulesetError {
    #[error("Ruleset service connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Ruleset service returned HTTP {status} for page {page}")]
    HttpStatus { page: u32, status: u16 },

    #[error("Ruleset service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Ruleset {id} is invalid: {reason}")]
    InvalidRuleset { id: u64, reason: String },

    #[error("Request timeout")]
    Timeout,
}

/// Source of paginated ruleset listings.
#[async_trait]
pub trait RulesetSource: Send + Sync {
    /// Fetch one page (1-based).
    async fn fetch_page(&self, page: u32) -> Result<RulesetPage, RulesetError>;
}
