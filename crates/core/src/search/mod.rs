//! The search pipeline behind the Newznab endpoint.
//!
//! `SearchService` ties the components together: result cache, ruleset
//! refresh, content search, matching, document synthesis and XML rendering.

mod service;
mod types;

pub use service::SearchService;
pub use types::{SearchMode, SearchRequest};

use thiserror::Error;

use crate::episodes::EpisodeLookupError;

/// Errors surfaced to the caller. Content and ruleset failures are not among
/// them: those degrade to an empty document.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Episode lookup failed: {0}")]
    EpisodeLookup(#[from] EpisodeLookupError),
}
