use serde::{Deserialize, Serialize};

use crate::matching::EpisodeSelector;
use crate::release::ContentKind;

/// Newznab search function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Search,
    TvSearch,
    Movie,
}

impl SearchMode {
    /// Parse the `t` parameter. `caps` is not a search mode.
    pub fn from_param(t: &str) -> Option<Self> {
        match t {
            "search" => Some(SearchMode::Search),
            "tvsearch" => Some(SearchMode::TvSearch),
            "movie" => Some(SearchMode::Movie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Search => "search",
            SearchMode::TvSearch => "tvsearch",
            SearchMode::Movie => "movie",
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        match self {
            SearchMode::Movie => ContentKind::Movie,
            SearchMode::Search | SearchMode::TvSearch => ContentKind::Tv,
        }
    }
}

/// A parsed search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub mode: SearchMode,
    pub query: Option<String>,
    pub season: Option<i32>,
    pub episode: Option<EpisodeSelector>,
    /// Anchoring show ID. Ignored in movie mode.
    pub tvdb_id: Option<u64>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            query: None,
            season: None,
            episode: None,
            tvdb_id: None,
            offset: 0,
            limit: None,
        }
    }

    /// Show ID the search is anchored to, if any.
    pub fn anchor(&self) -> Option<u64> {
        match self.mode {
            SearchMode::Movie => None,
            SearchMode::Search | SearchMode::TvSearch => self.tvdb_id,
        }
    }

    /// Trimmed query text, `None` when blank.
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_param() {
        assert_eq!(SearchMode::from_param("tvsearch"), Some(SearchMode::TvSearch));
        assert_eq!(SearchMode::from_param("movie"), Some(SearchMode::Movie));
        assert_eq!(SearchMode::from_param("caps"), None);
        assert_eq!(SearchMode::Movie.content_kind(), ContentKind::Movie);
    }

    #[test]
    fn test_anchor_ignored_for_movies() {
        let mut request = SearchRequest::new(SearchMode::Movie);
        request.tvdb_id = Some(42);
        assert_eq!(request.anchor(), None);

        request.mode = SearchMode::TvSearch;
        assert_eq!(request.anchor(), Some(42));
    }

    #[test]
    fn test_query_text() {
        let mut request = SearchRequest::new(SearchMode::Search);
        assert_eq!(request.query_text(), None);
        request.query = Some("   ".to_string());
        assert_eq!(request.query_text(), None);
        request.query = Some(" Tatort ".to_string());
        assert_eq!(request.query_text(), Some("Tatort"));
    }
}
