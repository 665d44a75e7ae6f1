//! The Newznab endpoint: `GET /api?t=...`.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use mediathekarr_core::matching::EpisodeSelector;
use mediathekarr_core::release::xml::{error_codes, render_caps, render_error};
use mediathekarr_core::{EpisodeLookupError, SearchError, SearchMode, SearchRequest};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::metrics::NEWZNAB_REQUESTS_TOTAL;
use crate::state::AppState;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Raw query parameters. Everything is kept as text so that malformed
/// values produce a Newznab error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct NewznabParams {
    pub t: Option<String>,
    pub q: Option<String>,
    pub season: Option<String>,
    pub ep: Option<String>,
    pub tvdbid: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub cat: Option<String>,
}

/// A Newznab error document with its HTTP status.
#[derive(Debug, PartialEq, Eq)]
pub struct NewznabError {
    pub status: StatusCode,
    pub code: u32,
    pub description: String,
}

impl NewznabError {
    fn new(status: StatusCode, code: u32, description: impl Into<String>) -> Self {
        Self {
            status,
            code,
            description: description.into(),
        }
    }

    fn incorrect_parameter(name: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INCORRECT_PARAMETER,
            format!("Incorrect parameter: {}", name),
        )
    }
}

impl From<SearchError> for NewznabError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EpisodeLookup(EpisodeLookupError::NotFound(id)) => Self::new(
                StatusCode::NOT_FOUND,
                error_codes::NO_SUCH_ITEM,
                format!("No show with id {}", id),
            ),
            SearchError::EpisodeLookup(e) => Self::new(
                StatusCode::BAD_GATEWAY,
                error_codes::NO_SUCH_ITEM,
                e.to_string(),
            ),
        }
    }
}

impl IntoResponse for NewznabError {
    fn into_response(self) -> Response {
        xml_response(self.status, render_error(self.code, &self.description)).into_response()
    }
}

pub(crate) fn xml_response(status: StatusCode, body: String) -> impl IntoResponse {
    (status, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body)
}

/// What a Newznab call asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum NewznabFunction {
    Caps,
    Search(SearchRequest),
}

impl NewznabParams {
    /// Validate the parameters into a function call.
    pub fn parse(&self) -> Result<NewznabFunction, NewznabError> {
        let t = non_empty(&self.t).ok_or_else(|| {
            NewznabError::new(
                StatusCode::BAD_REQUEST,
                error_codes::MISSING_PARAMETER,
                "Missing parameter: t",
            )
        })?;

        if t == "caps" {
            return Ok(NewznabFunction::Caps);
        }

        let mode = SearchMode::from_param(t).ok_or_else(|| {
            NewznabError::new(
                StatusCode::BAD_REQUEST,
                error_codes::NO_SUCH_FUNCTION,
                format!("No such function: {}", t),
            )
        })?;

        let mut request = SearchRequest::new(mode);
        request.query = non_empty(&self.q).map(str::to_string);
        request.season = parse_number(&self.season, "season")?;
        request.tvdb_id = parse_number(&self.tvdbid, "tvdbid")?;
        request.offset = parse_number(&self.offset, "offset")?.unwrap_or(0);
        request.limit = parse_number(&self.limit, "limit")?;
        request.episode = match non_empty(&self.ep) {
            Some(ep) => Some(
                EpisodeSelector::parse(ep).ok_or_else(|| NewznabError::incorrect_parameter("ep"))?,
            ),
            None => None,
        };

        Ok(NewznabFunction::Search(request))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(value: &Option<String>, name: &str) -> Result<Option<T>, NewznabError> {
    non_empty(value)
        .map(|v| v.parse().map_err(|_| NewznabError::incorrect_parameter(name)))
        .transpose()
}

pub async fn newznab(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewznabParams>,
) -> Result<Response, NewznabError> {
    let function = params.parse().inspect_err(|e| {
        NEWZNAB_REQUESTS_TOTAL.with_label_values(&["invalid"]).inc();
        debug!(code = e.code, description = %e.description, "Rejected Newznab request");
    })?;

    match function {
        NewznabFunction::Caps => {
            NEWZNAB_REQUESTS_TOTAL.with_label_values(&["caps"]).inc();
            Ok(xml_response(StatusCode::OK, render_caps()).into_response())
        }
        NewznabFunction::Search(request) => {
            NEWZNAB_REQUESTS_TOTAL
                .with_label_values(&[request.mode.as_str()])
                .inc();
            if let Some(cat) = non_empty(&params.cat) {
                debug!(cat, "Category filter ignored, categories follow the content");
            }

            let body = state.search().search(&request).await.map_err(|e| {
                warn!(error = %e, tvdb_id = ?request.tvdb_id, "Search failed");
                NewznabError::from(e)
            })?;

            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, RSS_CONTENT_TYPE)],
                body,
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> NewznabParams {
        let mut p = NewznabParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "t" => p.t = value,
                "q" => p.q = value,
                "season" => p.season = value,
                "ep" => p.ep = value,
                "tvdbid" => p.tvdbid = value,
                "offset" => p.offset = value,
                "limit" => p.limit = value,
                "cat" => p.cat = value,
                _ => panic!("unknown param {}", key),
            }
        }
        p
    }

    fn search(pairs: &[(&str, &str)]) -> SearchRequest {
        match params(pairs).parse() {
            Ok(NewznabFunction::Search(request)) => request,
            other => panic!("expected search, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_function() {
        let err = params(&[]).parse().unwrap_err();
        assert_eq!(err.code, error_codes::MISSING_PARAMETER);
        let err = params(&[("t", " ")]).parse().unwrap_err();
        assert_eq!(err.code, error_codes::MISSING_PARAMETER);
    }

    #[test]
    fn test_caps_and_unknown_function() {
        assert_eq!(params(&[("t", "caps")]).parse(), Ok(NewznabFunction::Caps));
        let err = params(&[("t", "music")]).parse().unwrap_err();
        assert_eq!(err.code, error_codes::NO_SUCH_FUNCTION);
    }

    #[test]
    fn test_tvsearch_parameters() {
        let request = search(&[
            ("t", "tvsearch"),
            ("tvdbid", "81189"),
            ("season", "2"),
            ("ep", "5"),
            ("limit", "50"),
            ("cat", "5030,5040"),
        ]);
        assert_eq!(request.mode, SearchMode::TvSearch);
        assert_eq!(request.tvdb_id, Some(81189));
        assert_eq!(request.season, Some(2));
        assert_eq!(request.episode, Some(EpisodeSelector::Number(5)));
        assert_eq!(request.limit, Some(50));
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_daily_episode_selector() {
        let request = search(&[("t", "tvsearch"), ("season", "2024"), ("ep", "10/24")]);
        assert_eq!(
            request.episode,
            Some(EpisodeSelector::MonthDay { month: 10, day: 24 })
        );
    }

    #[test]
    fn test_empty_values_are_absent() {
        let request = search(&[("t", "search"), ("q", ""), ("season", ""), ("tvdbid", "")]);
        assert_eq!(request.query, None);
        assert_eq!(request.season, None);
        assert_eq!(request.tvdb_id, None);
    }

    #[test]
    fn test_incorrect_parameters() {
        for (name, value) in [
            ("season", "two"),
            ("tvdbid", "-1"),
            ("offset", "x"),
            ("limit", "1.5"),
            ("ep", "13/40"),
        ] {
            let err = params(&[("t", "tvsearch"), (name, value)])
                .parse()
                .unwrap_err();
            assert_eq!(err.code, error_codes::INCORRECT_PARAMETER, "{}", name);
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_search_error_mapping() {
        let not_found = NewznabError::from(SearchError::EpisodeLookup(
            EpisodeLookupError::NotFound(7),
        ));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, error_codes::NO_SUCH_ITEM);

        let upstream = NewznabError::from(SearchError::EpisodeLookup(
            EpisodeLookupError::ParseError("bad json".to_string()),
        ));
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.code, error_codes::NO_SUCH_ITEM);
    }
}
