//! Ruleset types: the wire format served by the metadata API and the
//! compiled form used by the matching engine.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::RulesetError;

/// How a ruleset maps a raw item onto an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchingStrategy {
    SeasonAndEpisodeNumber,
    ItemTitleIncludes,
    ItemTitleExact,
    ItemTitleEqualsAirdate,
}

impl MatchingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingStrategy::SeasonAndEpisodeNumber => "season_and_episode_number",
            MatchingStrategy::ItemTitleIncludes => "item_title_includes",
            MatchingStrategy::ItemTitleExact => "item_title_exact",
            MatchingStrategy::ItemTitleEqualsAirdate => "item_title_equals_airdate",
        }
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    ExactMatch,
    Contains,
    Regex,
    /// Field (seconds) greater than value (minutes).
    GreaterThan,
    /// Field (seconds) less than value (minutes).
    LessThan,
}

/// A single declarative filter of a ruleset.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub kind: FilterKind,
    pub value: String,
    /// Compiled pattern for `Regex` filters. `None` when the pattern did not
    /// compile; such a filter never matches.
    pub pattern: Option<Regex>,
}

/// One segment of a title construction rule list.
#[derive(Debug, Clone)]
pub enum TitleRegexRule {
    /// Literal text.
    Static(String),
    /// Last capture group of `pattern` applied to `field`.
    Regex { field: String, pattern: Regex },
}

/// A compiled ruleset, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub id: u64,
    pub media_id: u64,
    /// External show database ID of the owning show.
    pub tvdb_id: Option<u64>,
    pub show_name: String,
    /// Raw comma-separated topic string.
    pub topic: String,
    /// Lower is evaluated first.
    pub priority: i32,
    pub filters: Vec<Filter>,
    pub title_rules: Vec<TitleRegexRule>,
    pub season_regex: Option<Regex>,
    pub episode_regex: Option<Regex>,
    pub strategy: MatchingStrategy,
}

impl Ruleset {
    /// Topics this ruleset applies to.
    pub fn topics(&self) -> Vec<String> {
        split_topics(&self.topic)
    }

    /// Compile a ruleset as served by the metadata API.
    ///
    /// Filter and title-rule blobs are parsed here, once. A blob that does not
    /// parse, or a title/season/episode pattern that does not compile, rejects
    /// the whole ruleset. A `Regex` filter whose pattern does not compile is
    /// kept but fails closed.
    pub fn compile(raw: RawRuleset) -> Result<Self, RulesetError> {
        let id = raw.id;
        let invalid = |reason: String| RulesetError::InvalidRuleset { id, reason };

        let filters = parse_blob::<Vec<RawFilter>>(raw.filters.as_ref())
            .map_err(|e| invalid(format!("filters: {}", e)))?
            .into_iter()
            .map(|f| {
                let pattern = match f.kind {
                    FilterKind::Regex => Regex::new(&f.value).ok(),
                    _ => None,
                };
                Filter {
                    field: f.attribute,
                    kind: f.kind,
                    value: f.value,
                    pattern,
                }
            })
            .collect();

        let title_rules = parse_blob::<Vec<RawTitleRule>>(raw.title_regex_rules.as_ref())
            .map_err(|e| invalid(format!("title rules: {}", e)))?
            .into_iter()
            .map(|r| match r {
                RawTitleRule::Static { value } => Ok(TitleRegexRule::Static(value)),
                RawTitleRule::Regex { field, pattern } => Regex::new(&pattern)
                    .map(|pattern| TitleRegexRule::Regex { field, pattern })
                    .map_err(|e| invalid(format!("title rule pattern '{}': {}", pattern, e))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let compile_optional = |name: &str, source: Option<&String>| {
            match source.map(|s| s.trim()).filter(|s| !s.is_empty()) {
                Some(p) => Regex::new(p)
                    .map(Some)
                    .map_err(|e| invalid(format!("{} '{}': {}", name, p, e))),
                None => Ok(None),
            }
        };
        let season_regex = compile_optional("season regex", raw.season_regex.as_ref())?;
        let episode_regex = compile_optional("episode regex", raw.episode_regex.as_ref())?;

        Ok(Self {
            id,
            media_id: raw.media_id,
            tvdb_id: raw.media.tvdb_id,
            show_name: raw.media.name,
            topic: raw.topic,
            priority: raw.priority,
            filters,
            title_rules,
            season_regex,
            episode_regex,
            strategy: raw.matching_strategy,
        })
    }
}

/// Split a raw topic string: comma separated, trimmed, empties dropped.
pub fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stored blobs arrive either as JSON-encoded strings or inline arrays.
fn parse_blob<T>(value: Option<&serde_json::Value>) -> Result<T, serde_json::Error>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match value {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(T::default()),
        Some(serde_json::Value::String(s)) => serde_json::from_str(s),
        Some(other) => T::deserialize(other),
    }
}

// Metadata API wire types

/// A ruleset as served by the metadata API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRuleset {
    pub id: u64,
    #[serde(default, alias = "media_id")]
    pub media_id: u64,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub filters: Option<serde_json::Value>,
    #[serde(default, alias = "title_regex_rules")]
    pub title_regex_rules: Option<serde_json::Value>,
    #[serde(default, alias = "season_regex")]
    pub season_regex: Option<String>,
    #[serde(default, alias = "episode_regex")]
    pub episode_regex: Option<String>,
    #[serde(alias = "matching_strategy")]
    pub matching_strategy: MatchingStrategy,
    #[serde(default)]
    pub media: RawMedia,
}

/// Show metadata embedded in a ruleset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default, alias = "media_name")]
    pub name: String,
    #[serde(default, alias = "media_tvdbId", alias = "tvdbId")]
    pub tvdb_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawFilter {
    #[serde(alias = "field")]
    attribute: String,
    #[serde(rename = "type")]
    kind: FilterKind,
    #[serde(deserialize_with = "string_or_number")]
    value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawTitleRule {
    Static { value: String },
    Regex { field: String, pattern: String },
}

/// One page of the paginated ruleset listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesetPage {
    #[serde(default)]
    pub rulesets: Vec<RawRuleset>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> RawRuleset {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_split_topics() {
        assert_eq!(
            split_topics(" Tatort , ,Polizeiruf 110,"),
            vec!["Tatort".to_string(), "Polizeiruf 110".to_string()]
        );
        assert!(split_topics("").is_empty());
        assert!(split_topics(" , ").is_empty());
    }

    #[test]
    fn test_compile_string_encoded_blobs() {
        let ruleset = Ruleset::compile(raw(serde_json::json!({
            "id": 7,
            "mediaId": 3,
            "topic": "Die Anstalt",
            "priority": 1,
            "filters": "[{\"attribute\":\"duration\",\"type\":\"GreaterThan\",\"value\":20}]",
            "titleRegexRules": "[{\"type\":\"static\",\"value\":\"Folge \"},{\"type\":\"regex\",\"field\":\"title\",\"pattern\":\"vom (\\\\d+)\"}]",
            "matchingStrategy": "ItemTitleIncludes",
            "media": {"media_name": "Die Anstalt", "media_tvdbId": 123}
        })))
        .unwrap();

        assert_eq!(ruleset.id, 7);
        assert_eq!(ruleset.tvdb_id, Some(123));
        assert_eq!(ruleset.show_name, "Die Anstalt");
        assert_eq!(ruleset.filters.len(), 1);
        assert_eq!(ruleset.filters[0].kind, FilterKind::GreaterThan);
        assert_eq!(ruleset.filters[0].value, "20");
        assert_eq!(ruleset.title_rules.len(), 2);
        assert!(matches!(ruleset.title_rules[0], TitleRegexRule::Static(ref s) if s == "Folge "));
        assert_eq!(ruleset.strategy, MatchingStrategy::ItemTitleIncludes);
    }

    #[test]
    fn test_compile_inline_blobs_and_patterns() {
        let ruleset = Ruleset::compile(raw(serde_json::json!({
            "id": 1,
            "topic": "Show",
            "filters": [{"attribute": "title", "type": "Regex", "value": "(unclosed"}],
            "seasonRegex": "S(\\d+)",
            "episodeRegex": "E(\\d+)",
            "matchingStrategy": "SeasonAndEpisodeNumber"
        })))
        .unwrap();

        // Bad filter regex is kept but has no compiled pattern.
        assert!(ruleset.filters[0].pattern.is_none());
        assert!(ruleset.season_regex.is_some());
        assert!(ruleset.episode_regex.is_some());
        assert!(ruleset.title_rules.is_empty());
    }

    #[test]
    fn test_compile_rejects_garbage_blob() {
        let result = Ruleset::compile(raw(serde_json::json!({
            "id": 9,
            "topic": "Show",
            "filters": "not json",
            "matchingStrategy": "ItemTitleExact"
        })));
        assert!(matches!(
            result,
            Err(RulesetError::InvalidRuleset { id: 9, .. })
        ));
    }

    #[test]
    fn test_compile_rejects_bad_title_pattern() {
        let result = Ruleset::compile(raw(serde_json::json!({
            "id": 4,
            "topic": "Show",
            "titleRegexRules": [{"type": "regex", "field": "title", "pattern": "(["}],
            "matchingStrategy": "ItemTitleExact"
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_page_deserialization() {
        let page: RulesetPage = serde_json::from_str(
            r#"{"rulesets": [], "pagination": {"currentPage": 2, "totalPages": 5, "perPage": 50}}"#,
        )
        .unwrap();
        assert_eq!(page.pagination.current_page, 2);
        assert_eq!(page.pagination.total_pages, 5);
    }
}
