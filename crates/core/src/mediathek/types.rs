//! Types for the Mediathek content search.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Title marker the broadcasters use for English-language versions.
const ENGLISH_MARKER: &str = "(Englisch)";

/// Spoken language of an item, derived from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    German,
    English,
}

impl Language {
    /// English when the title carries the `(Englisch)` marker.
    pub fn detect(title: &str) -> Self {
        if title.contains(ENGLISH_MARKER) {
            Language::English
        } else {
            Language::German
        }
    }

    /// Language token used in release names.
    pub fn release_tag(&self) -> &'static str {
        match self {
            Language::German => "GERMAN",
            Language::English => "ENGLISH",
        }
    }
}

/// Video quality tier offered by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl Quality {
    /// All tiers, best first.
    pub const ALL: [Quality; 3] = [Quality::P1080, Quality::P720, Quality::P480];

    pub fn label(&self) -> &'static str {
        match self {
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
        }
    }

    /// Multiplier applied to the declared (mid tier) size.
    pub fn size_factor(&self) -> f64 {
        match self {
            Quality::P1080 => 1.6,
            Quality::P720 => 1.0,
            Quality::P480 => 0.4,
        }
    }

    pub fn is_hd(&self) -> bool {
        !matches!(self, Quality::P480)
    }
}

/// A single raw search hit from the content API. Immutable once retrieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawItem {
    pub channel: String,
    pub topic: String,
    pub title: String,
    pub description: String,
    /// Broadcast time, unix seconds.
    pub timestamp: i64,
    /// Runtime in seconds.
    pub duration: u64,
    /// Declared size in bytes (mid tier).
    pub size: u64,
    /// Permalink on the broadcaster site.
    pub url_website: Option<String>,
    pub url_video: Option<String>,
    pub url_video_low: Option<String>,
    pub url_video_hd: Option<String>,
    pub url_subtitle: Option<String>,
    pub language: Language,
}

/// A field value as seen by filters and title rules.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl FieldValue<'_> {
    /// String representation used for text comparisons and regexes.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl RawItem {
    /// Look up a field by its API name. Unknown names yield `None`; absent
    /// URLs read as empty text.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "channel" => Some(FieldValue::Text(&self.channel)),
            "topic" => Some(FieldValue::Text(&self.topic)),
            "title" => Some(FieldValue::Text(&self.title)),
            "description" => Some(FieldValue::Text(&self.description)),
            "timestamp" => Some(FieldValue::Number(self.timestamp)),
            "duration" => Some(FieldValue::Number(self.duration as i64)),
            "size" => Some(FieldValue::Number(self.size as i64)),
            "url_website" => Some(url_field(&self.url_website)),
            "url_video" => Some(url_field(&self.url_video)),
            "url_video_low" => Some(url_field(&self.url_video_low)),
            "url_video_hd" => Some(url_field(&self.url_video_hd)),
            "url_subtitle" => Some(url_field(&self.url_subtitle)),
            _ => None,
        }
    }

    /// Video URL for a quality tier, if offered.
    pub fn video_url(&self, quality: Quality) -> Option<&str> {
        match quality {
            Quality::P1080 => self.url_video_hd.as_deref(),
            Quality::P720 => self.url_video.as_deref(),
            Quality::P480 => self.url_video_low.as_deref(),
        }
    }

    /// Tiers this item actually offers, best first.
    pub fn qualities(&self) -> Vec<Quality> {
        Quality::ALL
            .into_iter()
            .filter(|q| self.video_url(*q).is_some())
            .collect()
    }

    pub fn has_subtitles(&self) -> bool {
        self.url_subtitle.is_some()
    }

    pub fn broadcast_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default()
    }

    /// Broadcast date (UTC).
    pub fn broadcast_date(&self) -> NaiveDate {
        self.broadcast_time().date_naive()
    }

    /// Key used to drop duplicates when merging several queries.
    pub fn dedup_key(&self) -> &str {
        self.url_website
            .as_deref()
            .or(self.url_video.as_deref())
            .unwrap_or(&self.title)
    }
}

fn url_field(url: &Option<String>) -> FieldValue<'_> {
    FieldValue::Text(url.as_deref().unwrap_or(""))
}

/// One clause of a content query: the text is matched against `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryClause {
    pub fields: Vec<String>,
    pub query: String,
}

/// A content query. An empty clause list lists the newest items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemQuery {
    pub clauses: Vec<QueryClause>,
}

impl ItemQuery {
    /// Match a show name against the topic field.
    pub fn topic(name: &str) -> Self {
        Self {
            clauses: vec![QueryClause {
                fields: vec!["topic".to_string()],
                query: name.to_string(),
            }],
        }
    }

    /// Match free text against topic and title.
    pub fn free_text(text: &str) -> Self {
        Self {
            clauses: vec![QueryClause {
                fields: vec!["topic".to_string(), "title".to_string()],
                query: text.to_string(),
            }],
        }
    }

    /// Newest items, no filtering.
    pub fn newest() -> Self {
        Self::default()
    }
}

// Content API wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiQueryRequest<'a> {
    pub queries: &'a [QueryClause],
    pub sort_by: &'static str,
    pub sort_order: &'static str,
    pub future: bool,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiQueryResponse {
    pub result: Option<ApiQueryResult>,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiQueryResult {
    #[serde(default)]
    pub results: Vec<ApiItem>,
    #[serde(default)]
    pub query_info: Option<ApiQueryInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiQueryInfo {
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiItem {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub duration: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub size: i64,
    #[serde(default)]
    pub url_website: Option<String>,
    #[serde(default)]
    pub url_video: Option<String>,
    #[serde(default)]
    pub url_video_low: Option<String>,
    #[serde(default)]
    pub url_video_hd: Option<String>,
    #[serde(default)]
    pub url_subtitle: Option<String>,
}

impl From<ApiItem> for RawItem {
    fn from(api: ApiItem) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let language = Language::detect(&api.title);
        Self {
            channel: api.channel,
            topic: api.topic,
            title: api.title,
            description: api.description,
            timestamp: api.timestamp,
            duration: api.duration.max(0) as u64,
            size: api.size.max(0) as u64,
            url_website: non_empty(api.url_website),
            url_video: non_empty(api.url_video),
            url_video_low: non_empty(api.url_video_low),
            url_video_hd: non_empty(api.url_video_hd),
            url_subtitle: non_empty(api.url_subtitle),
            language,
        }
    }
}

/// The API sends numbers, numeric strings, empty strings or null for the same
/// field depending on the broadcaster. Anything unparseable becomes 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
