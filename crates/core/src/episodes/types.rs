//! Types for show and episode metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Season numbers above this are calendar years (date-keyed shows).
pub const DAILY_SEASON_THRESHOLD: i32 = 1950;

/// A single episode of a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    #[serde(default)]
    pub aired: Option<NaiveDate>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    pub season_number: i32,
    pub episode_number: i32,
}

impl Episode {
    /// Whether the season number is a year, i.e. the show is keyed by date.
    pub fn is_daily(&self) -> bool {
        self.season_number > DAILY_SEASON_THRESHOLD
    }
}

/// A resolved show with its full episode list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub tvdb_id: u64,
    pub name: String,
    /// German title, when the show has one distinct from `name`.
    #[serde(default)]
    pub german_name: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl SeriesInfo {
    /// Names to query the content search with: the primary name, then the
    /// German name when it differs.
    pub fn search_names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        if let Some(german) = self.german_name.as_deref() {
            let german = german.trim();
            if !german.is_empty() && !german.eq_ignore_ascii_case(&self.name) {
                names.push(german);
            }
        }
        names
    }
}

// Lookup service wire types

#[derive(Debug, Deserialize)]
pub(crate) struct ApiShowResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ApiShow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiShow {
    #[serde(default, alias = "tvdbId", alias = "tvdb_id")]
    pub id: u64,
    pub name: String,
    #[serde(default, alias = "germanName")]
    pub german_name: Option<String>,
    #[serde(default)]
    pub episodes: Vec<ApiEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEpisode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub aired: Option<NaiveDate>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(alias = "season_number")]
    pub season_number: i32,
    #[serde(alias = "episode_number")]
    pub episode_number: i32,
}

impl ApiShow {
    pub(crate) fn into_series(self, requested_id: u64) -> SeriesInfo {
        SeriesInfo {
            tvdb_id: if self.id == 0 { requested_id } else { self.id },
            name: self.name,
            german_name: self.german_name.filter(|n| !n.trim().is_empty()),
            episodes: self
                .episodes
                .into_iter()
                .map(|e| Episode {
                    name: e.name.unwrap_or_default(),
                    aired: e.aired,
                    runtime: e.runtime.filter(|r| *r > 0),
                    season_number: e.season_number,
                    episode_number: e.episode_number,
                })
                .collect(),
        }
    }
}

/// Accepts `yyyy-MM-dd`, optionally followed by a time part; anything else is `None`.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let date_part = s.get(..10).unwrap_or(&s);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_daily() {
        let mut episode = Episode {
            name: "x".to_string(),
            aired: None,
            runtime: None,
            season_number: 3,
            episode_number: 1,
        };
        assert!(!episode.is_daily());
        episode.season_number = 2024;
        assert!(episode.is_daily());
        episode.season_number = 1950;
        assert!(!episode.is_daily());
    }

    #[test]
    fn test_search_names_skips_duplicate_german_name() {
        let mut series = SeriesInfo {
            tvdb_id: 1,
            name: "Tatort".to_string(),
            german_name: Some("tatort".to_string()),
            episodes: vec![],
        };
        assert_eq!(series.search_names(), vec!["Tatort"]);

        series.name = "Crime Scene".to_string();
        assert_eq!(series.search_names(), vec!["Crime Scene", "tatort"]);
    }

    #[test]
    fn test_api_show_conversion() {
        let response: ApiShowResponse = serde_json::from_str(
            r#"{
                "status": "success",
                "data": {
                    "id": 83214,
                    "name": "Tatort",
                    "german_name": "",
                    "episodes": [
                        {"name": "Murot und das Paradies", "aired": "2024-10-24", "runtime": 90, "seasonNumber": 2024, "episodeNumber": 31},
                        {"name": null, "aired": "not a date", "runtime": 0, "seasonNumber": 0, "episodeNumber": 1}
                    ]
                }
            }"#,
        )
        .unwrap();

        let series = response.data.unwrap().into_series(83214);
        assert_eq!(series.german_name, None);
        assert_eq!(series.episodes.len(), 2);
        assert_eq!(
            series.episodes[0].aired,
            NaiveDate::from_ymd_opt(2024, 10, 24)
        );
        assert_eq!(series.episodes[0].runtime, Some(90));
        assert_eq!(series.episodes[1].aired, None);
        assert_eq!(series.episodes[1].runtime, None);
        assert_eq!(series.episodes[1].name, "");
    }
}
