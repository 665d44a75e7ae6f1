//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (content search, ruleset metadata, episode lookup), so the search pipeline
//! and the HTTP layer can be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediathekarr_core::testing::{fixtures, MockEpisodeLookup, MockItemSource, MockRulesetSource};
//!
//! let items = MockItemSource::new();
//! let rulesets = MockRulesetSource::new();
//! let episodes = MockEpisodeLookup::new();
//!
//! items.set_items(vec![fixtures::raw_item("Tatort", "Murot")]).await;
//! rulesets.set_pages(vec![vec![fixtures::raw_ruleset(1, "Tatort", 1)]]).await;
//! episodes.add_series(fixtures::series(42, "Tatort", vec![])).await;
//! ```

mod mock_episode_lookup;
mod mock_item_source;
mod mock_ruleset_source;

pub use mock_episode_lookup::MockEpisodeLookup;
pub use mock_item_source::MockItemSource;
pub use mock_ruleset_source::MockRulesetSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::episodes::{Episode, SeriesInfo};
    use crate::mediathek::{Language, RawItem};
    use crate::ruleset::{MatchingStrategy, RawMedia, RawRuleset, Ruleset};

    /// 2024-10-24 16:00 UTC.
    pub const BROADCAST_TIMESTAMP: i64 = 1_729_785_600;

    fn slug(text: &str) -> String {
        text.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// A raw item offering all three quality tiers, no subtitles.
    ///
    /// URLs are derived from topic and title, so distinct items never share
    /// a permalink.
    pub fn raw_item(topic: &str, title: &str) -> RawItem {
        let slug = slug(&format!("{}-{}", topic, title));
        RawItem {
            channel: "ARD".to_string(),
            topic: topic.to_string(),
            title: title.to_string(),
            description: "Eine Sendung aus der Mediathek.".to_string(),
            timestamp: BROADCAST_TIMESTAMP,
            duration: 1800,
            size: 500 * 1024 * 1024,
            url_website: Some(format!("https://www.ardmediathek.de/video/{}", slug)),
            url_video: Some(format!("https://cdn.example/{}_720.mp4", slug)),
            url_video_low: Some(format!("https://cdn.example/{}_480.mp4", slug)),
            url_video_hd: Some(format!("https://cdn.example/{}_1080.mp4", slug)),
            url_subtitle: None,
            language: Language::detect(title),
        }
    }

    /// An episode with unknown runtime.
    pub fn episode(name: &str, season: i32, episode: i32, aired: Option<NaiveDate>) -> Episode {
        Episode {
            name: name.to_string(),
            aired,
            runtime: None,
            season_number: season,
            episode_number: episode,
        }
    }

    pub fn series(tvdb_id: u64, name: &str, episodes: Vec<Episode>) -> SeriesInfo {
        SeriesInfo {
            tvdb_id,
            name: name.to_string(),
            german_name: None,
            episodes,
        }
    }

    /// A compiled ruleset without filters or title rules, owned by no show.
    pub fn ruleset(id: u64, topic: &str, priority: i32) -> Ruleset {
        Ruleset {
            id,
            media_id: id,
            tvdb_id: None,
            show_name: String::new(),
            topic: topic.to_string(),
            priority,
            filters: Vec::new(),
            title_rules: Vec::new(),
            season_regex: None,
            episode_regex: None,
            strategy: MatchingStrategy::ItemTitleIncludes,
        }
    }

    /// The wire form of [`ruleset`].
    pub fn raw_ruleset(id: u64, topic: &str, priority: i32) -> RawRuleset {
        RawRuleset {
            id,
            media_id: id,
            topic: topic.to_string(),
            priority,
            filters: None,
            title_regex_rules: None,
            season_regex: None,
            episode_regex: None,
            matching_strategy: MatchingStrategy::ItemTitleIncludes,
            media: RawMedia::default(),
        }
    }
}
