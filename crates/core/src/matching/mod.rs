//! Episode matching.
//!
//! - `filter`: declarative ruleset filters
//! - `strategy`: the four ruleset strategies and their ordered dispatcher
//! - `fallback`: rule-free candidate pools for a known episode
//! - `freetext`: confidence heuristics for searches without a show ID
//! - `engine`: anchored matching tying the above together

mod engine;
mod fallback;
mod filter;
mod freetext;
mod normalize;
mod strategy;

pub use engine::{match_show, match_with_fallback, match_with_rulesets};
pub use fallback::{fallback_candidates, filter_by_runtime, runtime_window, FallbackPool};
pub use filter::{evaluate, filter_matches};
pub use freetext::{classify, season_episode_marker, Confidence, FreeTextMatch};
pub use normalize::{
    extract_dates, german_month, has_skip_keyword, mentions_date, normalize, parse_airdate,
    GERMAN_MONTHS, SKIP_KEYWORDS,
};
pub use strategy::{apply_strategy, construct_title, match_item, EpisodeMatch, MatchOutcome};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::episodes::Episode;
use crate::mediathek::RawItem;

/// Whether an episode is keyed by season/episode or by air date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Standard,
    Daily,
}

impl EpisodeType {
    pub fn of(episode: &Episode) -> Self {
        if episode.is_daily() {
            EpisodeType::Daily
        } else {
            EpisodeType::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeType::Standard => "standard",
            EpisodeType::Daily => "daily",
        }
    }
}

/// An item resolved to a specific episode.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEpisodeInfo {
    pub episode: Episode,
    pub item: RawItem,
    /// Show name used in release titles.
    pub show_name: String,
    /// Title fragment the match was made on.
    pub matched_title: String,
    pub episode_type: EpisodeType,
}

/// The `ep` search parameter: an episode number, or `MM/DD` for daily shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeSelector {
    Number(i32),
    MonthDay { month: u32, day: u32 },
}

impl EpisodeSelector {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some((month, day)) = raw.split_once('/') {
            let month: u32 = month.trim().parse().ok()?;
            let day: u32 = day.trim().parse().ok()?;
            if (1..=12).contains(&month) && (1..=31).contains(&day) {
                return Some(EpisodeSelector::MonthDay { month, day });
            }
            return None;
        }
        raw.parse().ok().map(EpisodeSelector::Number)
    }

    pub fn matches(&self, episode: &Episode) -> bool {
        match self {
            EpisodeSelector::Number(n) => episode.episode_number == *n,
            EpisodeSelector::MonthDay { month, day } => episode
                .aired
                .is_some_and(|d| d.month() == *month && d.day() == *day),
        }
    }
}

/// Whether an episode satisfies the requested season and episode.
pub fn episode_requested(
    episode: &Episode,
    season: Option<i32>,
    selector: Option<&EpisodeSelector>,
) -> bool {
    season.is_none_or(|s| episode.season_number == s)
        && selector.is_none_or(|sel| sel.matches(episode))
}
