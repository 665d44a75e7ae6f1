//! Heuristics for free-text searches, where no episode list is available.
//!
//! Items are labelled by how much structure their own metadata carries: an
//! embedded season/episode marker or an explicit date is confident, a
//! caller-supplied season alone is uncertain, anything else is no match.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::mediathek::RawItem;

use super::normalize::{extract_dates, has_skip_keyword};
use super::EpisodeSelector;

/// `S02E05`, `s2 e5`.
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,4})\s?E(\d{1,4})\b").unwrap());

/// `(S02/E05)` as used by several broadcasters.
static SLASH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(S(\d{1,4})/E(\d{1,4})\)").unwrap());

/// Requested seasons at or above this are years, as daily shows number them.
const MIN_SEASON_YEAR: i32 = 1900;

static ENGLISH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(Englisch\)").unwrap());

/// How strongly an item's metadata supports its numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    Confident,
    Uncertain,
    NoMatch,
}

/// A free-text hit with whatever numbering could be derived.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeTextMatch {
    pub item: RawItem,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub date: Option<NaiveDate>,
    /// Item title with season/episode and language markers removed.
    pub clean_title: String,
    pub confidence: Confidence,
}

/// Embedded `(season, episode)` marker, if any.
pub fn season_episode_marker(title: &str) -> Option<(i32, i32)> {
    [&*SLASH_MARKER, &*MARKER].iter().find_map(|re| {
        let caps = re.captures(title)?;
        Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
    })
}

fn clean_title(title: &str) -> String {
    let without_markers = SLASH_MARKER.replace_all(title, "");
    let without_markers = MARKER.replace_all(&without_markers, "");
    ENGLISH_MARKER
        .replace_all(&without_markers, "")
        .trim()
        .to_string()
}

/// Label each item. Accessibility variants are dropped, as are items whose
/// own numbering contradicts the requested season or episode.
pub fn classify(
    items: Vec<RawItem>,
    season: Option<i32>,
    episode: Option<&EpisodeSelector>,
) -> Vec<FreeTextMatch> {
    items
        .into_iter()
        .filter(|i| !has_skip_keyword(&i.title))
        .filter_map(|item| classify_item(item, season, episode))
        .collect()
}

fn classify_item(
    item: RawItem,
    requested_season: Option<i32>,
    requested_episode: Option<&EpisodeSelector>,
) -> Option<FreeTextMatch> {
    let marker = season_episode_marker(&item.title);
    let date = extract_dates(&item.title)
        .into_iter()
        .next()
        .or_else(|| extract_dates(&item.description).into_iter().next());

    if let Some((marker_season, marker_episode)) = marker {
        if requested_season.is_some_and(|s| s != marker_season) {
            return None;
        }
        if let Some(EpisodeSelector::Number(n)) = requested_episode {
            if *n != marker_episode {
                return None;
            }
        }
    }
    if let (None, Some(d), Some(year)) = (marker, date, requested_season) {
        if year >= MIN_SEASON_YEAR && year != d.year() {
            return None;
        }
    }
    if let (Some(EpisodeSelector::MonthDay { month, day }), Some(d)) = (requested_episode, date) {
        if d.month() != *month || d.day() != *day {
            return None;
        }
        if requested_season.is_some_and(|year| year != d.year()) {
            return None;
        }
    }

    let (season, episode, confidence) = match (marker, date, requested_season) {
        (Some((s, e)), _, _) => (Some(s), Some(e), Confidence::Confident),
        (None, Some(_), _) => (None, None, Confidence::Confident),
        (None, None, Some(s)) => {
            let e = match requested_episode {
                Some(EpisodeSelector::Number(n)) => Some(*n),
                _ => None,
            };
            (Some(s), e, Confidence::Uncertain)
        }
        (None, None, None) => (None, None, Confidence::NoMatch),
    };

    let clean_title = clean_title(&item.title);
    Some(FreeTextMatch {
        item,
        season,
        episode,
        date,
        clean_title,
        confidence,
    })
}
