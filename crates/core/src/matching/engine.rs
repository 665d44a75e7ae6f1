//! Anchored matching: items against a resolved show, via its rulesets or the
//! rule-free fallback when the show has none.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::episodes::SeriesInfo;
use crate::mediathek::RawItem;
use crate::metrics::MATCHES_TOTAL;
use crate::ruleset::{Ruleset, RulesetIndex};

use super::fallback::FallbackPool;
use super::strategy::match_item;
use super::{EpisodeSelector, EpisodeType, MatchedEpisodeInfo};

/// Match items to the show's episodes.
///
/// Only rulesets owned by the show are consulted. When the show has no
/// rulesets at all, the fallback cascade runs per requested episode.
/// Matches outside the requested season/episode are dropped.
pub fn match_show(
    index: &RulesetIndex,
    series: &SeriesInfo,
    items: &[RawItem],
    season: Option<i32>,
    episode: Option<&EpisodeSelector>,
) -> Vec<MatchedEpisodeInfo> {
    let matches = if index.rulesets_for_show(series.tvdb_id).is_empty() {
        debug!(tvdb_id = series.tvdb_id, "No rulesets for show, using fallback");
        match_with_fallback(series, items, season, episode)
    } else {
        match_with_rulesets(index, series, items)
            .into_iter()
            .filter(|m| super::episode_requested(&m.episode, season, episode))
            .collect()
    };

    debug!(
        tvdb_id = series.tvdb_id,
        items = items.len(),
        matches = matches.len(),
        "Matching complete"
    );
    matches
}

/// Ruleset path: each item is matched by at most one ruleset.
pub fn match_with_rulesets(
    index: &RulesetIndex,
    series: &SeriesInfo,
    items: &[RawItem],
) -> Vec<MatchedEpisodeInfo> {
    items
        .iter()
        .filter_map(|item| {
            let rulesets: Vec<Arc<Ruleset>> = index
                .rulesets_for_topic(&item.topic)
                .iter()
                .filter(|r| r.tvdb_id == Some(series.tvdb_id))
                .cloned()
                .collect();
            if rulesets.is_empty() {
                return None;
            }

            let (ruleset, m) = match_item(&rulesets, item, &series.episodes)?;
            MATCHES_TOTAL
                .with_label_values(&[ruleset.strategy.as_str()])
                .inc();

            let show_name = if ruleset.show_name.is_empty() {
                series.name.clone()
            } else {
                ruleset.show_name.clone()
            };
            Some(MatchedEpisodeInfo {
                episode_type: EpisodeType::of(&m.episode),
                matched_title: m.matched_title.unwrap_or_else(|| m.episode.name.clone()),
                episode: m.episode,
                item: item.clone(),
                show_name,
            })
        })
        .collect()
}

/// Fallback path: candidates per requested episode. An item is claimed by
/// the first episode that selects it.
pub fn match_with_fallback(
    series: &SeriesInfo,
    items: &[RawItem],
    season: Option<i32>,
    episode: Option<&EpisodeSelector>,
) -> Vec<MatchedEpisodeInfo> {
    let pool = FallbackPool::new(items);
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut matches = Vec::new();
    for wanted in series
        .episodes
        .iter()
        .filter(|e| super::episode_requested(e, season, episode))
    {
        for item in pool.candidates(wanted) {
            if !claimed.insert(item.dedup_key()) {
                continue;
            }
            MATCHES_TOTAL.with_label_values(&["fallback"]).inc();
            matches.push(MatchedEpisodeInfo {
                episode: wanted.clone(),
                item: item.clone(),
                show_name: series.name.clone(),
                matched_title: wanted.name.clone(),
                episode_type: EpisodeType::of(wanted),
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::MatchingStrategy;
    use crate::testing::fixtures;
    use chrono::NaiveDate;
    use regex_lite::Regex;

    fn numbered_ruleset(id: u64, topic: &str, tvdb_id: u64) -> crate::ruleset::Ruleset {
        let mut ruleset = fixtures::ruleset(id, topic, 1);
        ruleset.tvdb_id = Some(tvdb_id);
        ruleset.strategy = MatchingStrategy::SeasonAndEpisodeNumber;
        ruleset.season_regex = Some(Regex::new(r"S(\d+)").unwrap());
        ruleset.episode_regex = Some(Regex::new(r"E(\d+)").unwrap());
        ruleset
    }

    fn series() -> SeriesInfo {
        fixtures::series(
            100,
            "ShowName",
            vec![
                fixtures::episode("Pilot", 2, 4, None),
                fixtures::episode("Mord im Dorf", 2, 5, None),
                fixtures::episode("Finale", 3, 1, None),
            ],
        )
    }

    #[test]
    fn test_only_rulesets_of_requested_show_are_used() {
        let index = RulesetIndex::build(vec![numbered_ruleset(1, "Show", 999)]);
        let items = vec![fixtures::raw_item("Show", "Show S02E05 Something")];

        let matches = match_with_rulesets(&index, &series(), &items);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_ruleset_match_filtered_by_requested_episode() {
        let index = RulesetIndex::build(vec![numbered_ruleset(1, "Show", 100)]);
        let items = vec![
            fixtures::raw_item("Show", "Show S02E04"),
            fixtures::raw_item("Show", "Show S02E05"),
            fixtures::raw_item("Show", "Show S03E01"),
        ];

        let all = match_show(&index, &series(), &items, None, None);
        assert_eq!(all.len(), 3);

        let season_two = match_show(&index, &series(), &items, Some(2), None);
        assert_eq!(season_two.len(), 2);

        let one = match_show(
            &index,
            &series(),
            &items,
            Some(2),
            Some(&EpisodeSelector::Number(5)),
        );
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].episode.name, "Mord im Dorf");
        assert_eq!(one[0].show_name, "ShowName");
        assert_eq!(one[0].episode_type, EpisodeType::Standard);
    }

    #[test]
    fn test_show_without_rulesets_uses_fallback() {
        let index = RulesetIndex::build(vec![]);
        let items = vec![
            fixtures::raw_item("Show", "Mord im Dorf"),
            fixtures::raw_item("Show", "Etwas anderes"),
        ];

        let matches = match_show(&index, &series(), &items, Some(2), None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].episode.episode_number, 5);
    }

    #[test]
    fn test_fallback_item_claimed_once() {
        let series = fixtures::series(
            100,
            "Daily",
            vec![
                fixtures::episode("Ausgabe", 2024, 1, NaiveDate::from_ymd_opt(2024, 10, 24)),
                fixtures::episode("Ausgabe", 2024, 2, NaiveDate::from_ymd_opt(2024, 10, 25)),
            ],
        );
        let items = vec![fixtures::raw_item("Daily", "Ausgabe vom 24.10.2024")];

        let matches = match_with_fallback(&series, &items, None, None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].episode.episode_number, 1);
        assert_eq!(matches[0].episode_type, EpisodeType::Daily);
    }
}
