//! Ruleset-driven matching strategies.
//!
//! Each strategy maps a raw item onto at most one episode of the show the
//! ruleset belongs to. `match_item` walks a topic's rulesets in priority
//! order and stops at the first ruleset whose filters pass and whose
//! strategy produces a match.

use std::sync::Arc;

use tracing::trace;

use crate::episodes::Episode;
use crate::mediathek::RawItem;
use crate::ruleset::{MatchingStrategy, Ruleset, TitleRegexRule};

use super::filter::evaluate;
use super::normalize::{normalize, parse_airdate};

/// Result of applying one strategy to one item.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(EpisodeMatch),
    NotApplicable,
}

/// The episode a strategy settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeMatch {
    pub episode: Episode,
    /// Title fragment built from the ruleset's title rules, if any.
    pub matched_title: Option<String>,
}

impl MatchOutcome {
    fn matched(episode: &Episode, matched_title: Option<String>) -> Self {
        MatchOutcome::Matched(EpisodeMatch {
            episode: episode.clone(),
            matched_title,
        })
    }
}

type StrategyFn = fn(&Ruleset, &RawItem, &[Episode]) -> MatchOutcome;

/// Dispatch table, one entry per strategy.
const STRATEGIES: [(MatchingStrategy, StrategyFn); 4] = [
    (
        MatchingStrategy::SeasonAndEpisodeNumber,
        season_and_episode_number,
    ),
    (MatchingStrategy::ItemTitleIncludes, item_title_includes),
    (MatchingStrategy::ItemTitleExact, item_title_exact),
    (
        MatchingStrategy::ItemTitleEqualsAirdate,
        item_title_equals_airdate,
    ),
];

/// Apply the ruleset's own strategy to an item.
pub fn apply_strategy(ruleset: &Ruleset, item: &RawItem, episodes: &[Episode]) -> MatchOutcome {
    STRATEGIES
        .iter()
        .find(|(strategy, _)| *strategy == ruleset.strategy)
        .map(|(_, run)| run(ruleset, item, episodes))
        .unwrap_or(MatchOutcome::NotApplicable)
}

/// First priority-ordered ruleset whose filters pass and whose strategy
/// matches wins; later rulesets are not consulted.
pub fn match_item(
    rulesets: &[Arc<Ruleset>],
    item: &RawItem,
    episodes: &[Episode],
) -> Option<(Arc<Ruleset>, EpisodeMatch)> {
    for ruleset in rulesets {
        if !evaluate(item, &ruleset.filters) {
            continue;
        }
        match apply_strategy(ruleset, item, episodes) {
            MatchOutcome::Matched(m) => {
                trace!(
                    ruleset = ruleset.id,
                    strategy = ruleset.strategy.as_str(),
                    title = %item.title,
                    "Item matched"
                );
                return Some((Arc::clone(ruleset), m));
            }
            MatchOutcome::NotApplicable => continue,
        }
    }
    None
}

/// Concatenate the static segments and the last capture group of each regex
/// segment. Any regex segment that does not match aborts construction.
pub fn construct_title(rules: &[TitleRegexRule], item: &RawItem) -> Option<String> {
    let mut title = String::new();
    for rule in rules {
        match rule {
            TitleRegexRule::Static(text) => title.push_str(text),
            TitleRegexRule::Regex { field, pattern } => {
                let value = item.field(field)?;
                let text = value.as_text();
                let caps = pattern.captures(&text)?;
                let last = caps.get(caps.len() - 1).map(|m| m.as_str()).unwrap_or("");
                title.push_str(last);
            }
        }
    }
    Some(title)
}

fn capture_number(ruleset_pattern: Option<&regex_lite::Regex>, title: &str) -> Option<i32> {
    let caps = ruleset_pattern?.captures(title)?;
    caps.get(1)?.as_str().trim().parse().ok()
}

fn season_and_episode_number(
    ruleset: &Ruleset,
    item: &RawItem,
    episodes: &[Episode],
) -> MatchOutcome {
    let season = capture_number(ruleset.season_regex.as_ref(), &item.title);
    let episode = capture_number(ruleset.episode_regex.as_ref(), &item.title);
    let (Some(season), Some(episode)) = (season, episode) else {
        return MatchOutcome::NotApplicable;
    };

    episodes
        .iter()
        .find(|e| e.season_number == season && e.episode_number == episode)
        .map(|e| MatchOutcome::matched(e, None))
        .unwrap_or(MatchOutcome::NotApplicable)
}

fn item_title_includes(ruleset: &Ruleset, item: &RawItem, episodes: &[Episode]) -> MatchOutcome {
    let Some(title) = construct_title(&ruleset.title_rules, item) else {
        return MatchOutcome::NotApplicable;
    };
    let needle = normalize(&title);
    // Every name contains the empty string.
    if needle.is_empty() {
        return MatchOutcome::NotApplicable;
    }

    episodes
        .iter()
        .find(|e| normalize(&e.name).contains(&needle))
        .map(|e| MatchOutcome::matched(e, Some(title.clone())))
        .unwrap_or(MatchOutcome::NotApplicable)
}

fn item_title_exact(ruleset: &Ruleset, item: &RawItem, episodes: &[Episode]) -> MatchOutcome {
    let Some(title) = construct_title(&ruleset.title_rules, item) else {
        return MatchOutcome::NotApplicable;
    };
    let wanted = normalize(&title);
    if wanted.is_empty() {
        return MatchOutcome::NotApplicable;
    }

    let candidates: Vec<&Episode> = episodes
        .iter()
        .filter(|e| normalize(&e.name) == wanted)
        .collect();

    let chosen = match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        several => {
            let broadcast = item.broadcast_date();
            several
                .iter()
                .find(|e| e.aired == Some(broadcast))
                .or_else(|| {
                    several.iter().fold(None, |best: Option<&&Episode>, e| match best {
                        Some(b) if b.aired >= e.aired => Some(b),
                        _ => Some(e),
                    })
                })
                .copied()
        }
    };

    chosen
        .map(|e| MatchOutcome::matched(e, Some(title)))
        .unwrap_or(MatchOutcome::NotApplicable)
}

fn item_title_equals_airdate(
    ruleset: &Ruleset,
    item: &RawItem,
    episodes: &[Episode],
) -> MatchOutcome {
    let Some(title) = construct_title(&ruleset.title_rules, item) else {
        return MatchOutcome::NotApplicable;
    };
    let Some(date) = parse_airdate(&title) else {
        return MatchOutcome::NotApplicable;
    };

    episodes
        .iter()
        .find(|e| e.aired == Some(date))
        .map(|e| MatchOutcome::matched(e, Some(title.clone())))
        .unwrap_or(MatchOutcome::NotApplicable)
}
