//! Rule-free fallback: find the items most likely to be a given episode
//! using runtime, dates, names and embedded season/episode labels.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::episodes::Episode;
use crate::mediathek::RawItem;

use super::normalize::{extract_dates, has_skip_keyword, normalize};

/// Title-name pools larger than this are too broad to trust.
const MAX_TITLE_POOL: usize = 3;

/// Duration window, in seconds, for an episode runtime in minutes.
pub fn runtime_window(runtime_minutes: u32) -> (f64, f64) {
    let runtime = runtime_minutes as f64;
    let min = (runtime * 0.65).max(5.0) * 60.0;
    let max = runtime * 1.35 * 60.0;
    (min, max)
}

/// Keep items whose duration fits the episode runtime. Unknown or zero
/// runtimes keep everything.
pub fn filter_by_runtime<'a>(episode: &Episode, items: &[&'a RawItem]) -> Vec<&'a RawItem> {
    items
        .iter()
        .copied()
        .filter(|i| fits_runtime(episode, i))
        .collect()
}

fn season_episode_tokens(episode: &Episode) -> (String, String) {
    (
        format!("S{:02}", episode.season_number),
        format!("E{:02}", episode.episode_number),
    )
}

fn fits_runtime(episode: &Episode, item: &RawItem) -> bool {
    match episode.runtime.filter(|r| *r > 0) {
        Some(runtime) => {
            let (min, max) = runtime_window(runtime);
            let duration = item.duration as f64;
            duration >= min && duration <= max
        }
        None => true,
    }
}

/// An eligible item with its extracted text features.
struct Prepared<'a> {
    item: &'a RawItem,
    normalized_title: String,
}

/// Items prepared once for fallback matching against many episodes.
///
/// Date extraction and title normalization run once per item here, so
/// looking up candidates for an episode only compares precomputed values.
pub struct FallbackPool<'a> {
    items: Vec<Prepared<'a>>,
    by_title_date: HashMap<NaiveDate, Vec<usize>>,
    by_description_date: HashMap<NaiveDate, Vec<usize>>,
}

impl<'a> FallbackPool<'a> {
    /// Index the items, dropping accessibility variants.
    pub fn new(items: &'a [RawItem]) -> Self {
        let mut prepared = Vec::new();
        let mut by_title_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        let mut by_description_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();

        for item in items
            .iter()
            .filter(|i| !has_skip_keyword(&i.title) && !has_skip_keyword(&i.description))
        {
            let index = prepared.len();
            for date in dedup_dates(extract_dates(&item.title)) {
                by_title_date.entry(date).or_default().push(index);
            }
            for date in dedup_dates(extract_dates(&item.description)) {
                by_description_date.entry(date).or_default().push(index);
            }
            prepared.push(Prepared {
                item,
                normalized_title: normalize(&item.title),
            });
        }

        Self {
            items: prepared,
            by_title_date,
            by_description_date,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn dated(
        &self,
        index: &HashMap<NaiveDate, Vec<usize>>,
        episode: &Episode,
    ) -> Vec<usize> {
        episode
            .aired
            .and_then(|aired| index.get(&aired))
            .map(|hits| {
                hits.iter()
                    .copied()
                    .filter(|&i| fits_runtime(episode, self.items[i].item))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Candidate items for one episode.
    ///
    /// Pools: title date, description date, normalized title name (dropped
    /// when over-broad), and embedded `SxxEyy` labels, which are only
    /// consulted when the other three pools are all empty.
    pub fn candidates(&self, episode: &Episode) -> Vec<&'a RawItem> {
        let by_title_date = self.dated(&self.by_title_date, episode);
        let by_description_date = self.dated(&self.by_description_date, episode);

        let name = normalize(&episode.name);
        let mut by_name: Vec<usize> = if name.is_empty() {
            Vec::new()
        } else {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.normalized_title.contains(&name) && fits_runtime(episode, p.item)
                })
                .map(|(i, _)| i)
                .collect()
        };
        if by_name.len() > MAX_TITLE_POOL {
            by_name.clear();
        }

        let by_marker: Vec<usize> =
            if by_title_date.is_empty() && by_description_date.is_empty() && by_name.is_empty() {
                let (season, number) = season_episode_tokens(episode);
                self.items
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| {
                        p.item.title.contains(&season)
                            && p.item.title.contains(&number)
                            && fits_runtime(episode, p.item)
                    })
                    .map(|(i, _)| i)
                    .collect()
            } else {
                Vec::new()
            };

        let mut seen = HashSet::new();
        by_title_date
            .into_iter()
            .chain(by_description_date)
            .chain(by_name)
            .chain(by_marker)
            .filter(|i| seen.insert(*i))
            .map(|i| self.items[i].item)
            .collect()
    }
}

fn dedup_dates(mut dates: Vec<NaiveDate>) -> Vec<NaiveDate> {
    dates.sort();
    dates.dedup();
    dates
}

/// Candidate items for one episode. Prefer [`FallbackPool`] when matching
/// several episodes against the same items.
pub fn fallback_candidates<'a>(episode: &Episode, items: &'a [RawItem]) -> Vec<&'a RawItem> {
    FallbackPool::new(items).candidates(episode)
}
