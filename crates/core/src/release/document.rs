//! Result document synthesis: one entry per matched item and quality tier.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::matching::{Confidence, EpisodeType, FreeTextMatch, MatchedEpisodeInfo};
use crate::mediathek::{Quality, RawItem};

use super::download::DownloadReference;
use super::title::{Numbering, ReleaseTitle};

/// Added to the declared size when a subtitle track exists.
pub const SUBTITLE_SIZE_BONUS: u64 = 15 * 1024 * 1024;

/// Newznab category codes.
pub mod categories {
    pub const MOVIES: u32 = 2000;
    pub const MOVIES_SD: u32 = 2030;
    pub const MOVIES_HD: u32 = 2040;
    pub const TV: u32 = 5000;
    pub const TV_SD: u32 = 5030;
    pub const TV_HD: u32 = 5040;
}

/// What kind of content a search asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Tv,
    Movie,
}

impl ContentKind {
    /// Generic and quality-specific category.
    pub fn categories(&self, quality: Quality) -> (u32, u32) {
        match (self, quality.is_hd()) {
            (ContentKind::Tv, true) => (categories::TV, categories::TV_HD),
            (ContentKind::Tv, false) => (categories::TV, categories::TV_SD),
            (ContentKind::Movie, true) => (categories::MOVIES, categories::MOVIES_HD),
            (ContentKind::Movie, false) => (categories::MOVIES, categories::MOVIES_SD),
        }
    }
}

/// Everything needed to emit the entries of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseCandidate {
    pub item: RawItem,
    pub show_name: String,
    pub episode_title: Option<String>,
    pub numbering: Numbering,
    /// Set when an additional date-keyed entry should be emitted.
    pub daily_date: Option<NaiveDate>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub confidence: Confidence,
    pub kind: ContentKind,
}

impl ReleaseCandidate {
    pub fn from_match(info: &MatchedEpisodeInfo) -> Self {
        let episode = &info.episode;
        let daily_date = match info.episode_type {
            EpisodeType::Daily => Some(episode.aired.unwrap_or_else(|| info.item.broadcast_date())),
            EpisodeType::Standard => None,
        };
        Self {
            item: info.item.clone(),
            show_name: info.show_name.clone(),
            episode_title: Some(episode.name.clone()).filter(|n| !n.trim().is_empty()),
            numbering: Numbering::SeasonEpisode {
                season: episode.season_number,
                episode: episode.episode_number,
            },
            daily_date,
            season: Some(episode.season_number),
            episode: Some(episode.episode_number),
            confidence: Confidence::Confident,
            kind: ContentKind::Tv,
        }
    }

    pub fn from_free_text(m: &FreeTextMatch, kind: ContentKind) -> Self {
        if kind == ContentKind::Movie {
            return Self {
                item: m.item.clone(),
                show_name: m.clean_title.clone(),
                episode_title: None,
                numbering: Numbering::None,
                daily_date: None,
                season: None,
                episode: None,
                confidence: Confidence::Confident,
                kind,
            };
        }

        let numbering = match (m.season, m.episode, m.date) {
            (Some(season), Some(episode), _) => Numbering::SeasonEpisode { season, episode },
            (_, _, Some(date)) => Numbering::Date(date),
            (Some(season), None, None) => Numbering::Season(season),
            (None, _, None) => Numbering::None,
        };
        Self {
            item: m.item.clone(),
            show_name: m.item.topic.clone(),
            episode_title: Some(m.clean_title.clone()).filter(|t| !t.is_empty()),
            numbering,
            daily_date: None,
            season: m.season.or(match numbering {
                Numbering::Date(d) => Some(d.year()),
                _ => None,
            }),
            episode: m.episode,
            confidence: m.confidence,
            kind,
        }
    }
}

/// Newznab attributes of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAttributes {
    pub season: Option<String>,
    pub episode: Option<String>,
    pub subtitles: bool,
    pub series_type: Option<EpisodeType>,
}

/// One result entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub title: String,
    /// Unique per item, quality tier and variant.
    pub guid: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub categories: Vec<u32>,
    pub description: String,
    pub size: u64,
    pub download_url: String,
    pub attributes: EntryAttributes,
}

/// Ordered result entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultDocument {
    pub entries: Vec<ResultEntry>,
}

impl ResultDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep at most `limit` entries.
    pub fn truncate(&mut self, limit: usize) {
        self.entries.truncate(limit);
    }
}

/// Builds result documents; download links point at `public_url`.
#[derive(Debug, Clone)]
pub struct DocumentSynthesizer {
    public_url: String,
}

impl DocumentSynthesizer {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn synthesize(&self, candidates: &[ReleaseCandidate]) -> ResultDocument {
        let mut entries = Vec::new();
        for candidate in candidates {
            for quality in candidate.item.qualities() {
                entries.push(self.entry(candidate, quality, candidate.numbering, false));
                if let Some(date) = candidate.daily_date {
                    entries.push(self.entry(candidate, quality, Numbering::Date(date), true));
                }
            }
        }
        ResultDocument { entries }
    }

    fn entry(
        &self,
        candidate: &ReleaseCandidate,
        quality: Quality,
        numbering: Numbering,
        daily: bool,
    ) -> ResultEntry {
        let item = &candidate.item;
        let video_url = item.video_url(quality).unwrap_or_default();

        let title = ReleaseTitle {
            show: &candidate.show_name,
            numbering,
            episode_title: candidate.episode_title.as_deref(),
            language: item.language,
            quality,
            confidence: candidate.confidence,
        }
        .render();

        let permalink = item.url_website.as_deref().unwrap_or(video_url);
        let guid = format!(
            "{}#{}{}",
            permalink,
            quality.label(),
            if daily { "-daily" } else { "" }
        );

        let mut size = (item.size as f64 * quality.size_factor()) as u64;
        if item.has_subtitles() {
            size += SUBTITLE_SIZE_BONUS;
        }

        let (generic, specific) = candidate.kind.categories(quality);

        let (season, episode) = match (daily, numbering) {
            (true, Numbering::Date(date)) => (
                Some(date.year().to_string()),
                Some(format!("{:02}/{:02}", date.month(), date.day())),
            ),
            _ => (
                candidate.season.map(|s| s.to_string()),
                candidate.episode.map(|e| e.to_string()),
            ),
        };
        let series_type = match candidate.kind {
            ContentKind::Movie => None,
            ContentKind::Tv if daily => Some(EpisodeType::Daily),
            ContentKind::Tv => Some(EpisodeType::Standard),
        };

        let download_url = DownloadReference {
            video_url: video_url.to_string(),
            subtitle_url: item.url_subtitle.clone(),
            title: title.clone(),
        }
        .link(&self.public_url);

        ResultEntry {
            title,
            guid,
            link: permalink.to_string(),
            pub_date: item.broadcast_time(),
            categories: vec![generic, specific],
            description: item.description.clone(),
            size,
            download_url,
            attributes: EntryAttributes {
                season,
                episode,
                subtitles: item.has_subtitles(),
                series_type,
            },
        }
    }
}
