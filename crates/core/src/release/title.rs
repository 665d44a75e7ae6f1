//! Release name synthesis.
//!
//! Names follow the scene layout PVR tools parse:
//! `Show.S02E05.Episode.Name.GERMAN.720p.WEB.h264-MEDiATHEK`.

use chrono::NaiveDate;

use crate::matching::Confidence;
use crate::mediathek::{Language, Quality};

/// Release group per confidence level. Downstream consumers filter on these.
pub const GROUP_CONFIDENT: &str = "MEDiATHEK";
pub const GROUP_UNCERTAIN: &str = "MATCH.UNCERTAIN";
pub const GROUP_NO_MATCH: &str = "NO.MATCH";

/// Episode numbering token of a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numbering {
    /// `S02E05`
    SeasonEpisode { season: i32, episode: i32 },
    /// `S02`
    Season(i32),
    /// `2024-10-24`
    Date(NaiveDate),
    None,
}

impl Numbering {
    fn token(&self) -> Option<String> {
        match self {
            Numbering::SeasonEpisode { season, episode } => {
                Some(format!("S{:02}E{:02}", season, episode))
            }
            Numbering::Season(season) => Some(format!("S{:02}", season)),
            Numbering::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
            Numbering::None => None,
        }
    }
}

pub fn release_group(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::Confident => GROUP_CONFIDENT,
        Confidence::Uncertain => GROUP_UNCERTAIN,
        Confidence::NoMatch => GROUP_NO_MATCH,
    }
}

/// Inputs of a release name.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseTitle<'a> {
    pub show: &'a str,
    pub numbering: Numbering,
    pub episode_title: Option<&'a str>,
    pub language: Language,
    pub quality: Quality,
    pub confidence: Confidence,
}

impl ReleaseTitle<'_> {
    /// Build the release name. Pure: equal inputs give byte-identical output.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(7);
        parts.push(sanitize(self.show));
        if let Some(token) = self.numbering.token() {
            parts.push(token);
        }
        if let Some(title) = self.episode_title {
            parts.push(sanitize(title));
        }
        parts.push(self.language.release_tag().to_string());
        parts.push(self.quality.label().to_string());
        parts.push(format!("WEB.h264-{}", release_group(self.confidence)));

        parts.retain(|p| !p.is_empty());
        parts.join(".")
    }
}

/// Make text safe for a release name.
///
/// Umlauts become digraphs (ä → ae, ß → ss), other Latin accents are folded
/// to their base letter, `&` becomes `and`, punctuation is dropped and runs of
/// whitespace and dots collapse to a single dot.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("Ae"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("Oe"),
            '&' => out.push_str(" and "),
            '/' | '–' | '—' | '_' => out.push(' '),
            c if c.is_whitespace() => out.push(' '),
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' => out.push(c),
            c => {
                if let Some(base) = fold_accent(c) {
                    out.push(base);
                }
            }
        }
    }

    out.split([' ', '.'])
        .filter(|s| !s.is_empty() && !s.chars().all(|c| c == '-'))
        .collect::<Vec<_>>()
        .join(".")
}

fn fold_accent(c: char) -> Option<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'å' | 'ā' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Å' | 'Ā' => 'A',
        'ç' | 'č' | 'ć' => 'c',
        'Ç' | 'Č' | 'Ć' => 'C',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' | 'ń' => 'n',
        'Ñ' | 'Ń' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' => 'u',
        'Ù' | 'Ú' | 'Û' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'š' | 'ś' => 's',
        'Š' | 'Ś' => 'S',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        'ł' => 'l',
        'Ł' => 'L',
        _ => return None,
    };
    Some(base)
}
