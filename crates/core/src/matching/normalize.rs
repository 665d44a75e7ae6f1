//! Text normalization and German date handling.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// German month names, January first.
pub const GERMAN_MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

const MONTH_ALTERNATION: &str =
    "Januar|Februar|März|April|Mai|Juni|Juli|August|September|Oktober|November|Dezember";

/// Markers of accessibility variants (audio description, sign language,
/// plain language). Matched case-sensitively.
pub const SKIP_KEYWORDS: [&str; 5] = [
    "Audiodeskription",
    "Hörfassung",
    "Gebärdensprache",
    "klare Sprache",
    "Klare Sprache",
];

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b").unwrap());

static NAMED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})\.\s*({})\s+(\d{{4}})\b",
        MONTH_ALTERNATION
    ))
    .unwrap()
});

/// Strict airdate formats, tried in order.
static AIRDATE_FORMATS: Lazy<Vec<(AirdateFormat, Regex)>> = Lazy::new(|| {
    vec![
        (
            AirdateFormat::DayMonthName,
            Regex::new(&format!(r"^(\d{{1,2}})\. ({}) (\d{{4}})$", MONTH_ALTERNATION)).unwrap(),
        ),
        (
            AirdateFormat::DayMonthYear,
            Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").unwrap(),
        ),
        (
            AirdateFormat::IsoDashed,
            Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap(),
        ),
        (
            AirdateFormat::IsoCompact,
            Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap(),
        ),
        (
            AirdateFormat::DayMonthName,
            Regex::new(&format!(r"^(\d{{2}})\. ({}) (\d{{4}})$", MONTH_ALTERNATION)).unwrap(),
        ),
    ]
});

#[derive(Debug, Clone, Copy)]
enum AirdateFormat {
    /// `d. MMMM yyyy` / `dd. MMMM yyyy`
    DayMonthName,
    /// `dd.MM.yyyy`
    DayMonthYear,
    /// `yyyy-MM-dd`
    IsoDashed,
    /// `yyyyMMdd`
    IsoCompact,
}

/// Keep only ASCII letters and German umlauts/ß, lower-cased.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || matches!(c, 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' | 'ß'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Month number (1-12) for a German month name.
pub fn german_month(name: &str) -> Option<u32> {
    GERMAN_MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

/// Parse a constructed title as an air date.
pub fn parse_airdate(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    AIRDATE_FORMATS.iter().find_map(|(format, re)| {
        let caps = re.captures(text)?;
        let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        match format {
            AirdateFormat::DayMonthName => {
                let month = german_month(caps.get(2)?.as_str())?;
                NaiveDate::from_ymd_opt(num(3)? as i32, month, num(1)?)
            }
            AirdateFormat::DayMonthYear => NaiveDate::from_ymd_opt(num(3)? as i32, num(2)?, num(1)?),
            AirdateFormat::IsoDashed | AirdateFormat::IsoCompact => {
                NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?)
            }
        }
    })
}

/// Every date mentioned in free text, numeric form first, then named months.
///
/// Two-digit years are read as 20yy.
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    for caps in NUMERIC_DATE.captures_iter(text) {
        let day = caps[1].parse::<u32>().ok();
        let month = caps[2].parse::<u32>().ok();
        let year = caps[3].parse::<i32>().ok().map(|y| {
            if caps[3].len() == 2 {
                2000 + y
            } else {
                y
            }
        });
        if let (Some(d), Some(m), Some(y)) = (day, month, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                dates.push(date);
            }
        }
    }

    for caps in NAMED_DATE.captures_iter(text) {
        let day = caps[1].parse::<u32>().ok();
        let month = german_month(&caps[2]);
        let year = caps[3].parse::<i32>().ok();
        if let (Some(d), Some(m), Some(y)) = (day, month, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                dates.push(date);
            }
        }
    }

    dates
}

/// Whether the text mentions `date` in either recognised form.
pub fn mentions_date(text: &str, date: NaiveDate) -> bool {
    extract_dates(text).contains(&date)
}

/// Whether the text carries an accessibility-variant marker.
pub fn has_skip_keyword(text: &str) -> bool {
    SKIP_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_ignores_punctuation_and_case() {
        assert_eq!(normalize("Der Tatort: Mörder!"), normalize("DerTatortMörder"));
        assert_eq!(normalize("Der Tatort: Mörder!"), "dertatortmörder");
        assert_eq!(normalize("Folge 12 - Ärger"), "folgeärger");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("Straße & Co. (2024) ÖÜÄ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_extract_numeric_date() {
        assert_eq!(
            extract_dates("Sendung vom 24.10.2024 um 20:15"),
            vec![date(2024, 10, 24)]
        );
        assert_eq!(extract_dates("vom 3.1.24"), vec![date(2024, 1, 3)]);
    }

    #[test]
    fn test_extract_named_month_date() {
        assert_eq!(extract_dates("Folge vom 7. Juni 2024"), vec![date(2024, 6, 7)]);
        assert_eq!(extract_dates("am 1.März 2023"), vec![date(2023, 3, 1)]);
    }

    #[test]
    fn test_extract_rejects_impossible_dates() {
        assert!(extract_dates("Version 31.02.2024").is_empty());
        assert!(extract_dates("keine Angabe").is_empty());
    }

    #[test]
    fn test_parse_airdate_formats() {
        assert_eq!(parse_airdate("7. Juni 2024"), Some(date(2024, 6, 7)));
        assert_eq!(parse_airdate("07. Juni 2024"), Some(date(2024, 6, 7)));
        assert_eq!(parse_airdate("24.10.2024"), Some(date(2024, 10, 24)));
        assert_eq!(parse_airdate("2024-10-24"), Some(date(2024, 10, 24)));
        assert_eq!(parse_airdate("20241024"), Some(date(2024, 10, 24)));
        assert_eq!(parse_airdate(" 2024-10-24 "), Some(date(2024, 10, 24)));
    }

    #[test]
    fn test_parse_airdate_is_strict() {
        assert_eq!(parse_airdate("4.10.2024"), None);
        assert_eq!(parse_airdate("Folge vom 24.10.2024"), None);
        assert_eq!(parse_airdate("7. June 2024"), None);
        assert_eq!(parse_airdate(""), None);
    }

    #[test]
    fn test_skip_keywords_are_case_sensitive() {
        assert!(has_skip_keyword("Tatort (mit Audiodeskription)"));
        assert!(has_skip_keyword("Tagesschau in Gebärdensprache"));
        assert!(!has_skip_keyword("tatort audiodeskription"));
    }
}
