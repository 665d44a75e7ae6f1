//! Filter evaluation against raw items.

use crate::mediathek::RawItem;
use crate::ruleset::{Filter, FilterKind};

/// True iff every filter matches. An empty list matches everything.
pub fn evaluate(item: &RawItem, filters: &[Filter]) -> bool {
    filters.iter().all(|f| filter_matches(item, f))
}

/// Evaluate one filter. Unknown fields, uncompiled patterns and unparseable
/// numbers never match.
pub fn filter_matches(item: &RawItem, filter: &Filter) -> bool {
    let Some(value) = item.field(&filter.field) else {
        return false;
    };
    let text = value.as_text();

    match filter.kind {
        FilterKind::ExactMatch => text == filter.value,
        FilterKind::Contains => text.contains(filter.value.as_str()),
        FilterKind::Regex => filter
            .pattern
            .as_ref()
            .is_some_and(|re| re.is_match(&text)),
        FilterKind::GreaterThan => {
            compare_minutes(&text, &filter.value).is_some_and(|(field, limit)| field > limit)
        }
        FilterKind::LessThan => {
            compare_minutes(&text, &filter.value).is_some_and(|(field, limit)| field < limit)
        }
    }
}

/// Parse a seconds-valued field and a minutes-valued limit into seconds.
fn compare_minutes(field: &str, minutes: &str) -> Option<(f64, f64)> {
    let field = field.trim().parse::<f64>().ok()?;
    let minutes = minutes.trim().parse::<f64>().ok()?;
    Some((field, minutes * 60.0))
}
