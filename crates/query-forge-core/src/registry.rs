//! Static mapping tables between backend metadata and the normalized
//! type model: search mapping types, sampled literal shapes, and modal
//! type resolution.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::FieldKind;

/// Maps a search-backend mapping type to its normalized kind.
///
/// `nested` maps to `array`; the extractor fills in the object item kind.
/// Unknown types return `None` and are skipped with a warning upstream.
pub fn kind_for_search_type(backend_type: &str) -> Option<FieldKind> {
    match backend_type {
        "text" | "keyword" => Some(FieldKind::String),
        "integer" | "long" | "double" | "float" => Some(FieldKind::Number),
        "boolean" => Some(FieldKind::Boolean),
        "date" => Some(FieldKind::Date),
        "object" => Some(FieldKind::Object),
        "nested" => Some(FieldKind::Array),
        _ => None,
    }
}

/// Infers a normalized kind from a sampled JSON literal.
///
/// Strings that parse as calendar dates or RFC 3339 timestamps are dates;
/// everything else follows the literal's JSON shape. Nulls carry no type
/// information and return `None`.
pub fn infer_kind(value: &serde_json::Value) -> Option<FieldKind> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(_) => Some(FieldKind::Boolean),
        serde_json::Value::Number(_) => Some(FieldKind::Number),
        serde_json::Value::String(s) => {
            if is_iso_date(s) {
                Some(FieldKind::Date)
            } else {
                Some(FieldKind::String)
            }
        }
        serde_json::Value::Array(_) => Some(FieldKind::Array),
        serde_json::Value::Object(_) => Some(FieldKind::Object),
    }
}

/// True for `yyyy-MM-dd` calendar dates, RFC 3339 timestamps, and the
/// timezone-less `yyyy-MM-ddTHH:mm:ss` spelling.
pub fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
}

/// Parses a date literal into a UTC instant for ordering comparisons.
pub fn parse_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Picks the modal kind from per-kind observation counts.
///
/// Ties break on kind order so repeated samplings of the same data
/// resolve identically. Empty counts return `None`.
pub fn modal_kind(counts: &BTreeMap<FieldKind, usize>) -> Option<FieldKind> {
    counts
        .iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
        .map(|(kind, _)| *kind)
}
