//! Translation of user-supplied filters into store-agnostic condition sets.
//!
//! Each domain filter is a plain `Deserialize` struct. It flattens [`TimestampFilter`]
//! for the shared `created_at`/`updated_at` bounds and implements [`ToConditionSet`]
//! for its own fields. Nothing here touches a store.

pub mod condition;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

pub use condition::{Condition, ConditionSet, Predicate, Value};

/// Converts a filter into a [`ConditionSet`]. Must be pure: the same filter always
/// yields an equal set.
pub trait ToConditionSet {
    fn to_condition_set(&self) -> ConditionSet;
}

/// Creation/update time bounds shared by every entity filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampFilter {
    #[serde(default, deserialize_with = "range_start")]
    pub created_at_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub created_at_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_start")]
    pub updated_at_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "range_end")]
    pub updated_at_end: Option<DateTime<Utc>>,
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date. A bare date resolves to
/// the first instant of the day for a lower bound and the last for an upper bound, so
/// both bounds cover the whole day. Blank values are treated as absent.
fn parse_bound(raw: &str, end_of_day: bool) -> Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date {:?}, expected RFC 3339 or YYYY-MM-DD", raw))?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        Some(NaiveTime::MIN)
    };
    Ok(time.map(|t| date.and_time(t).and_utc()))
}

fn deserialize_bound<'de, D>(deserializer: D, end_of_day: bool) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_bound(&raw, end_of_day).map_err(D::Error::custom),
        None => Ok(None),
    }
}

/// Lower bound of a date range; see [`parse_bound`].
pub fn range_start<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, false)
}

/// Upper bound of a date range; see [`parse_bound`].
pub fn range_end<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_bound(deserializer, true)
}

impl ToConditionSet for TimestampFilter {
    fn to_condition_set(&self) -> ConditionSet {
        ConditionSet::new()
            .range("created_at", self.created_at_start, self.created_at_end)
            .range("updated_at", self.updated_at_start, self.updated_at_end)
    }
}

/// Deserializes a raw field map into the filter `F` and translates it.
///
/// Values that don't fit the field type (bad dates, unknown enum labels) are reported
/// as `AppError::BadRequest`.
pub fn translate_filter<F>(raw: &HashMap<String, String>) -> Result<ConditionSet, AppError>
where
    F: DeserializeOwned + ToConditionSet,
{
    let value = serde_json::to_value(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid filter: {}", e)))?;
    let filter: F = serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid filter: {}", e)))?;
    Ok(filter.to_condition_set())
}
