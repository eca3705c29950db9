use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A typed scalar used in conditions, patches and inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    /// A label of a database enum type. `rank` is the declaration order, which is also
    /// the order Postgres sorts enum values in.
    Enum {
        type_name: &'static str,
        label: &'static str,
        rank: u8,
    },
    Null,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Enum { label, .. } => Some(label),
            _ => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (
                Value::Enum {
                    type_name: ta,
                    rank: ra,
                    ..
                },
                Value::Enum {
                    type_name: tb,
                    rank: rb,
                    ..
                },
            ) if ta == tb => ra.partial_cmp(rb),
            // NULLs sort last, as they do for ascending Postgres order.
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Greater),
            (_, Value::Null) => Some(Ordering::Less),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A constraint on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    /// Case-insensitive substring match on a text field.
    Contains(String),
    /// Inclusive bounds; at least one side is set.
    Range {
        lower: Option<Value>,
        upper: Option<Value>,
    },
}

impl Predicate {
    /// Evaluates the predicate against a field value. A missing field never matches.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Predicate::Eq(expected) => value == expected,
            Predicate::Contains(needle) => value
                .as_text()
                .map(|hay| hay.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Predicate::Range { lower, upper } => {
                let above = lower.as_ref().map_or(true, |l| {
                    matches!(
                        value.partial_cmp(l),
                        Some(Ordering::Greater | Ordering::Equal)
                    ) && *value != Value::Null
                });
                let below = upper.as_ref().map_or(true, |u| {
                    matches!(value.partial_cmp(u), Some(Ordering::Less | Ordering::Equal))
                        && *value != Value::Null
                });
                above && below
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub predicate: Predicate,
}

/// A conjunction of field conditions. The empty set matches every row.
///
/// Conditions are only ever appended, so a scoping condition added by a service can't be
/// replaced by a user-supplied filter on the same field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, predicate: Predicate) -> &mut Self {
        self.conditions.push(Condition { field, predicate });
        self
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.push(field, Predicate::Eq(value.into()));
        self
    }

    /// Adds an equality condition when `value` is `Some`.
    pub fn eq_opt<V: Into<Value>>(self, field: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Adds a substring condition when `term` is a non-empty string.
    pub fn contains(mut self, field: &'static str, term: Option<&str>) -> Self {
        if let Some(term) = term.filter(|t| !t.is_empty()) {
            self.push(field, Predicate::Contains(term.to_string()));
        }
        self
    }

    /// Adds a closed range, a lower bound, an upper bound, or nothing, depending on which
    /// ends are given.
    pub fn range<V: Into<Value>>(
        mut self,
        field: &'static str,
        start: Option<V>,
        end: Option<V>,
    ) -> Self {
        let lower = start.map(Into::into);
        let upper = end.map(Into::into);
        if lower.is_some() || upper.is_some() {
            self.push(field, Predicate::Range { lower, upper });
        }
        self
    }

    pub fn and(mut self, other: ConditionSet) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    pub fn get(&self, field: &str) -> Option<&Predicate> {
        self.conditions
            .iter()
            .find(|c| c.field == field)
            .map(|c| &c.predicate)
    }

    /// True when every condition holds for the fields returned by `lookup`.
    pub fn matches<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<Value>,
    {
        self.conditions
            .iter()
            .all(|c| c.predicate.matches(lookup(c.field).as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_range_shapes() {
        let closed = ConditionSet::new().range("created_at", Some(ts(1)), Some(ts(5)));
        assert_eq!(
            closed.get("created_at"),
            Some(&Predicate::Range {
                lower: Some(Value::Timestamp(ts(1))),
                upper: Some(Value::Timestamp(ts(5))),
            })
        );

        let lower_only = ConditionSet::new().range("created_at", Some(ts(1)), None);
        assert!(matches!(
            lower_only.get("created_at"),
            Some(Predicate::Range { lower: Some(_), upper: None })
        ));

        let none = ConditionSet::new().range::<DateTime<Utc>>("created_at", None, None);
        assert!(none.is_empty());
    }

    #[test]
    fn test_range_is_inclusive() {
        let set = ConditionSet::new().range("created_at", Some(ts(1)), Some(ts(5)));
        for (day, expected) in [(1, true), (3, true), (5, true), (6, false)] {
            let hit = set.matches(|_| Some(Value::Timestamp(ts(day))));
            assert_eq!(hit, expected, "day {}", day);
        }
    }

    #[test]
    fn test_contains_skips_empty_and_ignores_case() {
        assert!(ConditionSet::new().contains("title", Some("")).is_empty());
        assert!(ConditionSet::new().contains("title", None).is_empty());

        let set = ConditionSet::new().contains("title", Some("REPORT"));
        assert!(set.matches(|_| Some(Value::from("Quarterly report draft"))));
        assert!(!set.matches(|_| Some(Value::from("Budget"))));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let owner = Uuid::new_v4();
        let set = ConditionSet::new()
            .eq("user_id", owner)
            .contains("title", Some("plan"));
        let lookup = |title: &'static str, user: Uuid| {
            move |field: &str| match field {
                "user_id" => Some(Value::Uuid(user)),
                "title" => Some(Value::from(title)),
                _ => None,
            }
        };
        assert!(set.matches(lookup("Sprint plan", owner)));
        assert!(!set.matches(lookup("Sprint plan", Uuid::new_v4())));
        assert!(!set.matches(lookup("Retro", owner)));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let set = ConditionSet::new().eq("status", "todo");
        assert!(!set.matches(|_| None));
        assert!(ConditionSet::new().matches(|_| None));
    }

    #[test]
    fn test_and_keeps_both_sides() {
        let owner = Uuid::new_v4();
        let merged = ConditionSet::new()
            .eq("user_id", Uuid::new_v4())
            .and(ConditionSet::new().eq("user_id", owner));
        assert_eq!(merged.len(), 2);
    }
}
