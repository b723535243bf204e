//! Apply a [`catalog_engine::filter::Filter`] to an in-memory row set.
//!
//! Every entity table here is small (catalog metadata, not transactional
//! volume), so `find` fetches the full unfiltered row set with one
//! parameterized query and applies predicates/pagination in Rust. This
//! keeps field-name handling out of string-built SQL entirely — no
//! predicate field name ever reaches a query string.

use std::cmp::Ordering;

use catalog_engine::filter::{Filter, Predicate};
use serde::Serialize;
use serde_json::Value;

/// Filter and paginate `rows`, excluding soft-deleted rows unless the
/// filter asked to include them.
pub fn apply<T>(rows: Vec<T>, filter: &Filter, is_deleted: impl Fn(&T) -> bool) -> Vec<T>
where
    T: Serialize,
{
    let mut matched: Vec<T> = rows
        .into_iter()
        .filter(|row| filter.includes_deleted() || !is_deleted(row))
        .filter(|row| matches_predicates(row, filter))
        .collect();

    if let Some(offset) = filter.offset_value() {
        let skip = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        matched = matched.into_iter().skip(skip).collect();
    }
    if let Some(limit) = filter.limit_value() {
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        matched.truncate(take);
    }
    matched
}

fn matches_predicates<T: Serialize>(row: &T, filter: &Filter) -> bool {
    let Ok(Value::Object(fields)) = serde_json::to_value(row) else {
        return false;
    };

    filter.predicates().iter().all(|(field, predicate)| {
        let Some(actual) = fields.get(field) else {
            return false;
        };
        match predicate {
            Predicate::Equals(expected) => actual == expected,
            Predicate::Contains(substring) => actual
                .as_str()
                .is_some_and(|s| s.contains(substring.as_str())),
            Predicate::Between(low, high) => {
                compare(actual, low) != Some(Ordering::Less)
                    && compare(actual, high) != Some(Ordering::Greater)
            }
        }
    })
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
