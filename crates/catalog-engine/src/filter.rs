//! Structured query predicates for [`crate::store::CatalogStore`]'s
//! `find` operation.
//!
//! A [`Filter`] is a small tree of bound predicates, never a string. The
//! store's job is to translate it into parameterized query fragments; a
//! `Filter` cannot itself express unstructured string concatenation into
//! a query, which makes the "rejects unstructured string concatenation"
//! invariant of the catalog store structural rather than a matter of
//! discipline at each call site.

use serde_json::Value;

/// A single predicate against one field.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field equals the given value exactly.
    Equals(Value),
    /// Field (expected to be textual) contains the given substring.
    Contains(String),
    /// Field is between `low` and `high`, inclusive.
    Between(Value, Value),
}

/// A structured filter: a conjunction of named field predicates plus
/// pagination.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<(String, Predicate)>,
    limit: Option<i64>,
    offset: Option<i64>,
    include_deleted: bool,
}

impl Filter {
    /// Start building an empty filter (matches everything, subject to
    /// soft-delete exclusion).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` exactly.
    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push((field.into(), Predicate::Equals(value.into())));
        self
    }

    /// Require `field` (textual) to contain `substring`.
    #[must_use]
    pub fn contains(mut self, field: impl Into<String>, substring: impl Into<String>) -> Self {
        self.predicates
            .push((field.into(), Predicate::Contains(substring.into())));
        self
    }

    /// Require `field` to fall within `[low, high]`.
    #[must_use]
    pub fn between(
        mut self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.predicates
            .push((field.into(), Predicate::Between(low.into(), high.into())));
        self
    }

    /// Limit the number of rows returned.
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` matching rows.
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Include soft-deleted rows in the result (the `*WithDeleted`
    /// variant of a lookup).
    #[must_use]
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// The filter's predicates, in the order they were added.
    #[must_use]
    pub fn predicates(&self) -> &[(String, Predicate)] {
        &self.predicates
    }

    #[must_use]
    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    #[must_use]
    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    #[must_use]
    pub fn includes_deleted(&self) -> bool {
        self.include_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let filter = Filter::new();
        assert!(filter.predicates().is_empty());
        assert!(!filter.includes_deleted());
    }

    #[test]
    fn test_builder_accumulates_predicates() {
        let filter = Filter::new()
            .equals("service_id", "farmers-module")
            .contains("name", "farm")
            .limit(10)
            .offset(5);

        assert_eq!(filter.predicates().len(), 2);
        assert_eq!(filter.limit_value(), Some(10));
        assert_eq!(filter.offset_value(), Some(5));
    }

    #[test]
    fn test_with_deleted_flag() {
        let filter = Filter::new().with_deleted();
        assert!(filter.includes_deleted());
    }
}
