//! The `Action` entity: an operation verb such as `create`, `read`, `post`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An operation verb under access control.
///
/// `(name)` is unique across all actions. Static actions (`is_static =
/// true`) are built-ins that must not be hard- or soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_static: bool,
    pub service_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<String>,
    pub version: i64,
}

impl Action {
    /// Create a new action with a freshly generated id and `version = 1`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        is_static: bool,
        service_id: Option<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            is_static,
            service_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    /// True if this row has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
