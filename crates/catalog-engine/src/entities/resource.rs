//! The `Resource` entity: a noun under access control.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A noun under access control, e.g. `farmer`, `ledger`, `erp/finance`.
///
/// `(name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    /// Namespace string, e.g. `erp/finance`.
    pub resource_type: String,
    pub description: String,
    pub service_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<String>,
    pub version: i64,
}

impl Resource {
    /// Create a new resource with a freshly generated id and `version = 1`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        resource_type: impl Into<String>,
        description: impl Into<String>,
        service_name: Option<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            name: name.into(),
            resource_type: resource_type.into(),
            description: description.into(),
            service_name,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_resource_not_deleted() {
        let resource = Resource::new("farmer", "farmers-module", "a registered farmer", None);
        assert!(!resource.is_deleted());
        assert_eq!(resource.version, 1);
    }

    #[test]
    fn test_resource_serde_roundtrip() {
        let resource = Resource::new("ledger", "erp/finance", "accounting ledger", None);
        let json = serde_json::to_string(&resource).unwrap();
        let restored: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name, resource.name);
        assert_eq!(restored.resource_type, resource.resource_type);
    }
}
