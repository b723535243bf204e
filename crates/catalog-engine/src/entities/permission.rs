//! The `Permission` entity: a concrete allowed (resource, action) pair.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A concrete allowed (resource, action) pair.
///
/// `name` is derivable from the pair (`"<resource.name>:<action.name>"`)
/// and is unique, as is `(resource_id, action_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub resource_id: String,
    pub action_id: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<String>,
    pub version: i64,
}

impl Permission {
    /// Derive a permission's canonical name from its resource and action
    /// names: `"<resource.name>:<action.name>"`.
    #[must_use]
    pub fn derive_name(resource_name: &str, action_name: &str) -> String {
        format!("{resource_name}:{action_name}")
    }

    /// Create a new permission with a freshly generated id and `version =
    /// 1`. `name` is derived from `resource_name`/`action_name`.
    #[must_use]
    pub fn new(
        resource_name: &str,
        action_name: &str,
        resource_id: impl Into<String>,
        action_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            name: Self::derive_name(resource_name, action_name),
            resource_id: resource_id.into(),
            action_id: action_id.into(),
            description: description.into(),
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
    fn test_derive_name() {
        assert_eq!(Permission::derive_name("farm", "delete"), "farm:delete");
    }

    #[test]
    fn test_new_permission_name_matches_pair() {
        let perm = Permission::new("farm", "delete", "res-1", "act-1", "delete a farm");
        assert_eq!(perm.name, "farm:delete");
        assert_eq!(perm.resource_id, "res-1");
        assert_eq!(perm.action_id, "act-1");
    }
}
