//! The `RolePermission` entity: a many-to-many link between Role and
//! Permission.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A many-to-many link between [`Role`](crate::entities::Role) and
/// [`Permission`](crate::entities::Permission).
///
/// `(role_id, permission_id)` is unique while `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: String,
    pub role_id: String,
    pub permission_id: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<String>,
    pub version: i64,
}

impl RolePermission {
    /// Create a new active role-permission link.
    #[must_use]
    pub fn new(role_id: impl Into<String>, permission_id: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            role_id: role_id.into(),
            permission_id: permission_id.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    /// True if this link contributes to the role's effective permission
    /// set.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_is_effective() {
        let link = RolePermission::new("role-1", "perm-1");
        assert!(link.is_effective());
    }

    #[test]
    fn test_inactive_link_is_not_effective() {
        let mut link = RolePermission::new("role-1", "perm-1");
        link.is_active = false;
        assert!(!link.is_effective());
    }
}
