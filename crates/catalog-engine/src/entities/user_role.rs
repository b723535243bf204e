//! The `UserRole` entity: assignment of a role to a principal.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Assignment of a role to a principal.
///
/// `(user_id, role_id)` is unique while active. An assignment is
/// *effective* iff both this row and the referenced
/// [`Role`](crate::entities::Role) are active.
///
/// Lifecycle: `{created, active} -> deactivated -> {reactivated |
/// deleted}`. Creation requires both the referenced user and role to
/// exist and the role to be active; deactivation sets `is_active = false`
/// but preserves the row for audit; deletion is soft by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
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

impl UserRole {
    /// Create a new active role assignment.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            user_id: user_id.into(),
            role_id: role_id.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    /// True if this assignment row itself is live (active and not
    /// deleted). Whether it is *effective* additionally depends on the
    /// referenced role's state — see
    /// [`Role::is_effective`](crate::entities::Role::is_effective).
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }

    /// Deactivate this assignment, preserving the row for audit.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = OffsetDateTime::now_utc();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assignment_is_live() {
        let ur = UserRole::new("user-1", "role-1");
        assert!(ur.is_live());
    }

    #[test]
    fn test_deactivate_preserves_row() {
        let mut ur = UserRole::new("user-1", "role-1");
        let original_version = ur.version;
        ur.deactivate();
        assert!(!ur.is_active);
        assert!(!ur.is_live());
        assert_eq!(ur.user_id, "user-1");
        assert!(ur.version > original_version);
    }
}
