//! The `Role` entity: a named bundle of permissions.

use catalog_core::CatalogError;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The breadth of a role: `Global` applies everywhere, `Org` applies only
/// within a matching organization context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleScope {
    Global,
    Org,
}

/// A named bundle of permissions, referenced indirectly through
/// [`RolePermission`](crate::entities::RolePermission) (no embedded lists).
///
/// `(service_id, name)` is unique; the `parent_id` graph is a forest (no
/// cycles); an `Org`-scoped role must carry an `organization_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    pub scope: RoleScope,
    pub organization_id: Option<String>,
    pub parent_id: Option<String>,
    pub service_id: String,
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

impl Role {
    /// Create a new active role with a freshly generated id and `version
    /// = 1`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidArgument`] if `scope` is `Org` and
    /// `organization_id` is absent.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        scope: RoleScope,
        organization_id: Option<String>,
        parent_id: Option<String>,
        service_id: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        if scope == RoleScope::Org && organization_id.is_none() {
            return Err(CatalogError::invalid_argument(
                "an ORG-scoped role must carry an organization_id",
            ));
        }

        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: catalog_core::generate_id(),
            name: name.into(),
            description: description.into(),
            scope,
            organization_id,
            parent_id,
            service_id: service_id.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        })
    }

    /// True if this row has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// A role contributes permissions iff it is active and not deleted.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    /// True if, for `Org`-scoped roles, `organization_id` matches the
    /// request context's organization. `Global`-scoped roles always
    /// match.
    #[must_use]
    pub fn matches_scope(&self, context_organization_id: Option<&str>) -> bool {
        match self.scope {
            RoleScope::Global => true,
            RoleScope::Org => {
                self.organization_id.as_deref() == context_organization_id
                    && context_organization_id.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_role_does_not_require_organization() {
        let role = Role::new(
            "admin",
            "full access",
            RoleScope::Global,
            None,
            None,
            "farmers-module",
        )
        .unwrap();
        assert!(role.is_effective());
        assert!(role.matches_scope(None));
        assert!(role.matches_scope(Some("org-A")));
    }

    #[test]
    fn test_org_role_requires_organization_id() {
        let err = Role::new(
            "erp_accountant",
            "org ledger access",
            RoleScope::Org,
            None,
            None,
            "erp-module",
        )
        .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_org_role_scope_matching() {
        let role = Role::new(
            "erp_accountant",
            "org ledger access",
            RoleScope::Org,
            Some("org-A".to_string()),
            None,
            "erp-module",
        )
        .unwrap();
        assert!(role.matches_scope(Some("org-A")));
        assert!(!role.matches_scope(Some("org-B")));
        assert!(!role.matches_scope(None));
    }

    #[test]
    fn test_inactive_role_is_not_effective() {
        let mut role =
            Role::new("farmer", "farmer role", RoleScope::Global, None, None, "farmers-module")
                .unwrap();
        role.is_active = false;
        assert!(!role.is_effective());
    }
}
