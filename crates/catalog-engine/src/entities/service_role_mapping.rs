//! The `ServiceRoleMapping` entity: audit record of provider role
//! ownership.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Audit record that a given service provider owns a given role.
///
/// `(service_id, role_id)` is unique; `version` increments on each
/// re-seed. This is the only authoritative audit of which provider owns
/// which role, so writing it is a fatal step of the seed (see
/// [`crate::orchestrator`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRoleMapping {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
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

impl ServiceRoleMapping {
    /// Create a new mapping at `version = 1`.
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        service_name: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: catalog_core::generate_id(),
            service_id: service_id.into(),
            service_name: service_name.into(),
            role_id: role_id.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    /// Bump the mapping's version on re-seed.
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mapping_starts_at_version_one() {
        let mapping = ServiceRoleMapping::new("farmers-module", "Farmers Module", "role-1");
        assert_eq!(mapping.version, 1);
    }

    #[test]
    fn test_bump_version_increments() {
        let mut mapping = ServiceRoleMapping::new("farmers-module", "Farmers Module", "role-1");
        mapping.bump_version();
        mapping.bump_version();
        assert_eq!(mapping.version, 3);
    }
}
