//! The Catalog Store contract: one `async_trait` per entity, bundled
//! behind [`CatalogStore`], plus the [`CatalogTransaction`] boundary the
//! Seed Orchestrator opens around a whole seed run.
//!
//! Guarantees callers can rely on: all mutations are transactional at the
//! single-entity level by default; a caller may open an enclosing
//! transaction via [`CatalogStore::begin`] and every per-entity method
//! must honour it. `get_by_name`/`get_by_id` return
//! [`CatalogError::NotFound`](catalog_core::CatalogError::NotFound) as a
//! distinguished signal, never a generic failure. Soft-deleted rows are
//! excluded from `list`/`get_by_id`/`exists` unless the `*_with_deleted`
//! variant is called.

use async_trait::async_trait;
use catalog_core::CatalogResult;

use crate::entities::{Action, Permission, Resource, Role, RolePermission, ServiceRoleMapping, UserRole};
use crate::filter::Filter;

/// Contract for persisting and querying [`Action`] rows.
#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn create(&self, action: Action) -> CatalogResult<Action>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<Action>;
    async fn get_by_name(&self, name: &str) -> CatalogResult<Action>;
    async fn update(&self, action: Action) -> CatalogResult<Action>;
    /// Hard-delete. Rejected with `FailedPrecondition` if `is_static`.
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    /// Soft-delete. Rejected with `FailedPrecondition` if `is_static`.
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()>;
    async fn restore(&self, id: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Action>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Action>>;
}

/// Contract for persisting and querying [`Resource`] rows.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn create(&self, resource: Resource) -> CatalogResult<Resource>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<Resource>;
    async fn get_by_name(&self, name: &str) -> CatalogResult<Resource>;
    async fn update(&self, resource: Resource) -> CatalogResult<Resource>;
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()>;
    async fn restore(&self, id: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Resource>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Resource>>;
}

/// Contract for persisting and querying [`Permission`] rows.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn create(&self, permission: Permission) -> CatalogResult<Permission>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<Permission>;
    async fn get_by_name(&self, name: &str) -> CatalogResult<Permission>;
    async fn get_by_resource_and_action(
        &self,
        resource_id: &str,
        action_id: &str,
    ) -> CatalogResult<Permission>;
    async fn update(&self, permission: Permission) -> CatalogResult<Permission>;
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()>;
    async fn restore(&self, id: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Permission>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Permission>>;
}

/// Contract for persisting and querying [`Role`] rows.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create(&self, role: Role) -> CatalogResult<Role>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<Role>;
    /// Roles are unique on `(service_id, name)`, not on `name` alone.
    async fn get_by_service_and_name(&self, service_id: &str, name: &str) -> CatalogResult<Role>;
    async fn update(&self, role: Role) -> CatalogResult<Role>;
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()>;
    async fn restore(&self, id: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Role>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Role>>;
    /// All roles owned by `service_id`, used by the orchestrator and the
    /// evaluator's cache invalidation sweep.
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<Role>>;
}

/// Contract for persisting and querying [`RolePermission`] links.
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    async fn create(&self, link: RolePermission) -> CatalogResult<RolePermission>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<RolePermission>;
    async fn update(&self, link: RolePermission) -> CatalogResult<RolePermission>;
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<RolePermission>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<RolePermission>>;
    /// Every active link for a role — the orchestrator's "current link
    /// set" in permission attachment (spec step 8).
    async fn list_by_role(&self, role_id: &str) -> CatalogResult<Vec<RolePermission>>;
    async fn list_by_permission(&self, permission_id: &str) -> CatalogResult<Vec<RolePermission>>;
}

/// Contract for persisting and querying [`UserRole`] assignments.
#[async_trait]
pub trait UserRoleStore: Send + Sync {
    async fn create(&self, assignment: UserRole) -> CatalogResult<UserRole>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<UserRole>;
    async fn get_by_user_and_role(&self, user_id: &str, role_id: &str) -> CatalogResult<UserRole>;
    async fn update(&self, assignment: UserRole) -> CatalogResult<UserRole>;
    async fn delete(&self, id: &str) -> CatalogResult<()>;
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<UserRole>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<UserRole>>;
    /// Every live assignment for a principal — the evaluator's entry
    /// point into role resolution (spec §4.5 step 1).
    async fn list_by_user(&self, user_id: &str) -> CatalogResult<Vec<UserRole>>;
}

/// Contract for persisting and querying [`ServiceRoleMapping`] rows: the
/// authoritative audit trail of which provider owns which role.
#[async_trait]
pub trait ServiceRoleMappingStore: Send + Sync {
    async fn create(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping>;
    async fn get_by_id(&self, id: &str) -> CatalogResult<ServiceRoleMapping>;
    async fn get_by_service_and_role(
        &self,
        service_id: &str,
        role_id: &str,
    ) -> CatalogResult<ServiceRoleMapping>;
    async fn update(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping>;
    async fn exists(&self, id: &str) -> CatalogResult<bool>;
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<ServiceRoleMapping>>;
    async fn count(&self) -> CatalogResult<i64>;
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<ServiceRoleMapping>>;
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<ServiceRoleMapping>>;
}

/// An open transaction covering a span of catalog mutations.
///
/// Consumes `self` on completion so a transaction cannot be committed
/// twice or used after rollback. Implementations should also implement
/// `Drop` to roll back (and log) a transaction that is dropped without an
/// explicit commit, as a safety net against a forgotten call on an error
/// path.
#[async_trait]
pub trait CatalogTransaction: Send + Sync {
    /// Commit all mutations made through this transaction.
    async fn commit(self: Box<Self>) -> CatalogResult<()>;
    /// Discard all mutations made through this transaction.
    async fn rollback(self: Box<Self>) -> CatalogResult<()>;

    fn actions(&self) -> &dyn ActionStore;
    fn resources(&self) -> &dyn ResourceStore;
    fn permissions(&self) -> &dyn PermissionStore;
    fn roles(&self) -> &dyn RoleStore;
    fn role_permissions(&self) -> &dyn RolePermissionStore;
    fn user_roles(&self) -> &dyn UserRoleStore;
    fn service_role_mappings(&self) -> &dyn ServiceRoleMappingStore;
}

/// The full catalog store: one accessor per entity plus the ability to
/// open an enclosing transaction for multi-entity operations such as the
/// Seed Orchestrator's run.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    fn actions(&self) -> &dyn ActionStore;
    fn resources(&self) -> &dyn ResourceStore;
    fn permissions(&self) -> &dyn PermissionStore;
    fn roles(&self) -> &dyn RoleStore;
    fn role_permissions(&self) -> &dyn RolePermissionStore;
    fn user_roles(&self) -> &dyn UserRoleStore;
    fn service_role_mappings(&self) -> &dyn ServiceRoleMappingStore;

    /// Open a transaction spanning multiple entity mutations.
    async fn begin(&self) -> CatalogResult<Box<dyn CatalogTransaction>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time object-safety check: every trait in this module must
    // be usable behind `&dyn`/`Box<dyn>`, since the orchestrator and
    // evaluator are written against these traits, not a concrete store.
    fn _assert_action_store_object_safe(_: &dyn ActionStore) {}
    fn _assert_resource_store_object_safe(_: &dyn ResourceStore) {}
    fn _assert_permission_store_object_safe(_: &dyn PermissionStore) {}
    fn _assert_role_store_object_safe(_: &dyn RoleStore) {}
    fn _assert_role_permission_store_object_safe(_: &dyn RolePermissionStore) {}
    fn _assert_user_role_store_object_safe(_: &dyn UserRoleStore) {}
    fn _assert_service_role_mapping_store_object_safe(_: &dyn ServiceRoleMappingStore) {}
    fn _assert_catalog_store_object_safe(_: &dyn CatalogStore) {}
    fn _assert_catalog_transaction_object_safe(_: &dyn CatalogTransaction) {}
}
