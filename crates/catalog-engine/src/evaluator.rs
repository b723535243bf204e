//! The Authorization Evaluator: decides allow/deny for a `(principal,
//! resource-type, resource-id, action)` tuple.
//!
//! Resolution follows spec §4.5: fetch the principal's effective
//! UserRole rows (active assignment, active role, scope-matched against
//! the request context), expand the role forest to include transitive
//! parents, collect the union of active RolePermission links, resolve
//! them to Permission names, and check the query against that set under
//! the wildcard matching rule of [`crate::wildcard`]. Missing data is
//! always Deny, never an error — the evaluator never raises on a
//! permission/resource-type it doesn't recognize.

use std::collections::HashSet;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::cache::{EffectivePermission, PermissionCache};
use crate::entities::Role;
use crate::store::CatalogStore;
use crate::wildcard;

/// The ambient request context an evaluation is performed under. Carries
/// the organization identifier used to filter ORG-scoped roles.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub organization_id: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_organization(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(organization_id.into()),
        }
    }
}

/// The outcome of a permission check, with enough detail for audit
/// logging and for callers that want to explain a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub matched_permission: Option<String>,
    pub matched_role: Option<String>,
    pub reason: String,
}

impl Decision {
    fn allow(matched_permission: impl Into<String>, matched_role: impl Into<String>) -> Self {
        Self {
            allowed: true,
            matched_permission: Some(matched_permission.into()),
            matched_role: Some(matched_role.into()),
            reason: "matched permission".to_string(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            matched_permission: None,
            matched_role: None,
            reason: reason.into(),
        }
    }
}

/// For a `(principal, resource-type, resource-id, action)` tuple,
/// resolves the principal's active roles (direct and inherited), their
/// effective permissions, and decides allow/deny.
///
/// Read-only and side-effect-free except for the optional permission
/// cache, which only ever shortens a subsequent read — it is never
/// consulted to produce a decision inconsistent with storage (a cache
/// miss always falls through to a fresh read).
pub struct AuthorizationEvaluator {
    store: Arc<dyn CatalogStore>,
    cache: Option<Arc<PermissionCache>>,
}

impl AuthorizationEvaluator {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store, cache: None }
    }

    #[must_use]
    pub fn with_cache(store: Arc<dyn CatalogStore>, cache: Arc<PermissionCache>) -> Self {
        Self {
            store,
            cache: Some(cache),
        }
    }

    /// Decide whether `principal_id` may perform `action` on
    /// `resource_type` (the `resource_id` of the specific instance is
    /// accepted for audit/reason purposes but the catalog's permission
    /// model is type-level, not instance-level, per spec §4.2).
    pub async fn check_permission(
        &self,
        principal_id: &str,
        resource_type: &str,
        resource_id: &str,
        action: &str,
        context: &RequestContext,
    ) -> Decision {
        let query = format!("{resource_type}:{action}");

        let (effective, scope_excluded) =
            match self.effective_permissions(principal_id, context).await {
                Ok(result) => result,
                Err(reason) => {
                    tracing::warn!(
                        principal_id,
                        resource_type,
                        resource_id,
                        action,
                        reason = %reason,
                        "evaluator resolution failed, denying"
                    );
                    return Decision::deny(reason);
                }
            };

        if effective.is_empty() {
            if scope_excluded {
                return Decision::deny("scope mismatch");
            }
            return Decision::deny("no effective roles");
        }

        for effective_permission in effective.iter() {
            if wildcard::matches(&query, &effective_permission.permission_name) {
                return Decision::allow(
                    query.clone(),
                    effective_permission.role_name.clone(),
                );
            }
        }

        Decision::deny("no matching permission")
    }

    /// Resolve the effective `(permission_name, role_name)` set for a
    /// principal under `context`, consulting the cache first when one is
    /// configured.
    ///
    /// Returns `Err(reason)` only for a configuration-level failure (a
    /// cycle observed in the role-parent graph); a principal with no
    /// roles at all simply resolves to an empty set, which is Deny, not
    /// an error.
    ///
    /// Returns the effective permission set alongside a `scope_excluded`
    /// flag: `true` iff at least one live, active role assignment was
    /// excluded *solely* because its scope didn't match `context` (as
    /// opposed to being inactive, deleted, or missing). `check_permission`
    /// uses this to distinguish the `"scope mismatch"` reason from the
    /// generic `"no effective roles"` one.
    async fn effective_permissions(
        &self,
        principal_id: &str,
        context: &RequestContext,
    ) -> Result<(Arc<Vec<EffectivePermission>>, bool), String> {
        let user_roles = self
            .store
            .user_roles()
            .list_by_user(principal_id)
            .await
            .map_err(|e| format!("internal: {e}"))?;

        let live_user_roles: Vec<_> = user_roles.into_iter().filter(|ur| ur.is_live()).collect();
        if live_user_roles.is_empty() {
            return Ok((Arc::new(Vec::new()), false));
        }

        // The version stamp covers UserRole and direct-role `updated_at`
        // only, not the transitive parent forest or RolePermission links
        // underneath it: reaching those cheaply would require doing the
        // same resolution work the cache exists to avoid. A mutation to
        // those deeper rows (re-seeding, permission attachment) is
        // expected to call `PermissionCache::invalidate` explicitly
        // rather than rely on the stamp to notice it — see
        // `CatalogFacade` call sites.
        let mut direct_roles = Vec::new();
        let mut scope_excluded = false;
        for user_role in &live_user_roles {
            let role = match self.store.roles().get_by_id(&user_role.role_id).await {
                Ok(role) => role,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(format!("internal: {e}")),
            };
            if !role.is_effective() {
                continue;
            }
            if !role.matches_scope(context.organization_id.as_deref()) {
                scope_excluded = true;
                continue;
            }
            direct_roles.push(role);
        }

        let mut stamp_candidates: Vec<OffsetDateTime> =
            live_user_roles.iter().map(|ur| ur.updated_at).collect();
        stamp_candidates.extend(direct_roles.iter().map(|r| r.updated_at));
        let version_stamp = max_updated_at(stamp_candidates);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache
                .get(principal_id, context.organization_id.as_deref(), version_stamp)
                .await
            {
                return Ok((hit, false));
            }
        }

        if direct_roles.is_empty() {
            return Ok((Arc::new(Vec::new()), scope_excluded));
        }

        let effective_roles = self.expand_role_forest(direct_roles).await?;

        let mut effective = Vec::new();
        let mut seen_permission_ids = HashSet::new();
        for role in &effective_roles {
            let links = self
                .store
                .role_permissions()
                .list_by_role(&role.id)
                .await
                .map_err(|e| format!("internal: {e}"))?;

            for link in links.iter().filter(|l| l.is_effective()) {
                if !seen_permission_ids.insert(link.permission_id.clone()) {
                    continue;
                }
                let permission = match self.store.permissions().get_by_id(&link.permission_id).await {
                    Ok(permission) => permission,
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(format!("internal: {e}")),
                };
                effective.push(EffectivePermission {
                    permission_name: permission.name,
                    role_name: role.name.clone(),
                });
            }
        }

        let effective = Arc::new(effective);
        if let Some(cache) = &self.cache {
            cache
                .put(
                    principal_id,
                    context.organization_id.as_deref(),
                    (*effective).clone(),
                    version_stamp,
                )
                .await;
        }
        Ok((effective, false))
    }

    /// Starting from a principal's directly-assigned, scope-matched
    /// roles, follow `parent_id` to collect every transitive ancestor,
    /// bounding the walk defensively against a cycle that should not
    /// exist by invariant but must never hang the evaluator.
    async fn expand_role_forest(&self, direct_roles: Vec<Role>) -> Result<Vec<Role>, String> {
        let mut by_id = std::collections::HashMap::new();
        let mut frontier: Vec<Role> = Vec::new();
        for role in direct_roles {
            by_id.insert(role.id.clone(), role.clone());
            frontier.push(role);
        }

        let mut visited: HashSet<String> = by_id.keys().cloned().collect();
        let mut steps = 0usize;
        let mut cursor = 0usize;
        let mut all_ids: Vec<String> = frontier.iter().map(|r| r.id.clone()).collect();

        while cursor < all_ids.len() {
            let role_id = all_ids[cursor].clone();
            cursor += 1;
            steps += 1;
            if steps > 10_000 {
                return Err("role parent graph traversal exceeded safety bound".to_string());
            }

            let Some(parent_id) = by_id.get(&role_id).and_then(|r| r.parent_id.clone()) else {
                continue;
            };
            if !visited.insert(parent_id.clone()) {
                // Already visited: either a diamond in the forest (impossible
                // for a true forest, but defensively tolerated) or a cycle.
                // Either way, do not traverse it again.
                continue;
            }

            let parent = match self.store.roles().get_by_id(&parent_id).await {
                Ok(role) => role,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(format!("internal: {e}")),
            };
            if parent.is_effective() {
                by_id.insert(parent.id.clone(), parent.clone());
                all_ids.push(parent.id.clone());
            }
        }

        Ok(by_id.into_values().collect())
    }
}

fn max_updated_at(stamps: impl IntoIterator<Item = OffsetDateTime>) -> OffsetDateTime {
    stamps
        .into_iter()
        .max()
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Action, Permission, Resource, RoleScope, RolePermission, UserRole};
    use crate::filter::Filter;
    use crate::store::{
        ActionStore, CatalogTransaction, PermissionStore, ResourceStore, RolePermissionStore,
        RoleStore, ServiceRoleMappingStore, UserRoleStore,
    };
    use async_trait::async_trait;
    use catalog_core::{CatalogError, CatalogResult};
    use std::sync::Mutex as StdMutex;

    // A minimal in-memory CatalogStore sufficient to exercise the
    // evaluator in isolation. Mirrors the shape of the real store traits
    // but keeps everything in `Vec`s guarded by a std mutex — there is no
    // transactional or orchestrator behaviour under test here.
    #[derive(Default)]
    struct MemStore {
        roles: StdMutex<Vec<Role>>,
        permissions: StdMutex<Vec<Permission>>,
        role_permissions: StdMutex<Vec<RolePermission>>,
        user_roles: StdMutex<Vec<UserRole>>,
        resources: StdMutex<Vec<Resource>>,
        actions: StdMutex<Vec<Action>>,
    }

    #[async_trait]
    impl ActionStore for MemStore {
        async fn create(&self, action: Action) -> CatalogResult<Action> {
            self.actions.lock().unwrap().push(action.clone());
            Ok(action)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<Action> {
            self.actions
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("action"))
        }
        async fn get_by_name(&self, name: &str) -> CatalogResult<Action> {
            self.actions
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.name == name)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("action"))
        }
        async fn update(&self, action: Action) -> CatalogResult<Action> {
            Ok(action)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn soft_delete(&self, _id: &str, _deleted_by: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn restore(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<Action>> {
            Ok(self.actions.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.actions.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<Action>> {
            Ok(self.actions.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl ResourceStore for MemStore {
        async fn create(&self, resource: Resource) -> CatalogResult<Resource> {
            self.resources.lock().unwrap().push(resource.clone());
            Ok(resource)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<Resource> {
            self.resources
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("resource"))
        }
        async fn get_by_name(&self, name: &str) -> CatalogResult<Resource> {
            self.resources
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.name == name)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("resource"))
        }
        async fn update(&self, resource: Resource) -> CatalogResult<Resource> {
            Ok(resource)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn soft_delete(&self, _id: &str, _deleted_by: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn restore(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<Resource>> {
            Ok(self.resources.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.resources.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<Resource>> {
            Ok(self.resources.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl PermissionStore for MemStore {
        async fn create(&self, permission: Permission) -> CatalogResult<Permission> {
            self.permissions.lock().unwrap().push(permission.clone());
            Ok(permission)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<Permission> {
            self.permissions
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("permission"))
        }
        async fn get_by_name(&self, name: &str) -> CatalogResult<Permission> {
            self.permissions
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.name == name)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("permission"))
        }
        async fn get_by_resource_and_action(
            &self,
            resource_id: &str,
            action_id: &str,
        ) -> CatalogResult<Permission> {
            self.permissions
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.resource_id == resource_id && p.action_id == action_id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("permission"))
        }
        async fn update(&self, permission: Permission) -> CatalogResult<Permission> {
            Ok(permission)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn soft_delete(&self, _id: &str, _deleted_by: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn restore(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<Permission>> {
            Ok(self.permissions.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.permissions.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<Permission>> {
            Ok(self.permissions.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl RoleStore for MemStore {
        async fn create(&self, role: Role) -> CatalogResult<Role> {
            self.roles.lock().unwrap().push(role.clone());
            Ok(role)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<Role> {
            self.roles
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("role"))
        }
        async fn get_by_service_and_name(&self, service_id: &str, name: &str) -> CatalogResult<Role> {
            self.roles
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.service_id == service_id && r.name == name)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("role"))
        }
        async fn update(&self, role: Role) -> CatalogResult<Role> {
            Ok(role)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn soft_delete(&self, _id: &str, _deleted_by: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn restore(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<Role>> {
            Ok(self.roles.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.roles.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<Role>> {
            Ok(self.roles.lock().unwrap().clone())
        }
        async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<Role>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.service_id == service_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl RolePermissionStore for MemStore {
        async fn create(&self, link: RolePermission) -> CatalogResult<RolePermission> {
            self.role_permissions.lock().unwrap().push(link.clone());
            Ok(link)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<RolePermission> {
            self.role_permissions
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("role_permission"))
        }
        async fn update(&self, link: RolePermission) -> CatalogResult<RolePermission> {
            Ok(link)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<RolePermission>> {
            Ok(self.role_permissions.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.role_permissions.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<RolePermission>> {
            Ok(self.role_permissions.lock().unwrap().clone())
        }
        async fn list_by_role(&self, role_id: &str) -> CatalogResult<Vec<RolePermission>> {
            Ok(self
                .role_permissions
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.role_id == role_id)
                .cloned()
                .collect())
        }
        async fn list_by_permission(&self, permission_id: &str) -> CatalogResult<Vec<RolePermission>> {
            Ok(self
                .role_permissions
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.permission_id == permission_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl UserRoleStore for MemStore {
        async fn create(&self, assignment: UserRole) -> CatalogResult<UserRole> {
            self.user_roles.lock().unwrap().push(assignment.clone());
            Ok(assignment)
        }
        async fn get_by_id(&self, id: &str) -> CatalogResult<UserRole> {
            self.user_roles
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("user_role"))
        }
        async fn get_by_user_and_role(&self, user_id: &str, role_id: &str) -> CatalogResult<UserRole> {
            self.user_roles
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.user_id == user_id && u.role_id == role_id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found("user_role"))
        }
        async fn update(&self, assignment: UserRole) -> CatalogResult<UserRole> {
            Ok(assignment)
        }
        async fn delete(&self, _id: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn soft_delete(&self, _id: &str, _deleted_by: &str) -> CatalogResult<()> {
            Ok(())
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(&self, _limit: i64, _offset: i64) -> CatalogResult<Vec<UserRole>> {
            Ok(self.user_roles.lock().unwrap().clone())
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(self.user_roles.lock().unwrap().len() as i64)
        }
        async fn find(&self, _filter: &Filter) -> CatalogResult<Vec<UserRole>> {
            Ok(self.user_roles.lock().unwrap().clone())
        }
        async fn list_by_user(&self, user_id: &str) -> CatalogResult<Vec<UserRole>> {
            Ok(self
                .user_roles
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl ServiceRoleMappingStore for MemStore {
        async fn create(
            &self,
            mapping: crate::entities::ServiceRoleMapping,
        ) -> CatalogResult<crate::entities::ServiceRoleMapping> {
            Ok(mapping)
        }
        async fn get_by_id(&self, _id: &str) -> CatalogResult<crate::entities::ServiceRoleMapping> {
            Err(CatalogError::not_found("service_role_mapping"))
        }
        async fn get_by_service_and_role(
            &self,
            _service_id: &str,
            _role_id: &str,
        ) -> CatalogResult<crate::entities::ServiceRoleMapping> {
            Err(CatalogError::not_found("service_role_mapping"))
        }
        async fn update(
            &self,
            mapping: crate::entities::ServiceRoleMapping,
        ) -> CatalogResult<crate::entities::ServiceRoleMapping> {
            Ok(mapping)
        }
        async fn exists(&self, _id: &str) -> CatalogResult<bool> {
            Ok(false)
        }
        async fn list(
            &self,
            _limit: i64,
            _offset: i64,
        ) -> CatalogResult<Vec<crate::entities::ServiceRoleMapping>> {
            Ok(vec![])
        }
        async fn count(&self) -> CatalogResult<i64> {
            Ok(0)
        }
        async fn find(
            &self,
            _filter: &Filter,
        ) -> CatalogResult<Vec<crate::entities::ServiceRoleMapping>> {
            Ok(vec![])
        }
        async fn list_by_service(
            &self,
            _service_id: &str,
        ) -> CatalogResult<Vec<crate::entities::ServiceRoleMapping>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl CatalogStore for MemStore {
        fn actions(&self) -> &dyn ActionStore {
            self
        }
        fn resources(&self) -> &dyn ResourceStore {
            self
        }
        fn permissions(&self) -> &dyn PermissionStore {
            self
        }
        fn roles(&self) -> &dyn RoleStore {
            self
        }
        fn role_permissions(&self) -> &dyn RolePermissionStore {
            self
        }
        fn user_roles(&self) -> &dyn UserRoleStore {
            self
        }
        fn service_role_mappings(&self) -> &dyn ServiceRoleMappingStore {
            self
        }
        async fn begin(&self) -> CatalogResult<Box<dyn CatalogTransaction>> {
            Err(CatalogError::internal("MemStore does not support transactions"))
        }
    }

    fn setup() -> (Arc<MemStore>, Resource, Resource, Action, Action) {
        let store = Arc::new(MemStore::default());
        let farm = Resource::new("farm", "farmers-module", "a farm", None);
        let ledger = Resource::new("ledger", "erp-module", "a ledger", None);
        let delete = Action::new("delete", "delete", "general", false, None);
        let read = Action::new("read", "read", "general", false, None);
        (store, farm, ledger, delete, read)
    }

    #[tokio::test]
    async fn test_allow_via_wildcard_admin_role() {
        let (store, farm, _ledger, delete, _read) = setup();
        let admin = Role::new("admin", "", RoleScope::Global, None, None, "farmers-module").unwrap();
        let perm = Permission::new("farm", "delete", farm.id.clone(), delete.id.clone(), "");
        let link = RolePermission::new(admin.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u1", admin.id.clone());

        store.roles.lock().unwrap().push(admin.clone());
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let evaluator = AuthorizationEvaluator::new(store.clone());
        let decision = evaluator
            .check_permission("u1", "farm", "farm-42", "delete", &RequestContext::new())
            .await;

        assert!(decision.allowed);
        assert_eq!(decision.matched_permission.as_deref(), Some("farm:delete"));
        assert_eq!(decision.matched_role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_deny_by_missing_action() {
        let (store, farm, _ledger, _delete, read) = setup();
        let readonly =
            Role::new("readonly", "", RoleScope::Global, None, None, "farmers-module").unwrap();
        let perm = Permission::new("farm", "read", farm.id.clone(), read.id.clone(), "");
        let link = RolePermission::new(readonly.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u2", readonly.id.clone());

        store.roles.lock().unwrap().push(readonly);
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let evaluator = AuthorizationEvaluator::new(store);
        let decision = evaluator
            .check_permission("u2", "farm", "farm-42", "delete", &RequestContext::new())
            .await;

        assert!(!decision.allowed);
        assert_eq!(decision.reason, "no matching permission");
    }

    #[tokio::test]
    async fn test_org_scoped_role_filtered_by_mismatched_context() {
        let (store, _farm, ledger, _delete, read) = setup();
        let role = Role::new(
            "erp_accountant",
            "",
            RoleScope::Org,
            Some("org-A".to_string()),
            None,
            "erp-module",
        )
        .unwrap();
        let perm = Permission::new("ledger", "read", ledger.id.clone(), read.id.clone(), "");
        let link = RolePermission::new(role.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u3", role.id.clone());

        store.roles.lock().unwrap().push(role);
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let evaluator = AuthorizationEvaluator::new(store);
        let context = RequestContext::with_organization("org-B");
        let decision = evaluator
            .check_permission("u3", "ledger", "l-1", "read", &context)
            .await;

        assert!(!decision.allowed);
        assert_eq!(decision.reason, "scope mismatch");
    }

    #[tokio::test]
    async fn test_no_roles_denies_without_error() {
        let (store, ..) = setup();
        let evaluator = AuthorizationEvaluator::new(store);
        let decision = evaluator
            .check_permission("ghost", "farm", "farm-1", "read", &RequestContext::new())
            .await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "no effective roles");
    }

    #[tokio::test]
    async fn test_inactive_role_denies() {
        let (store, farm, _ledger, _delete, read) = setup();
        let mut role =
            Role::new("farmer", "", RoleScope::Global, None, None, "farmers-module").unwrap();
        role.is_active = false;
        let perm = Permission::new("farm", "read", farm.id.clone(), read.id.clone(), "");
        let link = RolePermission::new(role.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u4", role.id.clone());

        store.roles.lock().unwrap().push(role);
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let evaluator = AuthorizationEvaluator::new(store);
        let decision = evaluator
            .check_permission("u4", "farm", "farm-1", "read", &RequestContext::new())
            .await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_role_forest_inherits_parent_permissions() {
        let (store, farm, _ledger, _delete, read) = setup();
        let parent =
            Role::new("farmer", "", RoleScope::Global, None, None, "farmers-module").unwrap();
        let mut child = Role::new(
            "kisansathi",
            "",
            RoleScope::Global,
            None,
            Some(parent.id.clone()),
            "farmers-module",
        )
        .unwrap();
        child.parent_id = Some(parent.id.clone());

        let perm = Permission::new("farm", "read", farm.id.clone(), read.id.clone(), "");
        let link = RolePermission::new(parent.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u5", child.id.clone());

        store.roles.lock().unwrap().push(parent);
        store.roles.lock().unwrap().push(child);
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let evaluator = AuthorizationEvaluator::new(store);
        let decision = evaluator
            .check_permission("u5", "farm", "farm-1", "read", &RequestContext::new())
            .await;
        assert!(decision.allowed);
        assert_eq!(decision.matched_role.as_deref(), Some("farmer"));
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_recompute_but_agrees_with_storage() {
        let (store, farm, _ledger, _delete, read) = setup();
        let role = Role::new("farmer", "", RoleScope::Global, None, None, "farmers-module").unwrap();
        let perm = Permission::new("farm", "read", farm.id.clone(), read.id.clone(), "");
        let link = RolePermission::new(role.id.clone(), perm.id.clone());
        let assignment = UserRole::new("u6", role.id.clone());

        store.roles.lock().unwrap().push(role);
        store.permissions.lock().unwrap().push(perm);
        store.role_permissions.lock().unwrap().push(link);
        store.user_roles.lock().unwrap().push(assignment);

        let cache = Arc::new(PermissionCache::new(std::time::Duration::from_secs(300), 100));
        let evaluator = AuthorizationEvaluator::with_cache(store, cache);

        let first = evaluator
            .check_permission("u6", "farm", "farm-1", "read", &RequestContext::new())
            .await;
        let second = evaluator
            .check_permission("u6", "farm", "farm-1", "read", &RequestContext::new())
            .await;
        assert_eq!(first, second);
        assert!(second.allowed);
    }
}
