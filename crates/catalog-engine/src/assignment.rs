//! The `CatalogFacade`: the narrow, handler-facing surface of spec §6 —
//! `assign_role`, `revoke_role`, `seed_roles_and_permissions`, and
//! `check_permission`. This is the seam the out-of-scope request
//! pipeline and handler layer call through; it contains no HTTP routing
//! itself.

use std::sync::Arc;

use catalog_core::{CatalogError, CatalogResult};

use crate::entities::UserRole;
use crate::evaluator::{AuthorizationEvaluator, Decision, RequestContext};
use crate::orchestrator::{SeedOrchestrator, SeedResult};
use crate::store::CatalogStore;

/// One role granted to a user, paired with the permissions it carries,
/// as returned by [`CatalogFacade::assign_role`]'s user view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionView {
    pub role_name: String,
    pub action: String,
    pub resource: String,
}

/// The result of a successful role assignment: the full (role →
/// permissions) view for the user, with duplicates collapsed by
/// `(name, action, resource)`.
#[derive(Debug, Clone, Default)]
pub struct UserRoleView {
    pub user_id: String,
    pub role_permissions: Vec<RolePermissionView>,
}

/// The narrow-contract surface consumed by the out-of-scope handler
/// layer. Wraps a [`CatalogStore`], a [`SeedOrchestrator`], and an
/// [`AuthorizationEvaluator`] behind the four operations of spec §6.
pub struct CatalogFacade {
    store: Arc<dyn CatalogStore>,
    orchestrator: SeedOrchestrator,
    evaluator: AuthorizationEvaluator,
}

impl CatalogFacade {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        orchestrator: SeedOrchestrator,
        evaluator: AuthorizationEvaluator,
    ) -> Self {
        Self {
            store,
            orchestrator,
            evaluator,
        }
    }

    /// Assign `role_name` to `user_id`. The role is resolved by name
    /// across all services — callers needing a specific provider's role
    /// should disambiguate by service before invoking this facade, e.g.
    /// via [`crate::store::RoleStore::get_by_service_and_name`]
    /// directly.
    ///
    /// # Errors
    ///
    /// `NotFound` if the role does not exist or is not active;
    /// `Conflict` if the user is already assigned this role.
    pub async fn assign_role(&self, user_id: &str, role_name: &str) -> CatalogResult<UserRoleView> {
        let role = self.find_active_role_by_name(role_name).await?;

        if let Ok(existing) = self
            .store
            .user_roles()
            .get_by_user_and_role(user_id, &role.id)
            .await
        {
            if existing.is_live() {
                return Err(CatalogError::conflict(format!(
                    "user '{user_id}' is already assigned role '{role_name}'"
                )));
            }
        }

        let assignment = UserRole::new(user_id, role.id.clone());
        self.store.user_roles().create(assignment).await?;

        tracing::debug!(user_id, role_name, "assigned role");
        self.user_role_view(user_id).await
    }

    /// Revoke `role_name` from `user_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the role does not exist or the user has no live
    /// assignment to it.
    pub async fn revoke_role(&self, user_id: &str, role_name: &str) -> CatalogResult<()> {
        let role = self.find_role_by_name(role_name).await?;

        let assignment = self
            .store
            .user_roles()
            .get_by_user_and_role(user_id, &role.id)
            .await?;
        if !assignment.is_live() {
            return Err(CatalogError::not_found(format!(
                "user '{user_id}' has no active assignment to role '{role_name}'"
            )));
        }

        self.store
            .user_roles()
            .soft_delete(&assignment.id, "system")
            .await?;

        tracing::debug!(user_id, role_name, "revoked role");
        Ok(())
    }

    /// Seed (or re-seed) the catalog from the provider named by
    /// `service_id`, or the built-in default provider if absent/empty.
    /// Never throws across the boundary — see
    /// [`SeedOrchestrator::seed`].
    pub async fn seed_roles_and_permissions(
        &self,
        service_id: Option<&str>,
        force: bool,
    ) -> CatalogResult<SeedResult> {
        self.orchestrator.seed(service_id, force).await
    }

    /// Decide whether `principal_id` may perform `action` on
    /// `resource_type`/`resource_id` under the given request context.
    pub async fn check_permission(
        &self,
        principal_id: &str,
        resource_type: &str,
        resource_id: &str,
        action: &str,
        context: &RequestContext,
    ) -> Decision {
        self.evaluator
            .check_permission(principal_id, resource_type, resource_id, action, context)
            .await
    }

    async fn find_role_by_name(&self, role_name: &str) -> CatalogResult<crate::entities::Role> {
        let roles = self.store.roles().find(&crate::filter::Filter::new()).await?;
        roles
            .into_iter()
            .find(|r| r.name == role_name)
            .ok_or_else(|| CatalogError::not_found(format!("role '{role_name}' not found")))
    }

    async fn find_active_role_by_name(&self, role_name: &str) -> CatalogResult<crate::entities::Role> {
        let role = self.find_role_by_name(role_name).await?;
        if !role.is_effective() {
            return Err(CatalogError::not_found(format!(
                "role '{role_name}' is not active"
            )));
        }
        Ok(role)
    }

    /// Build the full (role → permissions) view for a user, collapsing
    /// duplicates by `(role_name, action, resource)`.
    async fn user_role_view(&self, user_id: &str) -> CatalogResult<UserRoleView> {
        let assignments = self.store.user_roles().list_by_user(user_id).await?;
        let mut seen = std::collections::HashSet::new();
        let mut views = Vec::new();

        for assignment in assignments.iter().filter(|a| a.is_live()) {
            let role = match self.store.roles().get_by_id(&assignment.role_id).await {
                Ok(role) if role.is_effective() => role,
                _ => continue,
            };

            let links = self.store.role_permissions().list_by_role(&role.id).await?;
            for link in links.iter().filter(|l| l.is_effective()) {
                let Ok(permission) = self.store.permissions().get_by_id(&link.permission_id).await
                else {
                    continue;
                };
                let Ok(resource) = self.store.resources().get_by_id(&permission.resource_id).await
                else {
                    continue;
                };
                let Ok(action) = self.store.actions().get_by_id(&permission.action_id).await
                else {
                    continue;
                };

                let key = (role.name.clone(), action.name.clone(), resource.name.clone());
                if seen.insert(key) {
                    views.push(RolePermissionView {
                        role_name: role.name.clone(),
                        action: action.name.clone(),
                        resource: resource.name.clone(),
                    });
                }
            }
        }

        Ok(UserRoleView {
            user_id: user_id.to_string(),
            role_permissions: views,
        })
    }
}
