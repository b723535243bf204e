//! The Seed Orchestrator: the single entry point that upserts a
//! provider's actions, resources, expanded permissions, roles,
//! role-permission links and service-role mapping audit rows, all within
//! one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use catalog_core::{validate_service_id, CatalogError, CatalogResult};

use crate::entities::{Permission, Role, RolePermission, ServiceRoleMapping};
use crate::registry::ProviderRegistry;
use crate::store::CatalogStore;
use crate::wildcard;

/// The result of a `seed()` call. Never thrown across the boundary: a
/// failure partway through the transactional steps is reported as
/// `success = false` with `error_message` populated, not as an error
/// return. A failure in the *preconditions* (invalid `service_id`,
/// unregistered provider) is returned as an `Err` before any transaction
/// is opened, since those are rejected before the core algorithm begins.
#[derive(Debug, Clone, Default)]
pub struct SeedResult {
    pub actions_created: u64,
    pub resources_created: u64,
    pub permissions_created: u64,
    pub roles_created: u64,
    pub role_names: Vec<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl SeedResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Orchestrates a seed run against a [`CatalogStore`] using providers
/// resolved from a [`ProviderRegistry`].
pub struct SeedOrchestrator {
    store: Arc<dyn CatalogStore>,
    registry: Arc<ProviderRegistry>,
    default_service_id: String,
}

impl SeedOrchestrator {
    /// Create a new orchestrator. `default_service_id` is the provider
    /// used when `seed()` is called with an absent or empty
    /// `service_id`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        registry: Arc<ProviderRegistry>,
        default_service_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            default_service_id: default_service_id.into(),
        }
    }

    /// Seed (or re-seed, under `force`) the catalog from the provider
    /// named by `service_id`, or the default provider if `service_id` is
    /// `None`/empty.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for precondition failures that occur before any
    /// transaction is opened: a malformed `service_id`
    /// ([`CatalogError::InvalidArgument`]) or an unregistered provider
    /// ([`CatalogError::FailedPrecondition`]). Failures during the
    /// transactional steps are reported as `Ok(SeedResult { success:
    /// false, .. })`, never as `Err`.
    pub async fn seed(&self, service_id: Option<&str>, force: bool) -> CatalogResult<SeedResult> {
        let requested = service_id.unwrap_or("");
        validate_service_id(requested)?;

        let resolved_id = if requested.is_empty() {
            self.default_service_id.clone()
        } else {
            requested.to_string()
        };

        let provider = self.registry.get(&resolved_id).await.map_err(|_| {
            CatalogError::failed_precondition(format!(
                "no provider registered for service_id '{resolved_id}'"
            ))
        })?;
        provider.validate()?;

        let tx = self.store.begin().await?;

        match self.run_seed_steps(tx.as_ref(), provider.as_ref(), force).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(error = %err, "seed failed, rolling back");
                tx.rollback().await?;
                Ok(SeedResult::failure(err.to_string()))
            }
        }
    }

    async fn run_seed_steps(
        &self,
        tx: &dyn crate::store::CatalogTransaction,
        provider: &dyn crate::registry::Provider,
        force: bool,
    ) -> CatalogResult<SeedResult> {
        let service_id = provider.service_id().to_string();
        let service_name = provider.service_name().to_string();

        // Step 4: actions upsert.
        let mut all_actions = Vec::new();
        let mut actions_created = 0u64;
        for def in provider.actions() {
            match tx.actions().get_by_name(&def.name).await {
                Ok(mut existing) => {
                    if force {
                        existing.description = def.description;
                        existing.category = def.category;
                        existing.is_static = def.is_static;
                        let updated = tx.actions().update(existing).await?;
                        actions_created += 1;
                        all_actions.push(updated);
                    } else {
                        all_actions.push(existing);
                    }
                }
                Err(e) if e.is_not_found() => {
                    let created = tx.actions().create(def).await?;
                    actions_created += 1;
                    all_actions.push(created);
                }
                Err(e) => return Err(e),
            }
        }

        // Step 5: resources upsert.
        let mut all_resources = Vec::new();
        let mut resources_created = 0u64;
        for def in provider.resources() {
            match tx.resources().get_by_name(&def.name).await {
                Ok(mut existing) => {
                    if force {
                        existing.resource_type = def.resource_type;
                        existing.description = def.description;
                        let updated = tx.resources().update(existing).await?;
                        resources_created += 1;
                        all_resources.push(updated);
                    } else {
                        all_resources.push(existing);
                    }
                }
                Err(e) if e.is_not_found() => {
                    let created = tx.resources().create(def).await?;
                    resources_created += 1;
                    all_resources.push(created);
                }
                Err(e) => return Err(e),
            }
        }

        // Step 6: permissions upsert with wildcard expansion.
        let role_defs = provider.roles();
        let all_patterns: Vec<String> = role_defs
            .iter()
            .flat_map(|r| r.permission_patterns.clone())
            .collect();
        let expanded = wildcard::expand(&all_patterns, &all_resources, &all_actions);

        let mut permissions_by_name: HashMap<String, Permission> = HashMap::new();
        let mut permissions_created = 0u64;
        for (resource, action) in expanded {
            let name = Permission::derive_name(&resource.name, &action.name);
            match tx.permissions().get_by_name(&name).await {
                Ok(mut existing) => {
                    if force {
                        existing.resource_id = resource.id.clone();
                        existing.action_id = action.id.clone();
                        existing.description =
                            format!("{} {}", action.name, resource.name);
                        let updated = tx.permissions().update(existing).await?;
                        permissions_created += 1;
                        permissions_by_name.insert(name, updated);
                    } else {
                        permissions_by_name.insert(name, existing);
                    }
                }
                Err(e) if e.is_not_found() => {
                    let created = Permission::new(
                        &resource.name,
                        &action.name,
                        resource.id.clone(),
                        action.id.clone(),
                        format!("{} {}", action.name, resource.name),
                    );
                    let created = tx.permissions().create(created).await?;
                    permissions_created += 1;
                    permissions_by_name.insert(name, created);
                }
                Err(e) => return Err(e),
            }
        }

        // Step 7: roles upsert (parent resolution deferred to a second pass
        // below so that forward references to a sibling role resolve).
        let mut roles_by_name: HashMap<String, Role> = HashMap::new();
        let mut roles_created = 0u64;
        for def in &role_defs {
            match tx
                .roles()
                .get_by_service_and_name(&service_id, &def.name)
                .await
            {
                Ok(existing) => {
                    if !force {
                        roles_by_name.insert(def.name.clone(), existing);
                        continue;
                    }
                    let mut updated = existing;
                    updated.description = def.description.clone();
                    updated.scope = def.scope;
                    updated.organization_id = def.organization_id.clone();
                    updated.service_id = service_id.clone();
                    let updated = tx.roles().update(updated).await?;
                    roles_created += 1;
                    roles_by_name.insert(def.name.clone(), updated);
                }
                Err(e) if e.is_not_found() => {
                    let new_role = Role::new(
                        def.name.clone(),
                        def.description.clone(),
                        def.scope,
                        def.organization_id.clone(),
                        None,
                        service_id.clone(),
                    )?;
                    let created = tx.roles().create(new_role).await?;
                    roles_created += 1;
                    roles_by_name.insert(def.name.clone(), created);
                }
                Err(e) => return Err(e),
            }
        }

        self.resolve_parents(tx, &role_defs, &mut roles_by_name).await?;

        // Step 8: permission attachment. Desired set re-derived from the
        // permission-name map so wildcard patterns resolve against the
        // same keys roles will be matched against at evaluation time.
        for def in &role_defs {
            let role = roles_by_name
                .get(&def.name)
                .expect("role was upserted in step 7");

            let mut desired_permission_ids = Vec::new();
            for pattern in &def.permission_patterns {
                if let Some(perm) = permissions_by_name.get(pattern) {
                    desired_permission_ids.push(perm.id.clone());
                    continue;
                }
                for (name, perm) in &permissions_by_name {
                    if wildcard::matches(name, pattern) {
                        desired_permission_ids.push(perm.id.clone());
                    }
                }
            }
            desired_permission_ids.sort();
            desired_permission_ids.dedup();

            let current_links = tx.role_permissions().list_by_role(&role.id).await?;
            let current_permission_ids: std::collections::HashSet<String> = current_links
                .iter()
                .filter(|l| l.is_effective())
                .map(|l| l.permission_id.clone())
                .collect();

            for permission_id in desired_permission_ids {
                if !current_permission_ids.contains(&permission_id) {
                    tx.role_permissions()
                        .create(RolePermission::new(role.id.clone(), permission_id))
                        .await?;
                }
            }
        }

        // Step 9: service-role mapping, fatal on failure.
        for role in roles_by_name.values() {
            match tx
                .service_role_mappings()
                .get_by_service_and_role(&service_id, &role.id)
                .await
            {
                Ok(mut mapping) => {
                    mapping.bump_version();
                    tx.service_role_mappings().update(mapping).await?;
                }
                Err(e) if e.is_not_found() => {
                    let mapping = ServiceRoleMapping::new(
                        service_id.clone(),
                        service_name.clone(),
                        role.id.clone(),
                    );
                    tx.service_role_mappings().create(mapping).await?;
                }
                Err(e) => return Err(e),
            }
        }

        let mut role_names: Vec<String> = roles_by_name.keys().cloned().collect();
        role_names.sort();

        Ok(SeedResult {
            actions_created,
            resources_created,
            permissions_created,
            roles_created,
            role_names,
            success: true,
            error_message: None,
        })
    }

    /// Resolve each role definition's `parent_name` into the referenced
    /// role's id, rejecting any assignment that would introduce a cycle.
    async fn resolve_parents(
        &self,
        tx: &dyn crate::store::CatalogTransaction,
        role_defs: &[crate::registry::RoleDefinition],
        roles_by_name: &mut HashMap<String, Role>,
    ) -> CatalogResult<()> {
        for def in role_defs {
            let Some(parent_name) = &def.parent_name else {
                continue;
            };
            let parent_id = roles_by_name
                .get(parent_name)
                .ok_or_else(|| {
                    CatalogError::invalid_argument(format!(
                        "role '{}' names unknown parent '{parent_name}'",
                        def.name
                    ))
                })?
                .id
                .clone();

            let role_id = roles_by_name
                .get(&def.name)
                .expect("role was upserted in step 7")
                .id
                .clone();
            if would_cycle(roles_by_name, &role_id, &parent_id) {
                return Err(CatalogError::internal(format!(
                    "role '{}' parent assignment would introduce a cycle",
                    def.name
                )));
            }

            let mut role = roles_by_name
                .get(&def.name)
                .expect("role was upserted in step 7")
                .clone();
            role.parent_id = Some(parent_id);
            let updated = tx.roles().update(role).await?;
            roles_by_name.insert(def.name.clone(), updated);
        }
        Ok(())
    }
}

/// Walk from `candidate_parent_id` up through the parent chain (bounded
/// by the number of roles, defensively, since cycles must not exist by
/// invariant) to see whether it ever reaches `role_id` — which would
/// make `role_id` its own ancestor.
fn would_cycle(roles_by_name: &HashMap<String, Role>, role_id: &str, candidate_parent_id: &str) -> bool {
    let by_id: HashMap<&str, &Role> = roles_by_name.values().map(|r| (r.id.as_str(), r)).collect();
    let mut current = Some(candidate_parent_id);
    let mut steps = 0;
    while let Some(id) = current {
        if id == role_id {
            return true;
        }
        steps += 1;
        if steps > roles_by_name.len() + 1 {
            return true;
        }
        current = by_id.get(id).and_then(|r| r.parent_id.as_deref());
    }
    false
}
