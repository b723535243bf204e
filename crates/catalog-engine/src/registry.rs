//! The Seed Provider Registry: a thread-safe registry of named seed
//! providers, one per service module.
//!
//! Mutated rarely (startup, admin plug-in), read frequently (every seed
//! call resolves a provider by `service_id`) — a many-reader-single-writer
//! lock is sufficient, mirroring the registry/dispatch discipline used
//! elsewhere in this codebase for rarely-mutated, frequently-read
//! collections of named handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::CatalogError;
use tokio::sync::RwLock;

use crate::entities::{Action, Resource};

/// A role definition as contributed by a provider: a name, scope and
/// description paired with the permission *patterns* it should carry
/// (not resolved permission IDs — those are resolved by the Wildcard
/// Expander during seeding).
#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: String,
    pub description: String,
    pub scope: crate::entities::RoleScope,
    pub organization_id: Option<String>,
    pub parent_name: Option<String>,
    pub permission_patterns: Vec<String>,
}

/// A named, self-contained bundle of resources, actions, and roles
/// contributed by a subsystem (e.g. "farmers-module", "erp-module").
///
/// Implementers are expected to embed a base-provider struct carrying
/// `service_id`/`service_name` and override the content methods — the
/// contract is deliberately small and closed (four content methods plus
/// `validate`).
#[async_trait]
pub trait Provider: Send + Sync {
    fn service_id(&self) -> &str;
    fn service_name(&self) -> &str;
    fn resources(&self) -> Vec<Resource>;
    fn actions(&self) -> Vec<Action>;
    fn roles(&self) -> Vec<RoleDefinition>;

    /// Check that service metadata is non-empty, every resource has a
    /// name and type, every action has a name and category, every role
    /// has a non-empty name, a valid scope, and at least one permission
    /// pattern.
    fn validate(&self) -> Result<(), CatalogError> {
        if self.service_id().is_empty() || self.service_name().is_empty() {
            return Err(CatalogError::invalid_argument(
                "provider service_id and service_name must be non-empty",
            ));
        }
        for resource in self.resources() {
            if resource.name.is_empty() || resource.resource_type.is_empty() {
                return Err(CatalogError::invalid_argument(format!(
                    "resource '{}' must have a non-empty name and type",
                    resource.name
                )));
            }
        }
        for action in self.actions() {
            if action.name.is_empty() || action.category.is_empty() {
                return Err(CatalogError::invalid_argument(format!(
                    "action '{}' must have a non-empty name and category",
                    action.name
                )));
            }
        }
        for role in self.roles() {
            if role.name.is_empty() {
                return Err(CatalogError::invalid_argument(
                    "every role must have a non-empty name",
                ));
            }
            if role.permission_patterns.is_empty() {
                return Err(CatalogError::invalid_argument(format!(
                    "role '{}' must carry at least one permission pattern",
                    role.name
                )));
            }
        }
        Ok(())
    }
}

/// Thread-safe registry mapping `service_id` to a registered [`Provider`].
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provider. Fails if its `service_id` is empty or
    /// already registered.
    pub async fn register(&self, provider: Arc<dyn Provider>) -> Result<(), CatalogError> {
        let service_id = provider.service_id().to_string();
        if service_id.is_empty() {
            return Err(CatalogError::invalid_argument(
                "provider service_id must not be empty",
            ));
        }

        let mut providers = self.providers.write().await;
        if providers.contains_key(&service_id) {
            return Err(CatalogError::conflict(format!(
                "provider '{service_id}' is already registered"
            )));
        }
        providers.insert(service_id.clone(), provider);
        tracing::debug!(service_id = %service_id, "registered seed provider");
        Ok(())
    }

    /// Fetch a registered provider by `service_id`.
    pub async fn get(&self, service_id: &str) -> Result<Arc<dyn Provider>, CatalogError> {
        let providers = self.providers.read().await;
        providers
            .get(service_id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("provider '{service_id}' not found")))
    }

    /// Remove a registered provider.
    pub async fn unregister(&self, service_id: &str) -> Result<(), CatalogError> {
        let mut providers = self.providers.write().await;
        if providers.remove(service_id).is_none() {
            return Err(CatalogError::not_found(format!(
                "provider '{service_id}' not found"
            )));
        }
        tracing::debug!(service_id = %service_id, "unregistered seed provider");
        Ok(())
    }

    /// True if `service_id` is currently registered.
    pub async fn has(&self, service_id: &str) -> bool {
        self.providers.read().await.contains_key(service_id)
    }

    /// Number of registered providers.
    pub async fn count(&self) -> usize {
        self.providers.read().await.len()
    }

    /// Remove every registered provider.
    pub async fn clear(&self) {
        self.providers.write().await.clear();
    }

    /// All registered providers.
    pub async fn get_all(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.read().await.values().cloned().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RoleScope;

    struct TestProvider {
        service_id: String,
    }

    #[async_trait]
    impl Provider for TestProvider {
        fn service_id(&self) -> &str {
            &self.service_id
        }
        fn service_name(&self) -> &str {
            "Test Provider"
        }
        fn resources(&self) -> Vec<Resource> {
            vec![Resource::new("widget", "test-module", "a widget", None)]
        }
        fn actions(&self) -> Vec<Action> {
            vec![Action::new("read", "read", "general", false, None)]
        }
        fn roles(&self) -> Vec<RoleDefinition> {
            vec![RoleDefinition {
                name: "viewer".to_string(),
                description: "read-only".to_string(),
                scope: RoleScope::Global,
                organization_id: None,
                parent_name: None,
                permission_patterns: vec!["widget:read".to_string()],
            }]
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ProviderRegistry::new();
        let provider = Arc::new(TestProvider {
            service_id: "test-module".to_string(),
        });
        registry.register(provider).await.unwrap();

        assert!(registry.has("test-module").await);
        assert_eq!(registry.count().await, 1);

        let fetched = registry.get("test-module").await.unwrap();
        assert_eq!(fetched.service_id(), "test-module");
    }

    #[tokio::test]
    async fn test_register_empty_service_id_fails() {
        let registry = ProviderRegistry::new();
        let provider = Arc::new(TestProvider {
            service_id: String::new(),
        });
        assert!(registry.register(provider).await.is_err());
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(TestProvider {
                service_id: "test-module".to_string(),
            }))
            .await
            .unwrap();
        let result = registry
            .register(Arc::new(TestProvider {
                service_id: "test-module".to_string(),
            }))
            .await;
        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let registry = ProviderRegistry::new();
        let err = registry.get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(TestProvider {
                service_id: "test-module".to_string(),
            }))
            .await
            .unwrap();
        registry.unregister("test-module").await.unwrap();
        assert!(!registry.has("test-module").await);
        assert!(registry.unregister("test-module").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_and_get_all() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(TestProvider {
                service_id: "a".to_string(),
            }))
            .await
            .unwrap();
        registry
            .register(Arc::new(TestProvider {
                service_id: "b".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(registry.get_all().await.len(), 2);
        registry.clear().await;
        assert_eq!(registry.count().await, 0);
    }

    #[test]
    fn test_provider_validate_rejects_empty_pattern_list() {
        struct BadProvider;
        #[async_trait]
        impl Provider for BadProvider {
            fn service_id(&self) -> &str {
                "bad"
            }
            fn service_name(&self) -> &str {
                "Bad"
            }
            fn resources(&self) -> Vec<Resource> {
                vec![]
            }
            fn actions(&self) -> Vec<Action> {
                vec![]
            }
            fn roles(&self) -> Vec<RoleDefinition> {
                vec![RoleDefinition {
                    name: "empty".to_string(),
                    description: String::new(),
                    scope: RoleScope::Global,
                    organization_id: None,
                    parent_name: None,
                    permission_patterns: vec![],
                }]
            }
        }
        assert!(BadProvider.validate().is_err());
    }
}
