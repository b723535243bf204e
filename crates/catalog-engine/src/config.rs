//! Policy catalog and authorization engine configuration.
//!
//! This module provides the configuration types for the catalog engine:
//! seed orchestration behaviour and the evaluator's permission cache.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the policy catalog and authorization engine.
///
/// # Example (TOML)
///
/// ```toml
/// [catalog]
/// enabled = true
///
/// [catalog.seed]
/// default_service_id = "farmers-module"
///
/// [catalog.evaluator_cache]
/// ttl = "5m"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Enable/disable the catalog engine entirely. When disabled, the
    /// evaluator denies every request rather than consulting storage.
    pub enabled: bool,

    /// Seed orchestrator configuration.
    pub seed: SeedConfig,

    /// Authorization evaluator cache configuration.
    pub evaluator_cache: EvaluatorCacheConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: SeedConfig::default(),
            evaluator_cache: EvaluatorCacheConfig::default(),
        }
    }
}

/// Seed orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    /// `service_id` used when `seed()` is called with an absent/empty
    /// `service_id`. Must itself satisfy the `service_id` grammar.
    pub default_service_id: String,

    /// Force-refresh mutable fields on every seed run rather than only
    /// creating missing entities. Mirrors the `force` argument's default
    /// when the handler layer does not specify one explicitly.
    pub force_by_default: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_service_id: "farmers-module".to_string(),
            force_by_default: false,
        }
    }
}

/// Authorization evaluator cache configuration.
///
/// The cache is version-stamped per principal (see
/// [`crate::cache::PermissionCache`]); `ttl` is a fallback ceiling so a
/// missed invalidation signal cannot pin a stale decision forever.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluatorCacheConfig {
    /// Enable the per-principal permission cache. When disabled, every
    /// evaluation re-reads the catalog store.
    pub enabled: bool,

    /// Maximum age of a cache entry before it is refreshed regardless of
    /// its version stamp.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Maximum number of principals to retain cache entries for. Oldest
    /// entries are evicted first once this is exceeded.
    pub max_entries: usize,
}

impl Default for EvaluatorCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(300),
            max_entries: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.seed.default_service_id, "farmers-module");
        assert!(!config.seed.force_by_default);
        assert!(config.evaluator_cache.enabled);
        assert_eq!(config.evaluator_cache.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = CatalogConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CatalogConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seed.default_service_id, config.seed.default_service_id);
        assert_eq!(restored.evaluator_cache.ttl, config.evaluator_cache.ttl);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let partial = r#"{"seed": {"default_service_id": "erp-module"}}"#;
        let config: CatalogConfig = serde_json::from_str(partial).unwrap();
        assert_eq!(config.seed.default_service_id, "erp-module");
        assert!(!config.seed.force_by_default);
        assert!(config.enabled);
    }
}
