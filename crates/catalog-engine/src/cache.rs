//! The Authorization Evaluator's per-principal permission cache.
//!
//! Caches the `(principal, organization) -> effective-permission-set`
//! mapping. The organization id from the request context is folded into
//! the key alongside the principal: ORG-scoped roles are filtered by
//! that context (spec §4.5), so the effective set for the same
//! principal genuinely differs across organization contexts and a
//! cache keyed on principal alone would let one context's result leak
//! into another's lookup. Each entry carries a version stamp equal to
//! the maximum `updated_at` across that principal's `UserRole`, `Role`,
//! and `RolePermission` rows; any mutation to those rows changes the
//! stamp, so a stale entry is detected and refreshed on its next read
//! rather than relying on TTL alone. TTL remains a fallback ceiling so a
//! missed invalidation signal cannot pin a stale decision forever.

use std::collections::HashMap;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

/// One permission effective for a principal through a specific role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermission {
    /// The concrete permission name, `"<resource>:<action>"`.
    pub permission_name: String,
    /// The name of the role this permission was granted through.
    pub role_name: String,
}

/// A cached effective-permission-set for one principal.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Permissions effective for this principal at computation time.
    permissions: Arc<Vec<EffectivePermission>>,
    /// The maximum `updated_at` across the principal's UserRole, Role and
    /// RolePermission rows at computation time.
    version_stamp: OffsetDateTime,
    /// Wall-clock time this entry was computed, for TTL fallback.
    computed_at: OffsetDateTime,
}

/// The cache key: a principal paired with the organization id (if any)
/// of the request context it was resolved under.
type CacheKey = (String, Option<String>);

fn cache_key(principal_id: &str, organization_id: Option<&str>) -> CacheKey {
    (principal_id.to_string(), organization_id.map(str::to_string))
}

/// In-memory cache of effective permission sets, keyed by
/// `(principal id, organization id)`.
pub struct PermissionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl PermissionCache {
    /// Create a new cache with the given TTL fallback ceiling and a soft
    /// cap on the number of `(principal, organization)` entries tracked.
    #[must_use]
    pub fn new(ttl: std::time::Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::try_from(ttl).unwrap_or(Duration::seconds(300)),
            max_entries,
        }
    }

    /// Fetch a cached permission set for `principal_id` under
    /// `organization_id`, if one exists and is still fresh against
    /// `current_version_stamp`.
    ///
    /// An entry is fresh if its stored version stamp equals
    /// `current_version_stamp` (the caller is expected to have just
    /// computed the true current stamp from storage) and it was computed
    /// within `ttl`. Either check failing means a refresh is needed.
    pub async fn get(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        current_version_stamp: OffsetDateTime,
    ) -> Option<Arc<Vec<EffectivePermission>>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&cache_key(principal_id, organization_id))?;

        let version_matches = entry.version_stamp == current_version_stamp;
        let within_ttl = OffsetDateTime::now_utc() - entry.computed_at < self.ttl;

        if version_matches && within_ttl {
            Some(entry.permissions.clone())
        } else {
            None
        }
    }

    /// Store a freshly computed permission set for `principal_id` under
    /// `organization_id`.
    pub async fn put(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        permissions: Vec<EffectivePermission>,
        version_stamp: OffsetDateTime,
    ) {
        let mut entries = self.entries.write().await;
        let key = cache_key(principal_id, organization_id);

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.computed_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                permissions: Arc::new(permissions),
                version_stamp,
                computed_at: OffsetDateTime::now_utc(),
            },
        );
    }

    /// Drop every cached entry for `principal_id`, across all
    /// organization contexts, forcing recomputation on the next read
    /// regardless of version stamp.
    pub async fn invalidate(&self, principal_id: &str) {
        self.entries
            .write()
            .await
            .retain(|(pid, _), _| pid != principal_id);
    }

    /// Number of `(principal, organization)` entries currently tracked.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn stamp(offset_secs: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(offset_secs)
    }

    #[tokio::test]
    async fn test_miss_when_empty() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        assert!(cache.get("u1", None, stamp(1)).await.is_none());
    }

    fn perm(permission_name: &str, role_name: &str) -> EffectivePermission {
        EffectivePermission {
            permission_name: permission_name.to_string(),
            role_name: role_name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_hit_with_matching_version_stamp() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        cache
            .put("u1", None, vec![perm("farm:read", "readonly")], stamp(1))
            .await;

        let hit = cache.get("u1", None, stamp(1)).await;
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().as_slice(), &[perm("farm:read", "readonly")]);
    }

    #[tokio::test]
    async fn test_miss_on_stale_version_stamp() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        cache
            .put("u1", None, vec![perm("farm:read", "readonly")], stamp(1))
            .await;

        // A role mutation bumped the stamp; the cached entry is now stale.
        assert!(cache.get("u1", None, stamp(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_miss() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        cache
            .put("u1", None, vec![perm("farm:read", "readonly")], stamp(1))
            .await;
        cache.invalidate("u1").await;
        assert!(cache.get("u1", None, stamp(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_eviction_at_capacity() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 1);
        cache.put("u1", None, vec![], stamp(1)).await;
        cache.put("u2", None, vec![], stamp(1)).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_len_and_is_empty() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        assert!(cache.is_empty().await);
        cache.put("u1", None, vec![], stamp(1)).await;
        assert_eq!(cache.len().await, 1);
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_same_principal_different_organizations_do_not_collide() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        cache
            .put("u1", Some("org-A"), vec![perm("ledger:read", "erp_accountant")], stamp(1))
            .await;

        // A different organization context for the same principal must
        // miss, not inherit org-A's cached set.
        assert!(cache.get("u1", Some("org-B"), stamp(1)).await.is_none());
        assert!(cache.get("u1", None, stamp(1)).await.is_none());

        let hit = cache.get("u1", Some("org-A"), stamp(1)).await;
        assert!(hit.is_some());
        assert_eq!(
            hit.unwrap().as_slice(),
            &[perm("ledger:read", "erp_accountant")]
        );
    }

    #[tokio::test]
    async fn test_invalidate_clears_all_organizations_for_principal() {
        let cache = PermissionCache::new(StdDuration::from_secs(300), 100);
        cache.put("u1", Some("org-A"), vec![], stamp(1)).await;
        cache.put("u1", Some("org-B"), vec![], stamp(1)).await;
        cache.put("u2", Some("org-A"), vec![], stamp(1)).await;

        cache.invalidate("u1").await;

        assert!(cache.get("u1", Some("org-A"), stamp(1)).await.is_none());
        assert!(cache.get("u1", Some("org-B"), stamp(1)).await.is_none());
        assert!(cache.get("u2", Some("org-A"), stamp(1)).await.is_some());
    }
}
