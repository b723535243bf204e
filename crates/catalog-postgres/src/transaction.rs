//! The transactional [`CatalogTransaction`] implementation: wraps a single
//! `sqlx` transaction so the Seed Orchestrator can run its whole upsert
//! pipeline atomically.
//!
//! Mirrors the wrap-in-`Mutex<Option<Transaction>>` shape used elsewhere
//! in this codebase for the same reason: every per-entity store method
//! needs `&mut` access to the transaction, including reads, and the
//! `CatalogTransaction` trait only hands out `&dyn XStore` (shared
//! references) through its accessors.

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::store::{
    ActionStore, CatalogTransaction, PermissionStore, ResourceStore, RolePermissionStore,
    RoleStore, ServiceRoleMappingStore, UserRoleStore,
};
use sqlx_postgres::Postgres;
use tokio::sync::{Mutex, MutexGuard};

/// A transaction spanning multiple catalog mutations, backed by a single
/// `sqlx` Postgres transaction.
///
/// Rolls back automatically on drop if neither `commit` nor `rollback`
/// was called explicitly — `sqlx::Transaction`'s own `Drop` issues the
/// `ROLLBACK`, this type just warns so a forgotten call on an error path
/// is visible in logs.
pub struct PgCatalogTransaction {
    pub(crate) tx: Mutex<Option<sqlx_core::transaction::Transaction<'static, Postgres>>>,
}

impl PgCatalogTransaction {
    pub(crate) fn new(tx: sqlx_core::transaction::Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Borrow the live transaction out of the guard, or fail if it has
    /// already been committed/rolled back.
    pub(crate) fn active<'g>(
        &self,
        guard: &'g mut MutexGuard<'_, Option<sqlx_core::transaction::Transaction<'static, Postgres>>>,
    ) -> CatalogResult<&'g mut sqlx_core::transaction::Transaction<'static, Postgres>> {
        guard.as_mut().ok_or_else(|| {
            CatalogError::internal("transaction already completed (committed or rolled back)")
        })
    }
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn commit(self: Box<Self>) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        if let Some(tx) = guard.take() {
            tx.commit().await.map_err(|e| {
                CatalogError::internal(format!("failed to commit transaction: {e}"))
            })?;
            tracing::debug!("catalog transaction committed");
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        if let Some(tx) = guard.take() {
            tx.rollback().await.map_err(|e| {
                CatalogError::internal(format!("failed to roll back transaction: {e}"))
            })?;
            tracing::debug!("catalog transaction rolled back");
        }
        Ok(())
    }

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
}

impl Drop for PgCatalogTransaction {
    fn drop(&mut self) {
        // `commit`/`rollback` consume `self` inside a future, so this can
        // run while the executor is polling us from within an async
        // context; `blocking_lock` would panic there. `try_lock` is safe
        // in both contexts: nothing else holds this mutex across an
        // await point, so it never contends.
        if let Ok(guard) = self.tx.try_lock() {
            if guard.is_some() {
                tracing::warn!(
                    "catalog transaction dropped without explicit commit/rollback, auto-rolling back"
                );
            }
        }
    }
}
