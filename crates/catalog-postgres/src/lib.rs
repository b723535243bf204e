//! PostgreSQL storage backend for the policy catalog and authorization
//! engine.
//!
//! Provides a [`PgCatalogStore`] implementing `catalog_engine`'s
//! [`CatalogStore`] contract: the seven catalog tables (actions,
//! resources, permissions, roles, role-permission links, user-role
//! assignments, service-role mappings), plus [`PgCatalogTransaction`] for
//! the Seed Orchestrator's atomic multi-step runs.
//!
//! # Example
//!
//! ```ignore
//! use catalog_postgres::PgCatalogStore;
//!
//! let store = PgCatalogStore::connect("postgres://localhost/catalog").await?;
//! let action = store.actions().get_by_name("read").await?;
//! ```

pub mod action;
pub mod error;
pub mod filter_apply;
pub mod permission;
pub mod resource;
pub mod role;
pub mod role_permission;
pub mod service_role_mapping;
pub mod transaction;
pub mod user_role;

use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::CatalogResult;
use catalog_engine::store::{
    ActionStore, CatalogStore, CatalogTransaction, PermissionStore, ResourceStore,
    RolePermissionStore, RoleStore, ServiceRoleMappingStore, UserRoleStore,
};
use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;

use crate::error::map_sqlx_error;
pub use crate::transaction::PgCatalogTransaction;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

/// The PostgreSQL-backed [`CatalogStore`].
///
/// Cheaply cloneable: the connection pool it wraps is itself a cheap
/// `Arc`-backed handle.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with default pool options.
    ///
    /// # Errors
    ///
    /// Returns [`catalog_core::CatalogError::Internal`] if the connection
    /// cannot be established.
    pub async fn connect(database_url: &str) -> CatalogResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Run the embedded schema migrations against the connected database.
    ///
    /// # Errors
    ///
    /// Returns [`catalog_core::CatalogError::Internal`] if any migration
    /// fails to apply.
    pub async fn migrate(&self) -> CatalogResult<()> {
        let migrator = sqlx_core::migrate::Migrator::new(std::path::Path::new(
            concat!(env!("CARGO_MANIFEST_DIR"), "/migrations"),
        ))
        .await
        .map_err(|e| catalog_core::CatalogError::internal(format!("failed to load migrations: {e}")))?;

        migrator
            .run(&self.pool)
            .await
            .map_err(|e| catalog_core::CatalogError::internal(format!("migration failed: {e}")))
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
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
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgCatalogTransaction::new(tx)))
    }
}

/// Convenience alias for handing a [`PgCatalogStore`] around behind the
/// storage-agnostic trait object the orchestrator and evaluator expect.
#[must_use]
pub fn as_catalog_store(store: PgCatalogStore) -> Arc<dyn CatalogStore> {
    Arc::new(store)
}
