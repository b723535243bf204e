//! # catalog-engine
//!
//! The policy catalog and authorization engine: the data model of
//! principals/roles/permissions/resources/actions, the wildcard-expansion
//! algorithm, the idempotent multi-provider seeding orchestrator, the
//! permission-check evaluator, and the role-assignment lifecycle.
//!
//! HTTP/RPC handlers, password hashing, token issuance, user CRUD, and
//! the underlying relational store's wire protocol are out of scope —
//! this crate is storage-agnostic, written against the [`store`]
//! traits, and a concrete backend (e.g. `catalog-postgres`) is plugged
//! in by the binary that assembles the service.
//!
//! ## Modules
//!
//! - [`entities`] — the seven catalog entities (Action, Resource,
//!   Permission, Role, RolePermission, UserRole, ServiceRoleMapping)
//! - [`filter`] — structured query predicates for the store's `find`
//! - [`store`] — the Catalog Store contract and transaction boundary
//! - [`wildcard`] — the wildcard expansion and matching algorithm
//! - [`registry`] — the thread-safe Seed Provider Registry
//! - [`providers`] — concrete `Provider` implementations (the built-in
//!   default farmers-module catalog)
//! - [`orchestrator`] — the Seed Orchestrator
//! - [`cache`] — the Authorization Evaluator's per-principal permission
//!   cache
//! - [`evaluator`] — the Authorization Evaluator
//! - [`assignment`] — the handler-facing `CatalogFacade`
//! - [`config`] — configuration for seeding and the evaluator cache

pub mod assignment;
pub mod cache;
pub mod config;
pub mod entities;
pub mod evaluator;
pub mod filter;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod store;
pub mod wildcard;

pub use assignment::{CatalogFacade, RolePermissionView, UserRoleView};
pub use cache::{EffectivePermission, PermissionCache};
pub use config::{CatalogConfig, EvaluatorCacheConfig, SeedConfig};
pub use evaluator::{AuthorizationEvaluator, Decision, RequestContext};
pub use orchestrator::{SeedOrchestrator, SeedResult};
pub use registry::{Provider, ProviderRegistry, RoleDefinition};
pub use store::{
    ActionStore, CatalogStore, CatalogTransaction, PermissionStore, ResourceStore,
    RolePermissionStore, RoleStore, ServiceRoleMappingStore, UserRoleStore,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use catalog_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assignment::{CatalogFacade, RolePermissionView, UserRoleView};
    pub use crate::cache::{EffectivePermission, PermissionCache};
    pub use crate::config::{CatalogConfig, EvaluatorCacheConfig, SeedConfig};
    pub use crate::entities::{
        Action, Permission, Resource, Role, RolePermission, RoleScope, ServiceRoleMapping,
        UserRole,
    };
    pub use crate::evaluator::{AuthorizationEvaluator, Decision, RequestContext};
    pub use crate::filter::{Filter, Predicate};
    pub use crate::orchestrator::{SeedOrchestrator, SeedResult};
    pub use crate::registry::{Provider, ProviderRegistry, RoleDefinition};
    pub use crate::store::{
        ActionStore, CatalogStore, CatalogTransaction, PermissionStore, ResourceStore,
        RolePermissionStore, RoleStore, ServiceRoleMappingStore, UserRoleStore,
    };
}
