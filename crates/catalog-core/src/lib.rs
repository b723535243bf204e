//! Shared error taxonomy and identifier utilities for the policy catalog
//! and authorization engine.
//!
//! This crate has no knowledge of the catalog's entities, storage, or
//! evaluation logic — it exists so that `catalog-engine` and
//! `catalog-postgres` share one error type and one `service_id` grammar
//! instead of each growing their own.

pub mod error;
pub mod id;

pub use error::{CatalogError, CatalogResult, ErrorCategory, Result};
pub use id::{generate_id, validate_service_id};
