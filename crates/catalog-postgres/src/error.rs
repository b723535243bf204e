//! Mapping from `sqlx` errors to the shared [`CatalogError`] taxonomy.

use catalog_core::CatalogError;

/// Translate a storage-layer failure into the shared error taxonomy.
/// Unique-constraint violations are reported as `Conflict`; everything
/// else is `Internal` — the store never lets a raw database error cross
/// the trait boundary.
pub fn map_sqlx_error(err: sqlx_core::Error) -> CatalogError {
    if let sqlx_core::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return CatalogError::conflict(db_err.message().to_string());
        }
        if db_err.is_foreign_key_violation() {
            return CatalogError::invalid_argument(db_err.message().to_string());
        }
    }
    CatalogError::internal(err.to_string())
}
