//! Identifier generation and the `service_id` validation grammar.
//!
//! Catalog entities use opaque string identifiers backed by UUIDv4; the one
//! identifier with user-facing structure is `service_id`, which names a
//! registered [`Provider`](crate) and is validated before it ever reaches a
//! query, per the positive grammar `^[a-z][a-z0-9-]*[a-z0-9]$` plus an
//! injection-shaped-substring blocklist.

use crate::error::CatalogError;

/// Disallowed substrings, checked case-insensitively against a raw
/// `service_id` before the positive grammar is even applied. These are not
/// exploitable through the bound-parameter query layer but a `service_id`
/// containing them is almost certainly a mistake or a probe, so it is
/// rejected outright rather than passed through.
const BLOCKED_SUBSTRINGS: &[&str] = &[
    "'", "\"", ";", "--", "/*", "*/", "xp_", "sp_", "exec", "execute", "select", "insert",
    "update", "delete", "drop", "create", "alter", "union", "script",
];

/// Generate a new opaque entity identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validate a `service_id` against the grammar of spec §6.
///
/// An empty string is accepted and means "use the built-in default
/// provider" (see the Seed Orchestrator). Any other value must be
/// lowercase ASCII letters, digits, and `-`; must start with a letter and
/// end with a letter or digit; be 2-255 characters; contain no consecutive
/// `-`; and must not contain any blocked substring.
pub fn validate_service_id(service_id: &str) -> Result<(), CatalogError> {
    if service_id.is_empty() {
        return Ok(());
    }

    let lower = service_id.to_ascii_lowercase();
    for blocked in BLOCKED_SUBSTRINGS {
        if lower.contains(blocked) {
            return Err(CatalogError::invalid_argument(format!(
                "service_id contains disallowed substring: {blocked}"
            )));
        }
    }

    if !(2..=255).contains(&service_id.len()) {
        return Err(CatalogError::invalid_argument(
            "service_id must be 2-255 characters",
        ));
    }

    if service_id.contains("--") {
        return Err(CatalogError::invalid_argument(
            "service_id must not contain consecutive hyphens",
        ));
    }

    let bytes = service_id.as_bytes();
    let valid_chars = bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
    let starts_with_letter = bytes.first().is_some_and(|b| b.is_ascii_lowercase());
    let ends_with_alnum = bytes
        .last()
        .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());

    if !valid_chars || !starts_with_letter || !ends_with_alnum {
        return Err(CatalogError::invalid_argument(
            "service_id must match ^[a-z][a-z0-9-]*[a-z0-9]$",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_uuid_shaped() {
        let id = generate_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_id_is_unique() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_empty_service_id_is_default() {
        assert!(validate_service_id("").is_ok());
    }

    #[test]
    fn test_valid_service_ids() {
        assert!(validate_service_id("farmers").is_ok());
        assert!(validate_service_id("farmers-module").is_ok());
        assert!(validate_service_id("a1").is_ok());
        assert!(validate_service_id("service-123-abc").is_ok());
    }

    #[test]
    fn test_rejects_too_short() {
        assert!(validate_service_id("a").is_err());
    }

    #[test]
    fn test_rejects_leading_digit_or_hyphen() {
        assert!(validate_service_id("1service").is_err());
        assert!(validate_service_id("-service").is_err());
    }

    #[test]
    fn test_rejects_trailing_hyphen() {
        assert!(validate_service_id("service-").is_err());
    }

    #[test]
    fn test_rejects_consecutive_hyphens() {
        assert!(validate_service_id("ser--vice").is_err());
    }

    #[test]
    fn test_rejects_uppercase() {
        assert!(validate_service_id("Farmers").is_err());
    }

    #[test]
    fn test_rejects_sql_injection_attempt() {
        let err = validate_service_id("drop table users;--").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_rejects_blocked_keywords() {
        assert!(validate_service_id("select-all").is_err());
        assert!(validate_service_id("my-exec-service").is_err());
    }

    #[test]
    fn test_rejects_quote_and_semicolon() {
        assert!(validate_service_id("a'b").is_err());
        assert!(validate_service_id("a;b").is_err());
    }
}
