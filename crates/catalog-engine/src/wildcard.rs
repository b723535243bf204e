//! The wildcard expander.
//!
//! Compiles abstract permission patterns (`"*:*"`, `"farmer:*"`,
//! `"*:read"`, `"ledger:post"`) into a concrete, deduplicated set of
//! `(resource, action)` pairs against a snapshot of the catalog's
//! resources and actions. Pure and synchronous: no I/O, no clocks, no
//! randomness — the same inputs always produce the same output.

use crate::entities::{Action, Resource};

/// One side of a permission pattern: either a literal name or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Wildcard,
}

impl<'a> Token<'a> {
    fn parse(raw: &'a str) -> Self {
        if raw == "*" {
            Token::Wildcard
        } else {
            Token::Literal(raw)
        }
    }
}

/// Split a raw pattern into resource/action tokens.
///
/// Returns `None` if the pattern does not split into exactly two
/// non-empty tokens around the first `:` — such patterns are dropped
/// with a warning by the caller, never treated as an error.
fn split_pattern(pattern: &str) -> Option<(Token<'_>, Token<'_>)> {
    let (resource, action) = pattern.split_once(':')?;
    if resource.is_empty() || action.is_empty() || action.contains(':') {
        return None;
    }
    Some((Token::parse(resource), Token::parse(action)))
}

/// Expand a list of permission patterns against a snapshot of resources
/// and actions into an ordered, deduplicated list of `(Resource, Action)`
/// pairs.
///
/// Malformed patterns (not exactly two `:`-separated non-empty tokens)
/// are dropped with a `tracing::warn!`. Literal tokens that match nothing
/// in the snapshot contribute nothing — this is never an error. The
/// output is deduplicated by the key `"<resource.name>:<action.name>"`;
/// the first emission wins, so iteration order is stable for a given
/// input order even though the result is a set.
#[must_use]
pub fn expand<'a>(
    patterns: &[String],
    resources: &'a [Resource],
    actions: &'a [Action],
) -> Vec<(&'a Resource, &'a Action)> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for pattern in patterns {
        let Some((resource_token, action_token)) = split_pattern(pattern) else {
            tracing::warn!(pattern = %pattern, "dropping malformed permission pattern");
            continue;
        };

        let matched_resources: Vec<&Resource> = match resource_token {
            Token::Wildcard => resources.iter().collect(),
            Token::Literal(name) => resources.iter().filter(|r| r.name == name).collect(),
        };
        let matched_actions: Vec<&Action> = match action_token {
            Token::Wildcard => actions.iter().collect(),
            Token::Literal(name) => actions.iter().filter(|a| a.name == name).collect(),
        };

        for resource in &matched_resources {
            for action in &matched_actions {
                let key = format!("{}:{}", resource.name, action.name);
                if seen.insert(key) {
                    out.push((*resource, *action));
                }
            }
        }
    }

    out
}

/// Does the concrete permission name `"R:A"` match pattern `"P_r:P_a"`?
///
/// `"*:*"` matches everything; otherwise each side matches iff the
/// pattern side is `*` or equals the concrete side exactly.
#[must_use]
pub fn matches(concrete: &str, pattern: &str) -> bool {
    let Some((concrete_resource, concrete_action)) = concrete.split_once(':') else {
        return false;
    };
    let Some((pattern_resource, pattern_action)) = pattern.split_once(':') else {
        return false;
    };

    (pattern_resource == "*" || pattern_resource == concrete_resource)
        && (pattern_action == "*" || pattern_action == concrete_action)
}

/// Does any pattern in `patterns` match the concrete permission name?
#[must_use]
pub fn matches_any<'a>(concrete: &str, patterns: impl IntoIterator<Item = &'a str>) -> bool {
    patterns.into_iter().any(|pattern| matches(concrete, pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> Vec<Resource> {
        vec![
            Resource::new("farmer", "farmers-module", "a farmer", None),
            Resource::new("farm", "farmers-module", "a farm", None),
        ]
    }

    fn actions() -> Vec<Action> {
        vec![
            Action::new("read", "read", "general", false, None),
            Action::new("delete", "delete", "general", false, None),
        ]
    }

    #[test]
    fn test_literal_pattern_expands_to_single_pair() {
        let out = expand(&["farmer:read".to_string()], &resources(), &actions());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0.name, "farmer");
        assert_eq!(out[0].1.name, "read");
    }

    #[test]
    fn test_wildcard_resource_expands_to_all_resources() {
        let out = expand(&["*:read".to_string()], &resources(), &actions());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_wildcard_action_expands_to_all_actions() {
        let out = expand(&["farmer:*".to_string()], &resources(), &actions());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_full_wildcard_expands_to_cartesian_product() {
        let out = expand(&["*:*".to_string()], &resources(), &actions());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_malformed_pattern_is_dropped_not_errored() {
        let out = expand(&["no-colon-here".to_string()], &resources(), &actions());
        assert!(out.is_empty());

        let out = expand(&["a:b:c".to_string()], &resources(), &actions());
        assert!(out.is_empty());

        let out = expand(&[":read".to_string()], &resources(), &actions());
        assert!(out.is_empty());
    }

    #[test]
    fn test_unmatched_literal_contributes_nothing() {
        let out = expand(&["nonexistent:read".to_string()], &resources(), &actions());
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_pattern_list_yields_zero_output() {
        let out = expand(&[], &resources(), &actions());
        assert!(out.is_empty());
    }

    #[test]
    fn test_deduplication_first_emission_wins() {
        let out = expand(
            &["farmer:read".to_string(), "*:*".to_string()],
            &resources(),
            &actions(),
        );
        let farmer_read_count = out
            .iter()
            .filter(|(r, a)| r.name == "farmer" && a.name == "read")
            .count();
        assert_eq!(farmer_read_count, 1);
    }

    #[test]
    fn test_matching_reflexive() {
        assert!(matches("farm:delete", "farm:delete"));
    }

    #[test]
    fn test_full_wildcard_matches_everything() {
        assert!(matches("farm:delete", "*:*"));
        assert!(matches("anything:at-all", "*:*"));
    }

    #[test]
    fn test_partial_wildcard_matching() {
        assert!(matches("farm:delete", "farm:*"));
        assert!(matches("farm:delete", "*:delete"));
        assert!(!matches("farm:delete", "farm:read"));
        assert!(!matches("farm:delete", "cycle:delete"));
    }

    #[test]
    fn test_matches_any() {
        let patterns = vec!["farm:*", "cycle:read"];
        assert!(matches_any("farm:delete", patterns.clone()));
        assert!(!matches_any("cycle:delete", patterns));
    }
}
