use thiserror::Error;

/// Error taxonomy shared by every crate in the policy catalog and
/// authorization engine: the catalog store, the seed orchestrator, and the
/// evaluator. A layer may add context to an error but must never remap its
/// kind into something less specific than this.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A caller-supplied value failed validation before reaching storage
    /// (malformed `service_id`, empty required field, scope/organization
    /// mismatch).
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An entity lookup failed to find a matching row.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// A uniqueness constraint was violated (role name, permission link).
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The evaluator returned Deny, or the caller lacks rights to seed.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Missing or invalid token. Normally surfaced by the request pipeline
    /// rather than raised by the core itself; modeled here so the core's
    /// error type is a strict superset of what callers need to map to.
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// The operation's preconditions were not met (deleting a static
    /// action, seeding an unregistered `service_id`).
    #[error("Failed precondition: {message}")]
    FailedPrecondition { message: String },

    /// Storage failure or an unexpected invariant violation (e.g. a cycle
    /// observed in the role-parent graph).
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// The calling context was cancelled before the operation completed.
    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    /// The calling context's deadline elapsed before the operation
    /// completed.
    #[error("Deadline exceeded: {message}")]
    DeadlineExceeded { message: String },
}

impl CatalogError {
    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new NotFound error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new PermissionDenied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new Unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a new FailedPrecondition error
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            message: message.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new Cancelled error
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Create a new DeadlineExceeded error
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            message: message.into(),
        }
    }

    /// True if this error means an entity lookup came up empty, as
    /// distinct from a general storage failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True if this error was raised by a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this error is a client error (4xx category): something a
    /// caller can fix by changing its request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::PermissionDenied { .. }
                | Self::Unauthenticated { .. }
                | Self::FailedPrecondition { .. }
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::PermissionDenied { .. } => ErrorCategory::Authorization,
            Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::FailedPrecondition { .. } => ErrorCategory::Precondition,
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => ErrorCategory::Cancellation,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Authorization,
    Authentication,
    Precondition,
    Internal,
    Cancellation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Authorization => write!(f, "authorization"),
            Self::Authentication => write!(f, "authentication"),
            Self::Precondition => write!(f, "precondition"),
            Self::Internal => write!(f, "internal"),
            Self::Cancellation => write!(f, "cancellation"),
        }
    }
}

/// Convenience result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Alias for [`Result`], spelled out for call sites that import several
/// crates' result aliases side by side and want the type unambiguous at
/// a glance.
pub type CatalogResult<T> = Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CatalogError::invalid_argument("bad service_id");
        assert_eq!(err.to_string(), "Invalid argument: bad service_id");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_not_found_error() {
        let err = CatalogError::not_found("Role admin");
        assert_eq!(err.to_string(), "Not found: Role admin");
        assert!(err.is_client_error());
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_conflict_error() {
        let err = CatalogError::conflict("role name already taken");
        assert_eq!(err.to_string(), "Conflict: role name already taken");
        assert!(err.is_client_error());
        assert!(err.is_conflict());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_failed_precondition_error() {
        let err = CatalogError::failed_precondition("action is static");
        assert_eq!(err.to_string(), "Failed precondition: action is static");
        assert!(err.is_client_error());
        assert_eq!(err.category(), ErrorCategory::Precondition);
    }

    #[test]
    fn test_permission_denied_error() {
        let err = CatalogError::permission_denied("no matching permission");
        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_cancellation_errors() {
        assert_eq!(
            CatalogError::cancelled("ctx done").category(),
            ErrorCategory::Cancellation
        );
        assert_eq!(
            CatalogError::deadline_exceeded("timed out").category(),
            ErrorCategory::Cancellation
        );
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Authorization.to_string(), "authorization");
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Precondition.to_string(), "precondition");
        assert_eq!(ErrorCategory::Internal.to_string(), "internal");
        assert_eq!(ErrorCategory::Cancellation.to_string(), "cancellation");
    }

    #[test]
    fn test_client_vs_server_error_classification() {
        assert!(CatalogError::invalid_argument("bad").is_client_error());
        assert!(CatalogError::not_found("x").is_client_error());
        assert!(CatalogError::conflict("x").is_client_error());

        let server_err = CatalogError::internal("db connection lost");
        assert!(server_err.is_server_error());
        assert!(!server_err.is_client_error());
    }

    #[test]
    fn test_result_type_usage() {
        fn test_function() -> Result<String> {
            Ok("success".to_string())
        }

        fn test_function_error() -> Result<String> {
            Err(CatalogError::not_found("bad"))
        }

        assert!(test_function().is_ok());
        assert!(test_function_error().is_err());
    }

    #[test]
    fn test_error_category_equality() {
        assert_eq!(ErrorCategory::Validation, ErrorCategory::Validation);
        assert_ne!(ErrorCategory::Validation, ErrorCategory::NotFound);
    }
}
