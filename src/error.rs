//! Error types for ACL matching and pattern expansion

use thiserror::Error;

/// Errors reported by the matcher, the validator and the template expander.
///
/// `Ok(false)` from a matcher is a definitive "no match"; an `AclError`
/// means the inputs could not be evaluated at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    /// Missing or malformed topic filter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Output buffer for an expanded pattern could not be allocated
    #[error("Allocation failure while expanding pattern template")]
    AllocationFailure,
}

impl AclError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Short label for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            AclError::InvalidArgument(_) => "invalid_argument",
            AclError::AllocationFailure => "allocation_failure",
        }
    }
}

/// Result alias for ACL operations
pub type Result<T> = std::result::Result<T, AclError>;
