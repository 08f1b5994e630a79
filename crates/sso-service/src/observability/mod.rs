//! Observability for the SSO service.
//!
//! # Privacy
//!
//! Instrumentation uses `#[instrument(skip_all)]` and explicit field
//! allow-listing:
//! - **SAFE**: operation names, roles, ids, app ids, outcome labels
//! - **HASHED**: emails, logged as `email_hash` via [`hash_for_correlation`]
//! - **NEVER**: passwords, password hashes, tokens, app secrets

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};

use crate::errors::SsoError;
use sha2::{Digest, Sha256};

/// Hash a value for log correlation (SHA-256, first 8 hex chars).
///
/// One-way and truncated; suitable for correlating log lines about the
/// same email, not for protecting secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let prefix: Vec<u8> = digest.iter().take(4).copied().collect();
    hex::encode(prefix)
}

/// Error categories for metrics labels (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input rejected (bad role, malformed argument)
    Validation,
    /// Wrong password
    Authentication,
    /// Unknown user
    NotFound,
    /// Duplicate user
    Conflict,
    /// Storage, crypto and everything else
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&SsoError> for ErrorCategory {
    fn from(err: &SsoError) -> Self {
        match err {
            SsoError::InvalidRole(_) | SsoError::InvalidArgument(_) => ErrorCategory::Validation,
            SsoError::InvalidCredentials => ErrorCategory::Authentication,
            SsoError::UserNotFound => ErrorCategory::NotFound,
            SsoError::UserExists => ErrorCategory::Conflict,
            SsoError::AppNotFound
            | SsoError::InvalidToken(_)
            | SsoError::TokenGeneration(_)
            | SsoError::Crypto(_)
            | SsoError::Database(_)
            | SsoError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_for_correlation_consistency() {
        let first = hash_for_correlation("alice@example.com");
        let second = hash_for_correlation("alice@example.com");
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_for_correlation_shape() {
        let hash = hash_for_correlation("alice@example.com");
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!hash.contains("alice"));
        assert_ne!(hash, hash_for_correlation("bob@example.com"));
    }

    #[test]
    fn test_error_category_mapping() {
        assert_eq!(
            ErrorCategory::from(&SsoError::InvalidRole("x".to_string())),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCategory::from(&SsoError::InvalidCredentials),
            ErrorCategory::Authentication
        );
        assert_eq!(
            ErrorCategory::from(&SsoError::UserExists),
            ErrorCategory::Conflict
        );
        assert_eq!(
            ErrorCategory::from(&SsoError::UserNotFound),
            ErrorCategory::NotFound
        );
        assert_eq!(ErrorCategory::NotFound.as_str(), "not_found");
        assert_eq!(
            ErrorCategory::from(&SsoError::Database("x".to_string())),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCategory::Internal.as_str(), "internal");
    }
}
