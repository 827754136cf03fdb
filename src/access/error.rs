// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed denials returned by the access control engine.

use crate::storage::StorageError;

/// Failure taxonomy of the engine.
///
/// Policy denials (`NotFound`, `PermissionDenied`, `OwnershipConflict`,
/// `InvalidState`) are terminal for the request. Store failures
/// (`Unavailable`, `Conflict`) are kept apart so callers can apply their own
/// retry policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Resource absent or soft-deleted
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Role or grant insufficient for the action
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Action would break an ownership invariant
    #[error("ownership conflict: {0}")]
    OwnershipConflict(String),

    /// Malformed input value
    #[error("invalid input: {0}")]
    InvalidState(String),

    /// Backing store failed
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store constraint violated
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Result type for engine operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AccessError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::NotFound { .. } => "not_found",
            AccessError::PermissionDenied(_) => "permission_denied",
            AccessError::OwnershipConflict(_) => "ownership_conflict",
            AccessError::InvalidState(_) => "invalid_state",
            AccessError::Unavailable(_) => "unavailable",
            AccessError::Conflict(_) => "conflict",
        }
    }

    /// Whether this is a policy decision rather than a store failure.
    pub fn is_denial(&self) -> bool {
        !matches!(
            self,
            AccessError::Unavailable(_) | AccessError::Conflict(_)
        )
    }
}

impl From<StorageError> for AccessError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict(msg) => AccessError::Conflict(msg),
            other => AccessError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct() {
        let errors = [
            AccessError::not_found("group", "g1"),
            AccessError::PermissionDenied("x".into()),
            AccessError::OwnershipConflict("x".into()),
            AccessError::InvalidState("x".into()),
            AccessError::Unavailable("x".into()),
            AccessError::Conflict("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(AccessError::error_code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn store_errors_are_not_denials() {
        let conflict: AccessError = StorageError::Conflict("email taken".into()).into();
        assert_eq!(conflict, AccessError::Conflict("email taken".into()));
        assert!(!conflict.is_denial());

        let denied = AccessError::PermissionDenied("nope".into());
        assert!(denied.is_denial());
    }

    #[test]
    fn not_found_message_names_resource() {
        let err = AccessError::not_found("note", "n-1");
        assert_eq!(err.to_string(), "note not found: n-1");
    }
}
