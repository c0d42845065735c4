//! Reconcile error taxonomy.

use std::fmt;

use pokesync_core::ObjectKey;
use pokesync_pokeapi::FetchError;
use pokesync_storage::StorageError;

/// Errors returned by [`Reconciler::reconcile`](crate::Reconciler::reconcile).
///
/// A spec that no longer exists is not an error. Every variant except
/// `Cancelled` should be retried by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The spec store could not be read.
    #[error("Failed to read spec {key}: {source}")]
    SpecLookup {
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    /// The external record could not be fetched.
    #[error("Failed to fetch subject {subject:?}: {source}")]
    Fetch {
        subject: String,
        #[source]
        source: FetchError,
    },

    /// The target document could not be read.
    #[error("Failed to read document {key}: {source}")]
    StoreRead {
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    /// The target document could not be written, including version conflicts.
    #[error("Failed to write document {key}: {source}")]
    StoreWrite {
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    /// The target document is owned by another object.
    #[error("Document {key} is owned by another object (uid {owner_uid})")]
    OwnershipConflict { key: ObjectKey, owner_uid: String },

    /// The invocation was cancelled before it completed.
    #[error("Reconcile cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Returns `true` if the caller should re-invoke reconcile later.
    pub fn is_retryable(&self) -> bool {
        !self.is_cancelled()
    }

    /// Returns `true` if the invocation was cancelled.
    ///
    /// Cancellation is not a failure and must not count toward backoff.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if a conditional write lost against a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::StoreWrite { source, .. } => {
                source.is_version_conflict() || source.is_already_exists()
            }
            Self::OwnershipConflict { .. } => true,
            _ => false,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> ReconcileErrorCategory {
        match self {
            Self::SpecLookup { .. } => ReconcileErrorCategory::SpecLookup,
            Self::Fetch { .. } => ReconcileErrorCategory::FetchFailure,
            Self::StoreRead { .. } => ReconcileErrorCategory::StoreRead,
            Self::StoreWrite { .. } | Self::OwnershipConflict { .. } => {
                ReconcileErrorCategory::StoreWrite
            }
            Self::Cancelled => ReconcileErrorCategory::Cancelled,
        }
    }
}

/// Categories of reconcile errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileErrorCategory {
    SpecLookup,
    FetchFailure,
    StoreRead,
    StoreWrite,
    Cancelled,
}

impl fmt::Display for ReconcileErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecLookup => write!(f, "spec_lookup"),
            Self::FetchFailure => write!(f, "fetch_failure"),
            Self::StoreRead => write!(f, "store_read"),
            Self::StoreWrite => write!(f, "store_write"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ObjectKey {
        ObjectKey::new("default", "pikachu-config")
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        assert!(ReconcileError::Cancelled.is_cancelled());
        assert!(!ReconcileError::Cancelled.is_retryable());
        assert_eq!(
            ReconcileError::Cancelled.category(),
            ReconcileErrorCategory::Cancelled
        );
    }

    #[test]
    fn test_version_conflict_is_retryable_conflict() {
        let err = ReconcileError::StoreWrite {
            key: key(),
            source: StorageError::version_conflict("3", "4"),
        };
        assert!(err.is_retryable());
        assert!(err.is_conflict());
        assert_eq!(err.category(), ReconcileErrorCategory::StoreWrite);
        assert_eq!(
            err.to_string(),
            "Failed to write document default/pikachu-config: Version conflict: expected 3, found 4"
        );
    }

    #[test]
    fn test_fetch_failure_category() {
        let err = ReconcileError::Fetch {
            subject: "missingno".to_string(),
            source: FetchError::HttpError(404),
        };
        assert!(err.is_retryable());
        assert!(!err.is_conflict());
        assert_eq!(err.category(), ReconcileErrorCategory::FetchFailure);
        assert_eq!(err.category().to_string(), "fetch_failure");
    }
}
