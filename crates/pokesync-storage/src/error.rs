//! Storage error types.

use std::fmt;

use pokesync_core::{ObjectKey, ObjectKind};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("Object not found: {kind} {key}")]
    NotFound {
        /// The kind of object that was not found.
        kind: ObjectKind,
        /// The key of the object that was not found.
        key: ObjectKey,
    },

    /// A conditional write observed a different version than expected.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// The version the writer last observed.
        expected: String,
        /// The version currently stored.
        actual: String,
    },

    /// Attempted to create an object that already exists.
    #[error("Object already exists: {kind} {key}")]
    AlreadyExists {
        /// The kind of object that already exists.
        kind: ObjectKind,
        /// The key of the object that already exists.
        key: ObjectKey,
    },

    /// The object data is invalid.
    #[error("Invalid object: {message}")]
    InvalidObject {
        /// Description of why the object is invalid.
        message: String,
    },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: ObjectKind, key: &ObjectKey) -> Self {
        Self::NotFound {
            kind,
            key: key.clone(),
        }
    }

    /// Creates a new `VersionConflict` error.
    #[must_use]
    pub fn version_conflict(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionConflict {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: ObjectKind, key: &ObjectKey) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.clone(),
        }
    }

    /// Creates a new `InvalidObject` error.
    #[must_use]
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::VersionConflict { .. } => ErrorCategory::Conflict,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::InvalidObject { .. } => ErrorCategory::Validation,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Object not found.
    NotFound,
    /// Conflict (version or existence).
    Conflict,
    /// Validation error.
    Validation,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
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
    fn test_error_display() {
        let err = StorageError::not_found(ObjectKind::Document, &key());
        assert_eq!(
            err.to_string(),
            "Object not found: document default/pikachu-config"
        );

        let err = StorageError::version_conflict("1", "2");
        assert_eq!(err.to_string(), "Version conflict: expected 1, found 2");

        let err = StorageError::already_exists(ObjectKind::SyncSpec, &key());
        assert_eq!(
            err.to_string(),
            "Object already exists: syncspec default/pikachu-config"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found(ObjectKind::Document, &key());
        assert!(err.is_not_found());
        assert!(!err.is_version_conflict());
        assert!(!err.is_already_exists());

        let err = StorageError::version_conflict("1", "2");
        assert!(!err.is_not_found());
        assert!(err.is_version_conflict());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::version_conflict("1", "2").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::already_exists(ObjectKind::Document, &key()).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::invalid_object("bad data").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::connection_error("refused").category(),
            ErrorCategory::Infrastructure
        );
    }
}
