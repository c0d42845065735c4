//! Stored object types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use pokesync_core::{DocumentData, ObjectKey, OwnerReference, StoredSpec, TargetDocument};

/// A target document as held by a document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub key: ObjectKey,
    pub document: TargetDocument,
    /// Opaque version token; changes on every committed write.
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StoredDocument {
    /// Creates a new `StoredDocument`.
    #[must_use]
    pub fn new(key: ObjectKey, document: TargetDocument, version: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            key,
            document,
            version: version.into(),
            last_updated: now,
            created_at: now,
        }
    }

    /// Creates the next version of this document with new content.
    #[must_use]
    pub fn new_version(&self, version: impl Into<String>, document: TargetDocument) -> Self {
        Self {
            key: self.key.clone(),
            document,
            version: version.into(),
            last_updated: OffsetDateTime::now_utc(),
            created_at: self.created_at,
        }
    }

    pub fn data(&self) -> &DocumentData {
        &self.document.data
    }

    pub fn owner(&self) -> Option<&OwnerReference> {
        self.document.owner.as_ref()
    }
}

/// Result of [`SpecStore::apply`](crate::SpecStore::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecApply {
    /// No spec existed under the key.
    Created(StoredSpec),
    /// The attributes changed; uid kept, new version assigned.
    Updated(StoredSpec),
    /// The attributes were identical; nothing was written.
    Unchanged(StoredSpec),
}

impl SpecApply {
    pub fn spec(&self) -> &StoredSpec {
        match self {
            Self::Created(spec) | Self::Updated(spec) | Self::Unchanged(spec) => spec,
        }
    }

    pub fn into_spec(self) -> StoredSpec {
        match self {
            Self::Created(spec) | Self::Updated(spec) | Self::Unchanged(spec) => spec,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}
