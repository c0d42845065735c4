//! Event types published by evented stores.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::key::ObjectKey;
use crate::object::OwnerReference;

/// Type of store change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEventType {
    Created,
    Updated,
    Deleted,
}

impl StoreEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEventType::Created => "created",
            StoreEventType::Updated => "updated",
            StoreEventType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for StoreEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of object an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    SyncSpec,
    Document,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::SyncSpec => write!(f, "syncspec"),
            ObjectKind::Document => write!(f, "document"),
        }
    }
}

/// A change to a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    pub event_type: StoreEventType,
    pub object_kind: ObjectKind,
    pub key: ObjectKey,
    /// Uid of the changed object, when the kind has one (specs).
    pub uid: Option<String>,
    /// Owner of the changed object, when it has one (documents).
    pub owner: Option<OwnerReference>,
    /// Version after the change (None for deletions).
    pub version: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl StoreEvent {
    pub fn new(event_type: StoreEventType, object_kind: ObjectKind, key: ObjectKey) -> Self {
        Self {
            event_type,
            object_kind,
            key,
            uid: None,
            owner: None,
            version: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn spec(event_type: StoreEventType, key: ObjectKey, uid: impl Into<String>) -> Self {
        Self::new(event_type, ObjectKind::SyncSpec, key).with_uid(uid)
    }

    pub fn document(
        event_type: StoreEventType,
        key: ObjectKey,
        owner: Option<OwnerReference>,
    ) -> Self {
        let mut event = Self::new(event_type, ObjectKind::Document, key);
        event.owner = owner;
        event
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn is_deletion(&self) -> bool {
        self.event_type == StoreEventType::Deleted
    }

    /// Key of the object whose reconcile this event should trigger.
    ///
    /// Spec events map to the spec itself; document events map to the
    /// controlling owner of the given kind, if any.
    pub fn reconcile_key(&self, owner_kind: &str) -> Option<ObjectKey> {
        match self.object_kind {
            ObjectKind::SyncSpec => Some(self.key.clone()),
            ObjectKind::Document => self
                .owner
                .as_ref()
                .filter(|owner| owner.controller && owner.kind == owner_kind)
                .map(|owner| self.key.sibling(owner.name.clone())),
        }
    }
}
