//! Store wrappers that publish a [`StoreEvent`] after each successful mutation.
//!
//! # Example
//!
//! ```ignore
//! use pokesync_core::EventBroadcaster;
//! use pokesync_storage::EventedDocumentStore;
//!
//! let broadcaster = EventBroadcaster::new_shared();
//! let store = EventedDocumentStore::new(InMemoryDocumentStore::new(), broadcaster);
//!
//! // After this, a Created event is published
//! store.create(&key, &data, Some(&owner)).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use pokesync_core::{
    DocumentData, EventBroadcaster, ObjectKey, OwnerReference, StoreEvent, StoreEventType,
    StoredSpec, SyncSpec,
};

use crate::error::StorageError;
use crate::traits::{DocumentStore, SpecStore};
use crate::types::{SpecApply, StoredDocument};

fn publish(broadcaster: &EventBroadcaster, event: StoreEvent) {
    if !broadcaster.has_subscribers() {
        return;
    }
    let kind = event.object_kind;
    let event_type = event.event_type;
    let key = event.key.clone();
    let count = broadcaster.send(event);
    debug!(
        kind = %kind,
        event = %event_type,
        key = %key,
        subscribers = count,
        "Published store event"
    );
}

/// Spec store wrapper that publishes spec events.
pub struct EventedSpecStore<S: SpecStore> {
    inner: S,
    broadcaster: Arc<EventBroadcaster>,
}

impl<S: SpecStore> EventedSpecStore<S> {
    pub fn new(inner: S, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { inner, broadcaster }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }
}

#[async_trait]
impl<S: SpecStore> SpecStore for EventedSpecStore<S> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredSpec>, StorageError> {
        self.inner.get(key).await
    }

    async fn apply(&self, spec: SyncSpec) -> Result<SpecApply, StorageError> {
        let outcome = self.inner.apply(spec).await?;

        let event_type = match &outcome {
            SpecApply::Created(_) => StoreEventType::Created,
            SpecApply::Updated(_) => StoreEventType::Updated,
            SpecApply::Unchanged(_) => return Ok(outcome),
        };
        let stored = outcome.spec();
        publish(
            &self.broadcaster,
            StoreEvent::spec(event_type, stored.key().clone(), &stored.uid)
                .with_version(&stored.version),
        );

        Ok(outcome)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredSpec, StorageError> {
        let deleted = self.inner.delete(key).await?;
        publish(
            &self.broadcaster,
            StoreEvent::spec(StoreEventType::Deleted, key.clone(), &deleted.uid),
        );
        Ok(deleted)
    }

    async fn list(&self) -> Result<Vec<StoredSpec>, StorageError> {
        self.inner.list().await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

impl<S: SpecStore> std::fmt::Debug for EventedSpecStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventedSpecStore")
            .field("backend", &self.inner.backend_name())
            .field("subscriber_count", &self.broadcaster.subscriber_count())
            .finish()
    }
}

/// Document store wrapper that publishes document events.
pub struct EventedDocumentStore<S: DocumentStore> {
    inner: S,
    broadcaster: Arc<EventBroadcaster>,
}

impl<S: DocumentStore> EventedDocumentStore<S> {
    pub fn new(inner: S, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { inner, broadcaster }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    fn emit(&self, event_type: StoreEventType, stored: &StoredDocument) {
        let mut event =
            StoreEvent::document(event_type, stored.key.clone(), stored.owner().cloned());
        if event_type != StoreEventType::Deleted {
            event = event.with_version(&stored.version);
        }
        publish(&self.broadcaster, event);
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for EventedDocumentStore<S> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredDocument>, StorageError> {
        self.inner.get(key).await
    }

    async fn create(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
    ) -> Result<StoredDocument, StorageError> {
        let stored = self.inner.create(key, data, owner).await?;
        self.emit(StoreEventType::Created, &stored);
        Ok(stored)
    }

    async fn update(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
        expected_version: &str,
    ) -> Result<StoredDocument, StorageError> {
        let stored = self.inner.update(key, data, owner, expected_version).await?;
        self.emit(StoreEventType::Updated, &stored);
        Ok(stored)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredDocument, StorageError> {
        let deleted = self.inner.delete(key).await?;
        self.emit(StoreEventType::Deleted, &deleted);
        Ok(deleted)
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        self.inner.list().await
    }

    async fn list_owned_by(
        &self,
        namespace: &str,
        owner_uid: &str,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        self.inner.list_owned_by(namespace, owner_uid).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

impl<S: DocumentStore> std::fmt::Debug for EventedDocumentStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventedDocumentStore")
            .field("backend", &self.inner.backend_name())
            .field("subscriber_count", &self.broadcaster.subscriber_count())
            .finish()
    }
}
