//! Owner-based cascading deletion.
//!
//! The [`GarbageCollector`] listens on the store event bus. When a spec is
//! deleted it removes every document in the same namespace whose owner
//! reference carries the deleted spec's uid. The cascade runs after the spec
//! deletion has committed, so owned documents disappear asynchronously.
//!
//! A document can also be written after its owner is gone, for example by a
//! reconcile that read the spec just before it was deleted. Document writes
//! are therefore checked against the live spec, and a full sweep runs on
//! start and whenever the collector falls behind the event bus.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pokesync_core::{ObjectKey, ObjectKind, OwnerReference, SYNC_SPEC_KIND, StoreEvent};

use crate::error::StorageError;
use crate::types::StoredDocument;
use crate::{DynDocumentStore, DynSpecStore};

/// Deletes documents whose owner was deleted.
pub struct GarbageCollector {
    specs: DynSpecStore,
    documents: DynDocumentStore,
}

impl GarbageCollector {
    pub fn new(specs: DynSpecStore, documents: DynDocumentStore) -> Self {
        Self { specs, documents }
    }

    /// Deletes every document in `namespace` owned by `owner_uid`.
    ///
    /// Returns the number of documents deleted. Documents that vanish
    /// between listing and deletion are skipped.
    pub async fn collect(&self, namespace: &str, owner_uid: &str) -> Result<usize, StorageError> {
        let owned = self.documents.list_owned_by(namespace, owner_uid).await?;
        let mut deleted = 0;

        for doc in owned {
            if self.delete_document(&doc).await? {
                deleted += 1;
                debug!(document = %doc.key, owner_uid = %owner_uid, "Collected owned document");
            }
        }

        Ok(deleted)
    }

    /// Deletes every document whose spec owner no longer exists.
    ///
    /// Returns the number of documents deleted.
    pub async fn sweep(&self) -> Result<usize, StorageError> {
        let mut deleted = 0;
        for doc in self.documents.list().await? {
            if self.collect_if_dangling(&doc.key, doc.owner()).await? {
                deleted += 1;
            }
        }
        if deleted > 0 {
            info!(count = deleted, "Swept documents with deleted owners");
        }
        Ok(deleted)
    }

    /// Handles one store event.
    ///
    /// Spec deletions cascade to owned documents. Document writes are
    /// collected when their owner is already gone.
    pub async fn handle(&self, event: &StoreEvent) -> Result<usize, StorageError> {
        match event.object_kind {
            ObjectKind::SyncSpec if event.is_deletion() => {
                let Some(uid) = event.uid.as_deref() else {
                    warn!(key = %event.key, "Spec deletion event without uid, skipping cascade");
                    return Ok(0);
                };

                let deleted = self.collect(&event.key.namespace, uid).await?;
                if deleted > 0 {
                    info!(owner = %event.key, count = deleted, "Cascade deleted owned documents");
                }
                Ok(deleted)
            }
            ObjectKind::Document if !event.is_deletion() => {
                let collected = self
                    .collect_if_dangling(&event.key, event.owner.as_ref())
                    .await?;
                Ok(usize::from(collected))
            }
            _ => Ok(0),
        }
    }

    /// Processes events until the channel closes or `shutdown` is cancelled.
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<StoreEvent>,
        shutdown: CancellationToken,
    ) {
        info!(backend = self.documents.backend_name(), "Garbage collector started");
        self.sweep_logged().await;

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Garbage collector lagged behind the event bus, sweeping");
                        self.sweep_logged().await;
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            if let Err(e) = self.handle(&event).await {
                warn!(key = %event.key, error = %e, category = %e.category(), "Garbage collection failed");
            }
        }

        info!("Garbage collector stopped");
    }

    async fn sweep_logged(&self) {
        if let Err(e) = self.sweep().await {
            warn!(error = %e, category = %e.category(), "Garbage collection sweep failed");
        }
    }

    /// Deletes the document under `key` if its spec owner is gone or has
    /// been re-created with a different uid.
    async fn collect_if_dangling(
        &self,
        key: &ObjectKey,
        owner: Option<&OwnerReference>,
    ) -> Result<bool, StorageError> {
        let Some(owner) = owner.filter(|owner| owner.kind == SYNC_SPEC_KIND) else {
            return Ok(false);
        };

        let owner_key = key.sibling(owner.name.clone());
        let live = self.specs.get(&owner_key).await?;
        if live.is_some_and(|spec| spec.uid == owner.uid) {
            return Ok(false);
        }

        // Re-read so a document adopted by a new owner meanwhile is kept
        let Some(doc) = self.documents.get(key).await? else {
            return Ok(false);
        };
        if doc.owner().map(|o| o.uid.as_str()) != Some(owner.uid.as_str()) {
            return Ok(false);
        }

        let deleted = self.delete_document(&doc).await?;
        if deleted {
            info!(document = %key, owner = %owner_key, owner_uid = %owner.uid, "Collected document with deleted owner");
        }
        Ok(deleted)
    }

    async fn delete_document(&self, doc: &StoredDocument) -> Result<bool, StorageError> {
        match self.documents.delete(&doc.key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for GarbageCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageCollector")
            .field("specs", &self.specs.backend_name())
            .field("documents", &self.documents.backend_name())
            .finish()
    }
}
