//! In-memory document store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use pokesync_core::{DocumentData, ObjectKey, ObjectKind, OwnerReference, TargetDocument};
use pokesync_storage::{DocumentStore, StorageError, StoredDocument};

/// In-memory document store keyed by `(namespace, name)`.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    documents: DashMap<ObjectKey, StoredDocument>,
    /// Atomic counter for generating version tokens
    version_counter: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            version_counter: AtomicU64::new(1),
        }
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredDocument>, StorageError> {
        Ok(self.documents.get(key).map(|doc| doc.clone()))
    }

    async fn create(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
    ) -> Result<StoredDocument, StorageError> {
        if key.name.is_empty() {
            return Err(StorageError::invalid_object("document name must not be empty"));
        }

        match self.documents.entry(key.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(ObjectKind::Document, key)),
            Entry::Vacant(slot) => {
                let stored = StoredDocument::new(
                    key.clone(),
                    TargetDocument::new(data.clone(), owner.cloned()),
                    self.next_version(),
                );
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn update(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
        expected_version: &str,
    ) -> Result<StoredDocument, StorageError> {
        // The shard lock is held from the version check until the write
        let mut current = self
            .documents
            .get_mut(key)
            .ok_or_else(|| StorageError::not_found(ObjectKind::Document, key))?;

        if current.version != expected_version {
            return Err(StorageError::version_conflict(
                expected_version,
                current.version.clone(),
            ));
        }

        let next = current.new_version(
            self.next_version(),
            TargetDocument::new(data.clone(), owner.cloned()),
        );
        *current = next.clone();
        Ok(next)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredDocument, StorageError> {
        self.documents
            .remove(key)
            .map(|(_, doc)| doc)
            .ok_or_else(|| StorageError::not_found(ObjectKind::Document, key))
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let mut documents: Vec<StoredDocument> =
            self.documents.iter().map(|doc| doc.clone()).collect();
        documents.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(documents)
    }

    async fn list_owned_by(
        &self,
        namespace: &str,
        owner_uid: &str,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| {
                doc.key.namespace == namespace
                    && doc.owner().is_some_and(|owner| owner.uid == owner_uid)
            })
            .map(|doc| doc.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
