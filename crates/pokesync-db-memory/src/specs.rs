//! In-memory spec store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;

use pokesync_core::{ObjectKey, ObjectKind, StoredSpec, SyncSpec, generate_uid};
use pokesync_storage::{SpecApply, SpecStore, StorageError};

/// In-memory store for [`SyncSpec`] objects.
#[derive(Debug)]
pub struct InMemorySpecStore {
    specs: DashMap<ObjectKey, StoredSpec>,
    version_counter: AtomicU64,
}

impl InMemorySpecStore {
    pub fn new() -> Self {
        Self {
            specs: DashMap::new(),
            version_counter: AtomicU64::new(1),
        }
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }
}

impl Default for InMemorySpecStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(spec: &SyncSpec) -> Result<(), StorageError> {
    if spec.key.namespace.is_empty() || spec.key.name.is_empty() {
        return Err(StorageError::invalid_object("spec namespace and name must not be empty"));
    }
    if spec.subject_name.is_empty() {
        return Err(StorageError::invalid_object("subjectName must not be empty"));
    }
    if spec.target_document_name.is_empty() {
        return Err(StorageError::invalid_object(
            "targetDocumentName must not be empty",
        ));
    }
    Ok(())
}

#[async_trait]
impl SpecStore for InMemorySpecStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredSpec>, StorageError> {
        Ok(self.specs.get(key).map(|spec| spec.clone()))
    }

    async fn apply(&self, spec: SyncSpec) -> Result<SpecApply, StorageError> {
        validate(&spec)?;

        match self.specs.entry(spec.key.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().spec == spec {
                    return Ok(SpecApply::Unchanged(slot.get().clone()));
                }
                let current = slot.get_mut();
                current.spec = spec;
                current.version = self.next_version();
                Ok(SpecApply::Updated(current.clone()))
            }
            Entry::Vacant(slot) => {
                let stored = StoredSpec {
                    spec,
                    uid: generate_uid(),
                    version: self.next_version(),
                    created_at: OffsetDateTime::now_utc(),
                };
                slot.insert(stored.clone());
                Ok(SpecApply::Created(stored))
            }
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredSpec, StorageError> {
        self.specs
            .remove(key)
            .map(|(_, spec)| spec)
            .ok_or_else(|| StorageError::not_found(ObjectKind::SyncSpec, key))
    }

    async fn list(&self) -> Result<Vec<StoredSpec>, StorageError> {
        let mut specs: Vec<StoredSpec> = self.specs.iter().map(|spec| spec.clone()).collect();
        specs.sort_by(|a, b| a.spec.key.cmp(&b.spec.key));
        Ok(specs)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, subject: &str) -> SyncSpec {
        SyncSpec::new(
            ObjectKey::new("default", name),
            subject,
            format!("{subject}-config"),
        )
    }

    #[tokio::test]
    async fn test_apply_creates_then_updates() {
        let store = InMemorySpecStore::new();

        let created = store.apply(spec("pika", "pikachu")).await.unwrap();
        assert!(matches!(created, SpecApply::Created(_)));

        let updated = store.apply(spec("pika", "raichu")).await.unwrap();
        let SpecApply::Updated(updated) = updated else {
            panic!("expected update");
        };
        assert_eq!(updated.uid, created.spec().uid);
        assert_ne!(updated.version, created.spec().version);
        assert_eq!(updated.spec.subject_name, "raichu");
    }

    #[tokio::test]
    async fn test_apply_identical_is_unchanged() {
        let store = InMemorySpecStore::new();
        let created = store.apply(spec("pika", "pikachu")).await.unwrap().into_spec();

        let again = store.apply(spec("pika", "pikachu")).await.unwrap();
        assert!(!again.is_write());
        assert_eq!(again.spec().version, created.version);
    }

    #[tokio::test]
    async fn test_recreate_assigns_new_uid() {
        let store = InMemorySpecStore::new();
        let first = store.apply(spec("pika", "pikachu")).await.unwrap().into_spec();
        store.delete(first.key()).await.unwrap();

        let second = store.apply(spec("pika", "pikachu")).await.unwrap().into_spec();
        assert_ne!(first.uid, second.uid);
    }

    #[tokio::test]
    async fn test_apply_rejects_empty_fields() {
        let store = InMemorySpecStore::new();
        let mut invalid = spec("pika", "pikachu");
        invalid.subject_name.clear();
        assert!(matches!(
            store.apply(invalid).await,
            Err(StorageError::InvalidObject { .. })
        ));

        let mut invalid = spec("pika", "pikachu");
        invalid.target_document_name.clear();
        assert!(store.apply(invalid).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = InMemorySpecStore::new();
        store.apply(spec("b", "bulbasaur")).await.unwrap();
        store.apply(spec("a", "abra")).await.unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.spec.key.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        store.delete(&ObjectKey::new("default", "a")).await.unwrap();
        assert!(store.get(&ObjectKey::new("default", "a")).await.unwrap().is_none());
        assert!(
            store
                .delete(&ObjectKey::new("default", "a"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
