//! Shared fakes for controller tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use pokesync_controller::Reconciler;
use pokesync_core::{DocumentData, ObjectKey, OwnerReference, PokemonRecord, SyncSpec};
use pokesync_db_memory::{InMemoryDocumentStore, InMemorySpecStore};
use pokesync_pokeapi::{FetchError, RecordFetcher};
use pokesync_storage::{
    DocumentStore, DynDocumentStore, DynSpecStore, StorageError, StoredDocument,
};

pub const NAMESPACE: &str = "default";

/// Subject whose fetch never completes.
pub const HANGING_SUBJECT: &str = "slowpoke";

pub fn pikachu() -> PokemonRecord {
    PokemonRecord {
        id: 25,
        name: "pikachu".to_string(),
        height: 4,
        weight: 60,
        base_experience: 112,
    }
}

pub fn bulbasaur() -> PokemonRecord {
    PokemonRecord {
        id: 1,
        name: "bulbasaur".to_string(),
        height: 7,
        weight: 69,
        base_experience: 64,
    }
}

pub fn spec(name: &str, subject: &str, target: &str) -> SyncSpec {
    SyncSpec::new(ObjectKey::new(NAMESPACE, name), subject, target)
}

pub fn data(pairs: &[(&str, &str)]) -> DocumentData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Fetcher serving fixed records; unknown subjects return 404.
#[derive(Default)]
pub struct StubFetcher {
    records: HashMap<String, PokemonRecord>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: PokemonRecord) -> Self {
        self.records.insert(record.name.clone(), record);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordFetcher for StubFetcher {
    async fn fetch(&self, subject: &str) -> Result<PokemonRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if subject == HANGING_SUBJECT {
            std::future::pending::<()>().await;
        }
        self.records
            .get(subject)
            .cloned()
            .ok_or(FetchError::HttpError(404))
    }
}

/// Document store that counts calls and can simulate a concurrent writer.
///
/// With interference enabled, the first `update` first commits
/// `Owner: bob` on behalf of another actor, so the forwarded update
/// carries a stale version.
pub struct CountingDocumentStore {
    inner: DynDocumentStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    interfere: AtomicBool,
}

impl CountingDocumentStore {
    pub fn new(inner: DynDocumentStore) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            interfere: AtomicBool::new(false),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDocumentStore::new()))
    }

    pub fn interfere_on_next_update(&self) {
        self.interfere.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.reads() + self.writes()
    }

    pub fn inner(&self) -> &DynDocumentStore {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for CountingDocumentStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredDocument>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn create(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
    ) -> Result<StoredDocument, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create(key, data, owner).await
    }

    async fn update(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
        expected_version: &str,
    ) -> Result<StoredDocument, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.interfere.swap(false, Ordering::SeqCst)
            && let Some(current) = self.inner.get(key).await?
        {
            let mut theirs = current.data().clone();
            theirs.insert("Owner".to_string(), "bob".to_string());
            self.inner
                .update(key, &theirs, current.owner(), &current.version)
                .await?;
        }
        self.inner.update(key, data, owner, expected_version).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredDocument, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list().await
    }

    async fn list_owned_by(
        &self,
        namespace: &str,
        owner_uid: &str,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_owned_by(namespace, owner_uid).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// A reconciler over fresh in-memory stores.
pub struct Harness {
    pub specs: DynSpecStore,
    pub documents: Arc<CountingDocumentStore>,
    pub fetcher: Arc<StubFetcher>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new(fetcher: StubFetcher) -> Self {
        let specs: DynSpecStore = Arc::new(InMemorySpecStore::new());
        let documents = Arc::new(CountingDocumentStore::in_memory());
        let fetcher = Arc::new(fetcher);
        let reconciler = Reconciler::new(specs.clone(), documents.clone(), fetcher.clone());
        Self {
            specs,
            documents,
            fetcher,
            reconciler,
        }
    }

    pub fn with_pokedex() -> Self {
        Self::new(
            StubFetcher::new()
                .with_record(pikachu())
                .with_record(bulbasaur()),
        )
    }
}
