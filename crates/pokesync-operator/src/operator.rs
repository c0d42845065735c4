//! Wiring of stores, fetcher, controller and garbage collector.

use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pokesync_controller::{Controller, Reconciler};
use pokesync_core::{EventBroadcaster, ObjectKey, SyncSpec};
use pokesync_db_memory::{InMemoryDocumentStore, InMemorySpecStore};
use pokesync_pokeapi::{DynFetcher, FetchError, PokeApiClient};
use pokesync_storage::{
    DynDocumentStore, DynSpecStore, EventedDocumentStore, EventedSpecStore, GarbageCollector,
    SpecApply, SpecStore, StorageError,
};

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    #[error("Failed to build PokeAPI client: {0}")]
    Fetcher(#[from] FetchError),

    #[error("Failed to apply seed spec {key}: {source}")]
    Seed {
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}

/// A fully wired controller process over in-memory stores.
pub struct Operator {
    seeds: Vec<SyncSpec>,
    broadcaster: Arc<EventBroadcaster>,
    specs: DynSpecStore,
    documents: DynDocumentStore,
    controller: Controller,
    collector: Arc<GarbageCollector>,
}

impl Operator {
    pub fn build(config: AppConfig) -> Result<Self, OperatorError> {
        let fetcher: DynFetcher = Arc::new(PokeApiClient::new(config.pokeapi_config())?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Builds the operator around a caller-provided fetcher.
    pub fn with_fetcher(config: AppConfig, fetcher: DynFetcher) -> Self {
        let broadcaster = EventBroadcaster::new_shared();
        let specs: DynSpecStore = Arc::new(EventedSpecStore::new(
            InMemorySpecStore::new(),
            broadcaster.clone(),
        ));
        let documents: DynDocumentStore = Arc::new(EventedDocumentStore::new(
            InMemoryDocumentStore::new(),
            broadcaster.clone(),
        ));

        let reconciler = Reconciler::new(specs.clone(), documents.clone(), fetcher);
        let controller = Controller::new(reconciler, specs.clone(), config.controller_config());
        let collector = Arc::new(GarbageCollector::new(specs.clone(), documents.clone()));

        Self {
            seeds: config.seed_specs(),
            broadcaster,
            specs,
            documents,
            controller,
            collector,
        }
    }

    pub fn specs(&self) -> &DynSpecStore {
        &self.specs
    }

    pub fn documents(&self) -> &DynDocumentStore {
        &self.documents
    }

    /// Seeds the configured specs and runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), OperatorError> {
        // Subscribe before seeding so no spec event is missed
        let gc = tokio::spawn(
            self.collector
                .run(self.broadcaster.subscribe(), shutdown.clone()),
        );
        let controller = tokio::spawn(
            self.controller
                .run(self.broadcaster.subscribe(), shutdown.clone()),
        );

        for spec in self.seeds {
            let key = spec.key.clone();
            let applied = match self.specs.apply(spec).await {
                Ok(applied) => applied,
                Err(source) => {
                    shutdown.cancel();
                    let _ = tokio::join!(gc, controller);
                    return Err(OperatorError::Seed { key, source });
                }
            };
            let outcome = match &applied {
                SpecApply::Created(_) => "created",
                SpecApply::Updated(_) => "updated",
                SpecApply::Unchanged(_) => "unchanged",
            };
            info!(key = %key, uid = %applied.spec().uid, outcome, "Seed spec applied");
        }

        let (gc, controller) = tokio::join!(gc, controller);
        gc?;
        controller?;
        Ok(())
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("seeds", &self.seeds.len())
            .field("controller", &self.controller)
            .finish()
    }
}
