//! Reconciler for `PokemonSync` objects.
//!
//! One invocation reads the spec, fetches the subject's current record and
//! converges the target document onto it:
//!
//! 1. Spec gone: nothing to do, its documents are collected asynchronously.
//! 2. Fetch the record. A failed fetch leaves the document untouched.
//! 3. Create the document if absent, with a controller owner reference.
//! 4. Otherwise overlay the derived fields, keep every foreign field and
//!    write back conditionally on the version that was read.
//!
//! The reconciler never retries; the controller requeues failed keys.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use pokesync_core::{DocumentData, ObjectKey, StoredSpec};
use pokesync_pokeapi::DynFetcher;
use pokesync_storage::{DynDocumentStore, DynSpecStore, StoredDocument};

use crate::error::ReconcileError;
use crate::fields::{desired_fields, overlay};

/// What the controller should do with the key after a successful reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub requeue_after: Option<Duration>,
}

impl Action {
    /// Wait for the next change event.
    pub fn await_change() -> Self {
        Self {
            requeue_after: None,
        }
    }

    /// Reconcile again after `delay` even without a change.
    pub fn requeue(delay: Duration) -> Self {
        Self {
            requeue_after: Some(delay),
        }
    }
}

/// Outcome of the document upsert step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Converges target documents onto the records named by their specs.
///
/// Holds only its injected handles; any number of invocations may run
/// concurrently for different keys.
#[derive(Clone)]
pub struct Reconciler {
    specs: DynSpecStore,
    documents: DynDocumentStore,
    fetcher: DynFetcher,
}

impl Reconciler {
    pub fn new(specs: DynSpecStore, documents: DynDocumentStore, fetcher: DynFetcher) -> Self {
        Self {
            specs,
            documents,
            fetcher,
        }
    }

    /// Reconciles the spec stored under `key`.
    ///
    /// Each store read and the fetch race `cancel`. Writes are never started
    /// once `cancel` has fired, and a started write is allowed to commit.
    ///
    /// # Errors
    ///
    /// See [`ReconcileError`]. A missing spec is `Ok`.
    #[instrument(name = "reconcile", skip_all, fields(key = %key))]
    pub async fn reconcile(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<Action, ReconcileError> {
        let result = self.reconcile_inner(key, cancel).await;
        match &result {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => debug!("Reconcile cancelled"),
            Err(e) => warn!(
                key = %key,
                error = %e,
                category = %e.category(),
                "Reconcile failed"
            ),
        }
        result
    }

    async fn reconcile_inner(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<Action, ReconcileError> {
        let spec = cancellable(cancel, self.specs.get(key))
            .await?
            .map_err(|source| ReconcileError::SpecLookup {
                key: key.clone(),
                source,
            })?;

        let Some(spec) = spec else {
            debug!("Spec not found, nothing to reconcile");
            return Ok(Action::await_change());
        };

        let subject = spec.spec.subject_name.as_str();
        let record = cancellable(cancel, self.fetcher.fetch(subject))
            .await?
            .map_err(|source| ReconcileError::Fetch {
                subject: subject.to_string(),
                source,
            })?;
        debug!(subject = %subject, id = record.id, "Fetched record");

        let fields = desired_fields(&record);
        let (document, outcome) = self.upsert(&spec, &fields, cancel).await?;

        match outcome {
            UpsertOutcome::Unchanged => debug!(
                document = %document.key,
                version = %document.version,
                "Document already up to date"
            ),
            _ => info!(
                document = %document.key,
                version = %document.version,
                outcome = outcome.as_str(),
                "Document reconciled"
            ),
        }

        Ok(Action::await_change())
    }

    async fn upsert(
        &self,
        spec: &StoredSpec,
        fields: &DocumentData,
        cancel: &CancellationToken,
    ) -> Result<(StoredDocument, UpsertOutcome), ReconcileError> {
        let doc_key = spec.spec.target_key();
        let owner = spec.controller_reference();

        let current = cancellable(cancel, self.documents.get(&doc_key))
            .await?
            .map_err(|source| ReconcileError::StoreRead {
                key: doc_key.clone(),
                source,
            })?;

        let Some(current) = current else {
            ensure_not_cancelled(cancel)?;
            let mut data = DocumentData::new();
            overlay(&mut data, fields);
            let created = self
                .documents
                .create(&doc_key, &data, Some(&owner))
                .await
                .map_err(|source| ReconcileError::StoreWrite {
                    key: doc_key.clone(),
                    source,
                })?;
            return Ok((created, UpsertOutcome::Created));
        };

        if let Some(other) = current.document.foreign_owner(&spec.uid) {
            return Err(ReconcileError::OwnershipConflict {
                owner_uid: other.uid.clone(),
                key: doc_key,
            });
        }

        let mut data = current.data().clone();
        let data_changed = overlay(&mut data, fields);
        let owner_changed = current.owner() != Some(&owner);
        if !data_changed && !owner_changed {
            return Ok((current, UpsertOutcome::Unchanged));
        }
        if owner_changed {
            debug!(document = %doc_key, "Adopting document");
        }

        ensure_not_cancelled(cancel)?;
        let updated = self
            .documents
            .update(&doc_key, &data, Some(&owner), &current.version)
            .await
            .map_err(|source| ReconcileError::StoreWrite {
                key: doc_key.clone(),
                source,
            })?;
        Ok((updated, UpsertOutcome::Updated))
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("specs", &self.specs.backend_name())
            .field("documents", &self.documents.backend_name())
            .finish()
    }
}

/// Runs `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ReconcileError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReconcileError::Cancelled),
        output = fut => Ok(output),
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), ReconcileError> {
    if cancel.is_cancelled() {
        Err(ReconcileError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_constructors() {
        assert_eq!(Action::await_change().requeue_after, None);
        assert_eq!(
            Action::requeue(Duration::from_secs(5)).requeue_after,
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable(&cancel, async { 42 }).await;
        assert!(matches!(result, Err(ReconcileError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_passes_output_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { 42 }).await;
        assert!(matches!(result, Ok(42)));
    }
}
