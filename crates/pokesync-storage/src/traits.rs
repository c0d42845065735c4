//! Store traits.
//!
//! Backends implement [`SpecStore`] for declarative objects and
//! [`DocumentStore`] for derived documents. Implementations must be
//! thread-safe (`Send + Sync`).

use async_trait::async_trait;

use pokesync_core::{DocumentData, ObjectKey, OwnerReference, StoredSpec, SyncSpec};

use crate::error::StorageError;
use crate::types::{SpecApply, StoredDocument};

/// Store for [`SyncSpec`] objects.
#[async_trait]
pub trait SpecStore: Send + Sync {
    /// Reads a spec by key.
    ///
    /// Returns `None` if the spec does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing specs.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredSpec>, StorageError>;

    /// Creates the spec, or replaces the attributes of an existing one.
    ///
    /// Replacing keeps the existing uid and assigns a new version; applying
    /// identical attributes writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidObject` if a required attribute is empty.
    async fn apply(&self, spec: SyncSpec) -> Result<SpecApply, StorageError>;

    /// Deletes a spec and returns the deleted object.
    ///
    /// Derived documents are removed asynchronously by the garbage collector.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the spec does not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<StoredSpec, StorageError>;

    /// Lists all specs.
    async fn list(&self) -> Result<Vec<StoredSpec>, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}

/// Versioned key/value document store with owner links.
///
/// # Example
///
/// ```ignore
/// use pokesync_storage::{DocumentStore, StorageError};
///
/// async fn set_field(store: &dyn DocumentStore, key: &ObjectKey) -> Result<(), StorageError> {
///     let current = store
///         .get(key)
///         .await?
///         .ok_or_else(|| StorageError::not_found(ObjectKind::Document, key))?;
///     let mut data = current.data().clone();
///     data.insert("Owner".into(), "alice".into());
///     store.update(key, &data, current.owner(), &current.version).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document by key.
    ///
    /// Returns `None` if the document does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredDocument>, StorageError>;

    /// Creates a new document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a document with the same key exists.
    async fn create(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
    ) -> Result<StoredDocument, StorageError>;

    /// Replaces the content of an existing document if its version still
    /// equals `expected_version`.
    ///
    /// The check and the write are atomic: either the whole new content is
    /// committed or nothing is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    /// Returns `StorageError::VersionConflict` if the stored version differs.
    async fn update(
        &self,
        key: &ObjectKey,
        data: &DocumentData,
        owner: Option<&OwnerReference>,
        expected_version: &str,
    ) -> Result<StoredDocument, StorageError>;

    /// Deletes a document and returns the deleted object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<StoredDocument, StorageError>;

    /// Lists all documents.
    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError>;

    /// Lists documents in `namespace` whose owner has the given uid.
    async fn list_owned_by(
        &self,
        namespace: &str,
        owner_uid: &str,
    ) -> Result<Vec<StoredDocument>, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
