//! In-memory store backend for pokesync.
//!
//! This crate provides in-memory implementations of the [`SpecStore`] and
//! [`DocumentStore`] traits from `pokesync-storage`, using `dashmap` for
//! concurrent access. Conditional document updates check the version and
//! commit under the same shard lock.
//!
//! # Example
//!
//! ```ignore
//! use pokesync_db_memory::InMemoryDocumentStore;
//! use pokesync_storage::DocumentStore;
//!
//! let store = InMemoryDocumentStore::new();
//! let created = store.create(&key, &data, None).await?;
//! store.update(&key, &data, None, &created.version).await?;
//! ```

mod documents;
mod specs;

pub use documents::InMemoryDocumentStore;
pub use specs::InMemorySpecStore;

// Re-export the store traits for convenience
pub use pokesync_storage::{DocumentStore, SpecStore, StorageError, StoredDocument};

/// Creates a new shared in-memory spec store.
pub fn create_spec_store() -> pokesync_storage::DynSpecStore {
    std::sync::Arc::new(InMemorySpecStore::new())
}

/// Creates a new shared in-memory document store.
pub fn create_document_store() -> pokesync_storage::DynDocumentStore {
    std::sync::Arc::new(InMemoryDocumentStore::new())
}
