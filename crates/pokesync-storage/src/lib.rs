//! # pokesync-storage
//!
//! Store contracts for the pokesync controller.
//!
//! This crate defines the traits and types that store backends implement,
//! plus backend-independent decorators. It contains no backend itself; see
//! `pokesync-db-memory`.
//!
//! ## Overview
//!
//! - [`SpecStore`]: get/apply/delete/list for declarative [`SyncSpec`](pokesync_core::SyncSpec) objects
//! - [`DocumentStore`]: versioned documents with conditional update and owner links
//! - [`EventedSpecStore`] / [`EventedDocumentStore`]: publish a store event after each write
//! - [`GarbageCollector`]: owner-based cascading deletion driven by those events

mod error;
pub mod evented;
pub mod gc;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use evented::{EventedDocumentStore, EventedSpecStore};
pub use gc::GarbageCollector;
pub use traits::{DocumentStore, SpecStore};
pub use types::{SpecApply, StoredDocument};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared spec store.
pub type DynSpecStore = std::sync::Arc<dyn SpecStore>;

/// Type alias for a shared document store.
pub type DynDocumentStore = std::sync::Arc<dyn DocumentStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::evented::{EventedDocumentStore, EventedSpecStore};
    pub use crate::gc::GarbageCollector;
    pub use crate::traits::{DocumentStore, SpecStore};
    pub use crate::types::{SpecApply, StoredDocument};
    pub use crate::{DynDocumentStore, DynSpecStore, StorageResult};
}
