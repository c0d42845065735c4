//! # pokesync-core
//!
//! Object model shared by every pokesync crate: identity keys, the
//! declarative [`SyncSpec`], the fetched [`PokemonRecord`], the derived
//! [`TargetDocument`] with its [`OwnerReference`], and the store event bus.

pub mod events;
pub mod key;
pub mod object;

pub use events::{EventBroadcaster, ObjectKind, StoreEvent, StoreEventType};
pub use key::{KeyError, ObjectKey};
pub use object::{
    DocumentData, OwnerReference, PokemonRecord, StoredSpec, SyncSpec, TargetDocument,
    SYNC_SPEC_KIND,
};

/// Generates a new object uid.
pub fn generate_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}
