//! Store event bus.
//!
//! Store decorators publish a [`StoreEvent`] after every successful mutation.
//! The controller and the garbage collector subscribe to the same
//! [`EventBroadcaster`].
//!
//! ```text
//!   EventedSpecStore ─┐                      ┌─► Controller (enqueue keys)
//!                     ├─► EventBroadcaster ──┤
//! EventedDocumentStore┘                      └─► GarbageCollector (cascade)
//! ```

pub mod broadcaster;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use types::{ObjectKind, StoreEvent, StoreEventType};
