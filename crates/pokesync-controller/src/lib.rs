//! # pokesync-controller
//!
//! Level-triggered reconciliation of `PokemonSync` specs into derived
//! documents.
//!
//! - [`Reconciler`]: one fetch/transform/upsert pass for a single spec key
//! - [`WorkQueue`]: deduplicating queue, one in-flight reconcile per key
//! - [`Controller`]: event-driven worker pool around the two

mod controller;
mod error;
pub mod fields;
mod queue;
mod reconciler;

pub use controller::{Controller, ControllerConfig};
pub use error::{ReconcileError, ReconcileErrorCategory};
pub use queue::WorkQueue;
pub use reconciler::{Action, Reconciler, UpsertOutcome};
