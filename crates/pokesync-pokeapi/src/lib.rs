//! External data fetcher backed by the public PokeAPI.
//!
//! - [`RecordFetcher`] - the capability the reconciler consumes
//! - [`PokeApiClient`] - `GET {base_url}/{subject}` over reqwest, JSON body
//! - [`FetchError`] - every way a fetch can fail
//!
//! # Example
//!
//! ```ignore
//! use pokesync_pokeapi::{PokeApiClient, PokeApiConfig, RecordFetcher};
//!
//! let client = PokeApiClient::new(PokeApiConfig::default())?;
//! let pikachu = client.fetch("pikachu").await?;
//! assert_eq!(pikachu.id, 25);
//! ```

mod client;
mod error;

use async_trait::async_trait;
use pokesync_core::PokemonRecord;

pub use client::{DEFAULT_BASE_URL, PokeApiClient, PokeApiConfig};
pub use error::FetchError;

/// Fetches the external record for a subject.
///
/// Implementations are stateless from the caller's point of view and must
/// not cache: every call observes the source's current state.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch(&self, subject: &str) -> Result<PokemonRecord, FetchError>;
}

/// Type alias for a shared fetcher.
pub type DynFetcher = std::sync::Arc<dyn RecordFetcher>;
