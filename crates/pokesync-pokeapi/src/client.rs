//! reqwest-backed PokeAPI client.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use pokesync_core::PokemonRecord;

use crate::RecordFetcher;
use crate::error::FetchError;

/// Public PokeAPI endpoint for pokemon lookups.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/pokemon/";

/// Configuration for [`PokeApiClient`].
#[derive(Debug, Clone)]
pub struct PokeApiConfig {
    /// Endpoint the subject name is appended to (default: public PokeAPI).
    pub base_url: String,

    /// HTTP request timeout (default: 10 seconds).
    pub request_timeout: Duration,

    /// Maximum response size in bytes (default: 4 MiB).
    pub max_response_size: usize,
}

impl Default for PokeApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_response_size: 4 * 1024 * 1024,
        }
    }
}

impl PokeApiConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

/// Fetches [`PokemonRecord`]s from a PokeAPI-compatible endpoint.
///
/// Holds one pooled HTTP client; cloning is not needed since the client is
/// shared behind an `Arc` by callers.
#[derive(Debug)]
pub struct PokeApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    max_response_size: usize,
}

impl PokeApiClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidBaseUrl` if the base URL does not parse or
    /// cannot carry path segments, and `FetchError::Client` if the HTTP client
    /// cannot be built.
    pub fn new(config: PokeApiConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidBaseUrl(config.base_url));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            max_response_size: config.max_response_size,
        })
    }

    /// Builds the record URL for a subject.
    pub fn record_url(&self, subject: &str) -> Result<Url, FetchError> {
        if subject.trim().is_empty() {
            return Err(FetchError::InvalidSubject(subject.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(subject);
        Ok(url)
    }
}

#[async_trait]
impl RecordFetcher for PokeApiClient {
    async fn fetch(&self, subject: &str) -> Result<PokemonRecord, FetchError> {
        let url = self.record_url(subject)?;
        tracing::debug!(subject = %subject, url = %url, "Fetching record");

        let response = self
            .http_client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(subject = %subject, error = %e, "Failed to fetch record");
                FetchError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(FetchError::HttpError(response.status().as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_response_size
        {
            return Err(FetchError::ResponseTooLarge {
                max_size: self.max_response_size,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;
        if body.len() > self.max_response_size {
            return Err(FetchError::ResponseTooLarge {
                max_size: self.max_response_size,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(subject = %subject, error = %e, "Failed to parse record");
            FetchError::ParseError(e.to_string())
        })
    }
}
