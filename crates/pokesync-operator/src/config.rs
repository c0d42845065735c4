use std::collections::HashSet;
use std::time::Duration;

use pokesync_controller::ControllerConfig;
use pokesync_core::{ObjectKey, SyncSpec};
use pokesync_pokeapi::{DEFAULT_BASE_URL, PokeApiConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub pokeapi: PokeApiSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Specs applied to the store at startup
    #[serde(default)]
    pub specs: Vec<SeedSpec>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Controller validations
        if self.controller.workers == 0 {
            return Err(ConfigError::invalid("controller.workers must be > 0"));
        }
        if self.controller.requeue_delay_ms == 0 {
            return Err(ConfigError::invalid("controller.requeue_delay_ms must be > 0"));
        }
        if self.controller.namespace.is_empty() {
            return Err(ConfigError::invalid("controller.namespace must not be empty"));
        }
        // PokeAPI validations
        if url::Url::parse(&self.pokeapi.base_url).is_err() {
            return Err(ConfigError::invalid(format!(
                "pokeapi.base_url is not a valid URL: {}",
                self.pokeapi.base_url
            )));
        }
        if self.pokeapi.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("pokeapi.request_timeout_ms must be > 0"));
        }
        if self.pokeapi.max_response_bytes == 0 {
            return Err(ConfigError::invalid("pokeapi.max_response_bytes must be > 0"));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        // Seed spec validations
        let mut seen = HashSet::new();
        for (i, seed) in self.specs.iter().enumerate() {
            if seed.name.is_empty()
                || seed.subject_name.is_empty()
                || seed.target_document_name.is_empty()
            {
                return Err(ConfigError::invalid(format!(
                    "specs[{i}] requires name, subject_name and target_document_name"
                )));
            }
            let key = seed.key(&self.controller.namespace);
            if !seen.insert(key.clone()) {
                return Err(ConfigError::invalid(format!("specs[{i}] duplicates {key}")));
            }
        }
        Ok(())
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            workers: self.controller.workers,
            requeue_delay: Duration::from_millis(self.controller.requeue_delay_ms),
        }
    }

    pub fn pokeapi_config(&self) -> PokeApiConfig {
        PokeApiConfig::new()
            .with_base_url(self.pokeapi.base_url.clone())
            .with_request_timeout(Duration::from_millis(self.pokeapi.request_timeout_ms))
            .with_max_response_size(self.pokeapi.max_response_bytes)
    }

    /// Seed specs with the default namespace filled in.
    pub fn seed_specs(&self) -> Vec<SyncSpec> {
        self.specs
            .iter()
            .map(|seed| seed.to_spec(&self.controller.namespace))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSettings {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Delay before a failed reconcile is retried
    #[serde(default = "default_requeue_delay_ms")]
    pub requeue_delay_ms: u64,
    /// Namespace for seed specs that do not name one
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_workers() -> usize {
    2
}
fn default_requeue_delay_ms() -> u64 {
    5_000
}
fn default_namespace() -> String {
    "default".into()
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            requeue_delay_ms: default_requeue_delay_ms(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokeApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_max_response_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for PokeApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A spec declared in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSpec {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub subject_name: String,
    pub target_document_name: String,
}

impl SeedSpec {
    pub fn key(&self, default_namespace: &str) -> ObjectKey {
        let namespace = self.namespace.as_deref().unwrap_or(default_namespace);
        ObjectKey::new(namespace, self.name.clone())
    }

    pub fn to_spec(&self, default_namespace: &str) -> SyncSpec {
        SyncSpec::new(
            self.key(default_namespace),
            self.subject_name.clone(),
            self.target_document_name.clone(),
        )
    }
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "pokesync.toml";

    /// Loads the configuration file at `path` (or the default path) and
    /// applies `POKESYNC__SECTION__FIELD` environment overrides.
    ///
    /// A missing file is not an error; defaults and the environment apply.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., POKESYNC__CONTROLLER__WORKERS=4
        builder = builder.add_source(
            Environment::with_prefix("POKESYNC")
                .try_parsing(true)
                .separator("__"),
        );
        let merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        Ok(merged)
    }
}
