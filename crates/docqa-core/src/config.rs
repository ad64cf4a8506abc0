//! Typed configuration and path helpers.
//!
//! Figment merges programmatic defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars into an [`AppConfig`], which is validated before use.

use std::env;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::chunker::ChunkingConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub index_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { data_dir: "data".into(), index_dir: "index".into() }
    }
}

/// Corpora below `small_corpus_threshold` chunks are embedded in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub small_corpus_threshold: usize,
    pub batch_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self { small_corpus_threshold: 100, batch_size: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per batch, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 2, initial_backoff_ms: 500, max_backoff_ms: 5000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4-turbo-preview".into(),
            temperature: 0.3,
            max_tokens: 3000,
            timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Local model directory. When unset, `APP_MODEL_DIR`/`MODEL_DIR` or the
    /// bundled default location is used.
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into(), format: "pretty".into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub batching: BatchingConfig,
    pub retry: RetryConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub embedding: EmbeddingConfig,
    pub logging: LoggingConfig,
    pub credentials: Credentials,
}

impl AppConfig {
    /// Defaults, then `config.toml`, then `config.<RUST_ENV>.toml`, then `APP_*`
    /// variables (`__` separates nested keys, e.g. `APP_CHUNKING__MAX_SIZE`).
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if config.credentials.api_key.is_none() {
            config.credentials.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.batching.batch_size == 0 {
            return Err(invalid("batching.batch_size must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be at least 1"));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(invalid(format!(
                "retry.initial_backoff_ms ({}) must not exceed retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(invalid("retrieval.top_k must be at least 1"));
        }

        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(invalid(format!(
                "generation.temperature must be between 0 and 2, got {}",
                generation.temperature
            )));
        }
        if generation.max_tokens == 0 {
            return Err(invalid("generation.max_tokens must be at least 1"));
        }
        if generation.timeout_secs == 0 {
            return Err(invalid("generation.timeout_secs must be at least 1"));
        }
        if generation.base_url.trim().is_empty() || generation.model.trim().is_empty() {
            return Err(invalid("generation.base_url and generation.model cannot be empty"));
        }

        if self.embedding.max_len == 0 || self.embedding.fake_dim == 0 {
            return Err(invalid("embedding.max_len and embedding.fake_dim must be at least 1"));
        }

        let levels = ["trace", "debug", "info", "warn", "error"];
        if !levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "logging.level '{}' must be one of: {}",
                self.logging.level,
                levels.join(", ")
            )));
        }
        if !["pretty", "json"].contains(&self.logging.format.as_str()) {
            return Err(invalid(format!(
                "logging.format '{}' must be one of: pretty, json",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        resolve_with_base(&current_dir(), &self.paths.data_dir)
    }

    pub fn index_dir(&self) -> PathBuf {
        resolve_with_base(&current_dir(), &self.paths.index_dir)
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against `base` after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
