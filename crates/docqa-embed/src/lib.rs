pub mod device;
pub mod fake;
pub mod model;
pub mod pool;
pub mod tokenize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::info;

use docqa_core::config::{expand_path, EmbeddingConfig};
use docqa_core::traits::Embedder;
use docqa_core::{Error, Result};

pub use fake::FakeEmbedder;
pub use model::CandleEmbedder;
pub use pool::masked_mean_l2;

const DEFAULT_MODEL_DIR: &str = "models/paraphrase-multilingual-MiniLM-L12-v2";

type EmbedderCache = Mutex<HashMap<String, Arc<dyn Embedder>>>;

fn cache() -> &'static EmbedderCache {
    static CACHE: OnceLock<EmbedderCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The embedder selected by `config`, constructed once per process and
/// model and shared afterwards. `APP_USE_FAKE_EMBEDDINGS=1` forces the fake one.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let use_fake = config.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let (key, model_dir) = if use_fake {
        (format!("fake:{}", config.fake_dim), None)
    } else {
        let dir = resolve_model_dir(config.model_dir.as_deref())?;
        (format!("candle:{}:{}", dir.display(), config.max_len), Some(dir))
    };

    let mut guard = cache()
        .lock()
        .map_err(|_| Error::Embedding("embedder cache poisoned".into()))?;
    if let Some(existing) = guard.get(&key) {
        return Ok(Arc::clone(existing));
    }

    let embedder: Arc<dyn Embedder> = match model_dir {
        None => {
            info!(dim = config.fake_dim, "using fake embedder");
            Arc::new(FakeEmbedder::new(config.fake_dim))
        }
        Some(dir) => Arc::new(
            CandleEmbedder::load(&dir, config.max_len)
                .map_err(|e| Error::Embedding(format!("{e:#}")))?,
        ),
    };
    guard.insert(key, Arc::clone(&embedder));
    Ok(embedder)
}

/// First existing directory among the configured one, `APP_MODEL_DIR`,
/// `MODEL_DIR`, and the default location.
pub fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(str::to_string)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok())
        .chain(std::env::var("MODEL_DIR").ok())
        .chain([DEFAULT_MODEL_DIR.to_string(), format!("../{DEFAULT_MODEL_DIR}")]);

    for candidate in candidates {
        let p = expand_path(&candidate);
        if p.is_dir() {
            info!(model_dir = %p.display(), "resolved model directory");
            return Ok(p);
        }
    }
    Err(Error::InvalidConfig(format!(
        "could not locate an embedding model directory; set embedding.model_dir or APP_MODEL_DIR (default {})",
        Path::new(DEFAULT_MODEL_DIR).display()
    )))
}
