use std::path::Path;

use crate::error::Result;
use crate::types::{Document, EmbeddedChunk, RetrievalResult};

/// Turns text into fixed-dimension, L2-normalised vectors.
///
/// `embed_batch` is atomic: it returns one vector per input, in input order,
/// or an error and no vectors at all.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model, recorded in persisted indexes.
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::Error::Embedding("embedder returned no vector".into()))
    }
}

pub trait VectorIndexer: Send + Sync {
    /// Insert entries. Either every entry is added or none is.
    fn add(&mut self, entries: Vec<EmbeddedChunk>) -> Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<RetrievalResult>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads one source file into per-page documents.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Document>>;
}
