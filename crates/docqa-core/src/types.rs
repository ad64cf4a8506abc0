//! Domain types shared by the loader, the index and the answer engine.

use serde::{Deserialize, Serialize};

/// One page of text extracted from a source PDF.
///
/// `page_number` is 1-based. `source_file` is the file name, not the full path,
/// so that citations stay stable when the corpus directory moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source_file: String,
    pub page_number: u32,
}

/// A contiguous window of a document's text that is embedded and indexed
/// independently. Carries the attribution of the page it was cut from.
///
/// - `chunk_index`: position of the window within its page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_file: String,
    pub page_number: u32,
    pub chunk_index: usize,
}

impl Chunk {
    pub fn source(&self) -> SourceRef {
        SourceRef { file: self.source_file.clone(), page: self.page_number }
    }
}

/// A chunk paired with its embedding, ready to be inserted into an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk returned by a similarity search. Higher `score` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// A citation target: file plus page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub file: String,
    pub page: u32,
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (page {})", self.file, self.page)
    }
}

/// Ranked chunks, most similar first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.hits.iter()
    }

    /// Distinct (file, page) pairs in ranking order.
    pub fn unique_sources(&self) -> Vec<SourceRef> {
        let mut seen = std::collections::HashSet::new();
        self.hits
            .iter()
            .map(|h| h.chunk.source())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }
}
