use docqa_core::traits::VectorIndexer;
use docqa_core::types::{Chunk, EmbeddedChunk, RetrievalResult};
use docqa_core::{Error, Result};

use crate::schema::DistanceMetric;

/// Exact in-memory similarity index over a flat, row-major vector table.
///
/// Internal ids are insertion positions; chunk `i` owns the vector in row
/// `i`. The dimension is fixed by the first insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    pub(crate) metric: DistanceMetric,
    pub(crate) dim: Option<usize>,
    pub(crate) embedder_id: String,
    pub(crate) vectors: Vec<f32>,
    pub(crate) norms: Vec<f32>,
    pub(crate) chunks: Vec<Chunk>,
}

impl FlatIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, ..Self::default() }
    }

    /// An index over `entries`. Fails when `entries` is empty.
    pub fn build(entries: Vec<EmbeddedChunk>) -> Result<Self> {
        Self::build_with_metric(entries, DistanceMetric::default())
    }

    pub fn build_with_metric(entries: Vec<EmbeddedChunk>, metric: DistanceMetric) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let mut index = Self::new(metric);
        index.add_entries(entries)?;
        Ok(index)
    }

    pub fn with_embedder_id(mut self, embedder_id: impl Into<String>) -> Self {
        self.embedder_id = embedder_id.into();
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let dim = self.dim?;
        self.vectors.get(id * dim..(id + 1) * dim)
    }

    /// Validates every entry before inserting any of them.
    pub fn add_entries(&mut self, entries: Vec<EmbeddedChunk>) -> Result<()> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        let dim = self.dim.unwrap_or(first.vector.len());
        if dim == 0 {
            return Err(Error::Embedding("embedding vectors cannot be empty".into()));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.vector.len() });
        }

        self.dim = Some(dim);
        self.vectors.reserve(entries.len() * dim);
        for entry in entries {
            self.norms.push(l2_norm(&entry.vector));
            self.vectors.extend_from_slice(&entry.vector);
            self.chunks.push(entry.chunk);
        }
        Ok(())
    }
}

impl VectorIndexer for FlatIndex {
    fn add(&mut self, entries: Vec<EmbeddedChunk>) -> Result<()> {
        self.add_entries(entries)
    }

    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<RetrievalResult> {
        self.search(query_vec, k)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
