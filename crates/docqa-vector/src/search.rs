use docqa_core::types::{RetrievalResult, ScoredChunk};
use docqa_core::{Error, Result};

use crate::schema::DistanceMetric;
use crate::writer::{l2_norm, FlatIndex};

impl FlatIndex {
    /// The `k` entries most similar to `query`, best first. Ties keep
    /// insertion order. An empty index returns no hits.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let Some(dim) = self.dim else {
            return Ok(RetrievalResult::default());
        };
        if k == 0 || self.chunks.is_empty() {
            return Ok(RetrievalResult::default());
        }
        if query.len() != dim {
            return Err(Error::DimensionMismatch { expected: dim, actual: query.len() });
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(dim)
            .zip(&self.norms)
            .enumerate()
            .map(|(id, (row, &norm))| (id, self.score(query, query_norm, row, norm)))
            .collect();

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        let hits = scored
            .into_iter()
            .map(|(id, score)| ScoredChunk { chunk: self.chunks[id].clone(), score })
            .collect();
        Ok(RetrievalResult::new(hits))
    }

    fn score(&self, query: &[f32], query_norm: f32, row: &[f32], row_norm: f32) -> f32 {
        let dot = dot(query, row);
        match self.metric {
            DistanceMetric::DotProduct => dot,
            DistanceMetric::Cosine => {
                let denom = query_norm * row_norm;
                if denom > 0.0 { dot / denom } else { 0.0 }
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
