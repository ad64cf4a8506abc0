//! On-disk layout of a persisted index directory.
//!
//! - `index.bin`: row-major `f32` vectors, host byte order
//! - `chunks.json`: chunk metadata, position = internal id
//! - `manifest.json`: [`Manifest`], written last

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INDEX_FILE: &str = "index.bin";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity; vectors need not be normalised.
    #[default]
    Cosine,
    /// Raw inner product; equals cosine for unit vectors.
    DotProduct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub metric: DistanceMetric,
    pub dim: usize,
    pub count: usize,
    pub embedder_id: String,
    pub byte_order: String,
    pub created_at: DateTime<Utc>,
    pub vectors_blake3: String,
    pub chunks_blake3: String,
}

pub fn host_byte_order() -> &'static str {
    if cfg!(target_endian = "little") {
        "little"
    } else {
        "big"
    }
}
