use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No PDF documents found in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("The {files} PDF file(s) in {} contain no extractable text; nothing to index", .dir.display())]
    NoExtractableText { dir: PathBuf, files: usize },

    #[error("Failed to load document {}: {reason}", .path.display())]
    DocumentLoad { path: PathBuf, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedding batch {batch} failed after {attempts} attempt(s) ({committed} chunk(s) were embedded before it): {reason}")]
    BatchFailed {
        batch: usize,
        attempts: u32,
        committed: usize,
        reason: String,
    },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot build an index from zero entries")]
    EmptyIndex,

    #[error("Index at {} is corrupt: {reason}. Delete the directory and rebuild the index", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("Index at {} was built with embedder '{found}' but the current embedder is '{expected}'. Delete the directory and rebuild the index", .path.display())]
    IndexStale {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error("Missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::IndexCorrupt { path: path.into(), reason: reason.into() }
    }

    /// True for errors whose recovery is deleting the persisted index.
    pub fn requires_rebuild(&self) -> bool {
        matches!(self, Self::IndexCorrupt { .. } | Self::IndexStale { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
