//! State of the persisted index directory, as seen by the builder.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use docqa_core::{Error, Result};

use crate::schema::{Manifest, CHUNKS_FILE, INDEX_FILE, MANIFEST_FILE};
use crate::table::read_manifest;
use crate::writer::FlatIndex;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    /// Nothing persisted yet; a build is needed.
    Absent,
    /// Persisted by a different embedder; vectors are not comparable.
    Stale { found: String },
    Ready(Manifest),
    Corrupt { reason: String },
}

impl CacheState {
    pub fn label(&self) -> &'static str {
        match self {
            CacheState::Absent => "absent",
            CacheState::Stale { .. } => "stale",
            CacheState::Ready(_) => "ready",
            CacheState::Corrupt { .. } => "corrupt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inspect(&self, embedder_id: &str) -> CacheState {
        let present: Vec<&str> = [INDEX_FILE, CHUNKS_FILE, MANIFEST_FILE]
            .into_iter()
            .filter(|f| self.dir.join(f).exists())
            .collect();
        if present.is_empty() {
            return CacheState::Absent;
        }
        if !present.contains(&MANIFEST_FILE) {
            return CacheState::Corrupt { reason: format!("{MANIFEST_FILE} is missing") };
        }
        match read_manifest(&self.dir) {
            Ok(manifest) if manifest.embedder_id != embedder_id => {
                CacheState::Stale { found: manifest.embedder_id }
            }
            Ok(manifest) => CacheState::Ready(manifest),
            Err(e) => CacheState::Corrupt { reason: e.to_string() },
        }
    }

    /// The persisted index when one is ready, `None` when there is none.
    /// Stale or corrupt artifacts are errors; they are never rebuilt silently.
    pub fn load(&self, embedder_id: &str) -> Result<Option<FlatIndex>> {
        match self.inspect(embedder_id) {
            CacheState::Absent => Ok(None),
            CacheState::Ready(_) => FlatIndex::load(&self.dir).map(Some),
            CacheState::Stale { found } => Err(Error::IndexStale {
                path: self.dir.clone(),
                found,
                expected: embedder_id.to_string(),
            }),
            CacheState::Corrupt { reason } => Err(Error::corrupt(&self.dir, reason)),
        }
    }

    /// Delete the persisted index. Returns whether anything was removed.
    pub fn reset(&self) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        info!(path = %self.dir.display(), "persisted index removed");
        Ok(true)
    }
}
