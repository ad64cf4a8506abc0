use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

use crate::schema::{host_byte_order, Manifest, CHUNKS_FILE, FORMAT_VERSION, INDEX_FILE, MANIFEST_FILE};
use crate::writer::{l2_norm, FlatIndex};

impl FlatIndex {
    /// Persist into `dir`, replacing any previous index there.
    ///
    /// Files are written to a sibling staging directory which is then renamed
    /// over `dir`, so readers never observe a half-written index. They may
    /// briefly observe no index at all; see `swap_into_place`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let Some(dim) = self.dim.filter(|_| !self.chunks.is_empty()) else {
            return Err(Error::EmptyIndex);
        };

        let staging = sibling(dir, "staging");
        let result = self.write_files(&staging, dim).and_then(|()| swap_into_place(&staging, dir));
        if result.is_err() && staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        result?;
        info!(path = %dir.display(), entries = self.chunks.len(), dim, "index saved");
        Ok(())
    }

    /// Read an index written by [`FlatIndex::save`]. Any missing file, size
    /// mismatch or checksum mismatch is reported as `IndexCorrupt`.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = read_manifest(dir)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::corrupt(dir, format!("unsupported format version {}", manifest.format_version)));
        }
        if manifest.byte_order != host_byte_order() {
            return Err(Error::corrupt(dir, format!("written on a {}-endian host", manifest.byte_order)));
        }

        let vector_bytes = read_artifact(dir, INDEX_FILE)?;
        let expected_len = manifest
            .count
            .checked_mul(manifest.dim)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
            .ok_or_else(|| Error::corrupt(dir, "manifest size overflows"))?;
        if vector_bytes.len() != expected_len {
            return Err(Error::corrupt(
                dir,
                format!("{INDEX_FILE} holds {} bytes, expected {expected_len}", vector_bytes.len()),
            ));
        }
        if blake3::hash(&vector_bytes).to_hex().as_str() != manifest.vectors_blake3 {
            return Err(Error::corrupt(dir, format!("{INDEX_FILE} checksum mismatch")));
        }

        let chunk_bytes = read_artifact(dir, CHUNKS_FILE)?;
        if blake3::hash(&chunk_bytes).to_hex().as_str() != manifest.chunks_blake3 {
            return Err(Error::corrupt(dir, format!("{CHUNKS_FILE} checksum mismatch")));
        }
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunk_bytes)
            .map_err(|e| Error::corrupt(dir, format!("{CHUNKS_FILE}: {e}")))?;
        if chunks.len() != manifest.count || manifest.dim == 0 {
            return Err(Error::corrupt(
                dir,
                format!("manifest lists {} entries of dim {}, found {} chunks", manifest.count, manifest.dim, chunks.len()),
            ));
        }

        let vectors: Vec<f32> = bytemuck::pod_collect_to_vec(&vector_bytes);
        let norms = vectors.chunks_exact(manifest.dim).map(l2_norm).collect();
        debug!(path = %dir.display(), entries = chunks.len(), "index loaded");
        Ok(Self {
            metric: manifest.metric,
            dim: Some(manifest.dim),
            embedder_id: manifest.embedder_id,
            vectors,
            norms,
            chunks,
        })
    }

    fn write_files(&self, staging: &Path, dim: usize) -> Result<()> {
        if staging.exists() {
            fs::remove_dir_all(staging).map_err(|e| Error::io(staging, e))?;
        }
        fs::create_dir_all(staging).map_err(|e| Error::io(staging, e))?;

        let vector_bytes: &[u8] = bytemuck::cast_slice(&self.vectors);
        let chunk_bytes = serde_json::to_vec(&self.chunks)
            .map_err(|e| Error::Io { path: staging.join(CHUNKS_FILE), source: e.into() })?;
        write(&staging.join(INDEX_FILE), vector_bytes)?;
        write(&staging.join(CHUNKS_FILE), &chunk_bytes)?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            metric: self.metric,
            dim,
            count: self.chunks.len(),
            embedder_id: self.embedder_id.clone(),
            byte_order: host_byte_order().to_string(),
            created_at: Utc::now(),
            vectors_blake3: blake3::hash(vector_bytes).to_hex().to_string(),
            chunks_blake3: blake3::hash(&chunk_bytes).to_hex().to_string(),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| Error::Io { path: staging.join(MANIFEST_FILE), source: e.into() })?;
        write(&staging.join(MANIFEST_FILE), &manifest_bytes)
    }
}

pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    let bytes = read_artifact(dir, MANIFEST_FILE)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::corrupt(dir, format!("{MANIFEST_FILE}: {e}")))
}

fn read_artifact(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::corrupt(dir, format!("{name} is missing")),
        _ => Error::io(path, e),
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

/// A hidden sibling of `dir` used while replacing it.
fn sibling(dir: &Path, role: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    let parent = dir.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    parent.join(format!(".{name}.{role}-{}", std::process::id()))
}

/// Replace `dir` with `staging` via two renames.
///
/// Between the renames `dir` does not exist, so a process inspecting it in
/// that window sees no index. A builder and a server running as separate
/// processes must coordinate externally (one writer, readers started after
/// the build); nothing here locks the directory.
fn swap_into_place(staging: &Path, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return fs::rename(staging, dir).map_err(|e| Error::io(dir, e));
    }
    let retired = sibling(dir, "retired");
    if retired.exists() {
        fs::remove_dir_all(&retired).map_err(|e| Error::io(&retired, e))?;
    }
    fs::rename(dir, &retired).map_err(|e| Error::io(dir, e))?;
    if let Err(e) = fs::rename(staging, dir) {
        let _ = fs::rename(&retired, dir);
        return Err(Error::io(dir, e));
    }
    fs::remove_dir_all(&retired).map_err(|e| Error::io(&retired, e))
}
