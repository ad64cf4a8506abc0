use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docqa_core::config::{AppConfig, BatchingConfig};
use docqa_core::data_processor::DataProcessor;
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, EmbeddedChunk};
use docqa_core::{Error, Result};

use crate::batches::plan_batches;
use crate::cache::IndexCache;
use crate::retry::RetryPolicy;
use crate::writer::FlatIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Loading,
    Scanning,
    Chunking,
    Embedding,
    Persisting,
    Ready,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub batching: BatchingConfig,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batching: BatchingConfig::default(), retry: RetryPolicy::default(), show_progress: false }
    }
}

impl BuildOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batching: config.batching,
            retry: RetryPolicy::from_config(&config.retry),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Read back from the index directory; nothing was embedded.
    Loaded,
    Built(BuildStats),
}

#[derive(Debug)]
pub struct BuildReport {
    pub index: FlatIndex,
    pub origin: IndexOrigin,
}

/// Produces a ready index from a directory of PDFs, reusing the persisted
/// one when it exists. A failed build persists nothing.
pub struct IndexBuilder {
    processor: DataProcessor,
    embedder: Arc<dyn Embedder>,
    options: BuildOptions,
}

impl IndexBuilder {
    pub fn new(processor: DataProcessor, embedder: Arc<dyn Embedder>, options: BuildOptions) -> Self {
        Self { processor, embedder, options }
    }

    pub fn load_or_build(&self, source_dir: &Path, index_dir: &Path) -> Result<BuildReport> {
        enter(BuildPhase::Loading, index_dir);
        let cache = IndexCache::new(index_dir);
        if let Some(index) = cache.load(self.embedder.embedder_id())? {
            info!(entries = index.len(), "reusing persisted index");
            enter(BuildPhase::Ready, index_dir);
            return Ok(BuildReport { index, origin: IndexOrigin::Loaded });
        }
        self.build(source_dir, index_dir)
    }

    /// Build from `source_dir` and persist to `index_dir`, ignoring any
    /// existing index there.
    pub fn build(&self, source_dir: &Path, index_dir: &Path) -> Result<BuildReport> {
        enter(BuildPhase::Scanning, source_dir);
        let files = self.processor.list_pdf_files(source_dir)?;
        if files.is_empty() {
            return Err(Error::NoDocuments(source_dir.to_path_buf()));
        }

        enter(BuildPhase::Chunking, source_dir);
        let corpus = self.processor.process_files(files)?;
        if corpus.chunks.is_empty() {
            return Err(Error::NoExtractableText { dir: source_dir.to_path_buf(), files: corpus.files.len() });
        }
        let mut stats = BuildStats {
            files: corpus.files.len(),
            pages: corpus.pages,
            chunks: corpus.chunks.len(),
            batches: 0,
        };

        enter(BuildPhase::Embedding, source_dir);
        let (index, batches) = self.embed_chunks(corpus.chunks)?;
        stats.batches = batches;

        enter(BuildPhase::Persisting, index_dir);
        index.save(index_dir)?;

        enter(BuildPhase::Ready, index_dir);
        info!(files = stats.files, chunks = stats.chunks, batches = stats.batches, "index built");
        Ok(BuildReport { index, origin: IndexOrigin::Built(stats) })
    }

    /// Embed `chunks` batch by batch into a fresh in-memory index.
    ///
    /// Each batch gets the retry budget of the configured policy. When a
    /// batch runs out of attempts the whole build stops with `BatchFailed`.
    /// Returns the index and the number of batches.
    pub fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<(FlatIndex, usize)> {
        let plan = plan_batches(chunks.len(), &self.options.batching);
        if plan.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let pb = self.progress_bar(plan.len());
        let mut index: Option<FlatIndex> = None;
        let mut committed = 0usize;

        for (i, range) in plan.iter().enumerate() {
            let batch = &chunks[range.clone()];
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            let vectors = self
                .options
                .retry
                .run(|attempt| {
                    debug!(batch = i + 1, attempt, size = texts.len(), "embedding batch");
                    let vectors = self.embedder.embed_batch(&texts)?;
                    if vectors.len() != texts.len() {
                        return Err(Error::Embedding(format!(
                            "embedder returned {} vectors for {} texts",
                            vectors.len(),
                            texts.len()
                        )));
                    }
                    Ok(vectors)
                })
                .map_err(|exhausted| {
                    pb.abandon_with_message("embedding failed");
                    Error::BatchFailed {
                        batch: i + 1,
                        attempts: exhausted.attempts,
                        committed,
                        reason: exhausted.last_error.to_string(),
                    }
                })?;

            let entries: Vec<EmbeddedChunk> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
                .collect();
            match index.as_mut() {
                Some(existing) => existing.add_entries(entries)?,
                None => {
                    index = Some(FlatIndex::build(entries)?.with_embedder_id(self.embedder.embedder_id()))
                }
            }
            committed += batch.len();
            pb.inc(1);
            pb.set_message(format!("{committed}/{} chunks", chunks.len()));
        }
        pb.finish_with_message("embedding complete");

        let index = index.ok_or(Error::EmptyIndex)?;
        Ok((index, plan.len()))
    }

    fn progress_bar(&self, batches: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(batches as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

fn enter(phase: BuildPhase, path: &Path) {
    info!(phase = ?phase, path = %path.display(), "index build phase");
}
