use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::chunker::{self, ChunkingConfig};
use crate::error::{Error, Result};
use crate::traits::DocumentLoader;
use crate::types::{Chunk, Document};

/// Extracts one `Document` per PDF page with lopdf. Pages are numbered from 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let source_file = file_name(path);
        let pdf = lopdf::Document::load(path).map_err(|e| Error::DocumentLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut pages = Vec::new();
        for page_number in pdf.get_pages().into_keys() {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => pages.push(Document {
                    text,
                    source_file: source_file.clone(),
                    page_number,
                }),
                Err(e) => warn!(file = %source_file, page = page_number, error = %e, "skipping page without extractable text"),
            }
        }
        Ok(pages)
    }
}

/// Everything produced by scanning a corpus directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessedCorpus {
    pub files: Vec<PathBuf>,
    pub pages: usize,
    pub chunks: Vec<Chunk>,
}

pub struct DataProcessor {
    chunking: ChunkingConfig,
    loader: Box<dyn DocumentLoader>,
}

impl DataProcessor {
    pub fn new(chunking: ChunkingConfig) -> Result<Self> {
        Self::with_loader(chunking, Box::new(PdfLoader))
    }

    pub fn with_loader(chunking: ChunkingConfig, loader: Box<dyn DocumentLoader>) -> Result<Self> {
        chunking.validate()?;
        Ok(Self { chunking, loader })
    }

    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// PDF files directly inside `dir`, sorted by path. Subdirectories are not visited.
    pub fn list_pdf_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "document directory {} does not exist",
                dir.display()
            )));
        }
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_pdf(p))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Load every PDF in `dir` and cut its pages into chunks.
    pub fn process_directory(&self, dir: &Path) -> Result<ProcessedCorpus> {
        let files = self.list_pdf_files(dir)?;
        if files.is_empty() {
            return Err(Error::NoDocuments(dir.to_path_buf()));
        }
        self.process_files(files)
    }

    pub fn process_files(&self, files: Vec<PathBuf>) -> Result<ProcessedCorpus> {
        let mut corpus = ProcessedCorpus::default();
        for (i, path) in files.iter().enumerate() {
            debug!(file = %path.display(), n = i + 1, total = files.len(), "loading document");
            let pages = self.loader.load(path)?;
            corpus.pages += pages.len();
            corpus.chunks.extend(chunker::chunk_all(&pages, &self.chunking)?);
        }
        info!(files = files.len(), pages = corpus.pages, chunks = corpus.chunks.len(), "corpus processed");
        corpus.files = files;
        Ok(corpus)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
