//! Fixed-size sliding-window chunking over Unicode scalar values.
//!
//! Windows hold at most `max_size` characters and consecutive windows share
//! exactly `overlap` characters, so the step is `max_size - overlap`. The last
//! window of a page may be shorter.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig("chunking.max_size must be greater than 0".into()));
        }
        if self.overlap >= self.max_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.max_size - self.overlap
    }
}

/// Split one page into overlapping windows. Blank pages yield no chunks.
pub fn chunk(document: &Document, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;
    let text = document.text.as_str();
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n_chars = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + config.max_size).min(n_chars);
        chunks.push(Chunk {
            text: text[bounds[start]..bounds[end]].to_string(),
            source_file: document.source_file.clone(),
            page_number: document.page_number,
            chunk_index: chunks.len(),
        });
        if end == n_chars {
            break;
        }
        start += config.step();
    }
    Ok(chunks)
}

pub fn chunk_all(documents: &[Document], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;
    let mut out = Vec::new();
    for doc in documents {
        out.extend(chunk(doc, config)?);
    }
    Ok(out)
}
