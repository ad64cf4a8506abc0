#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use docqa_core::traits::{DocumentLoader, Embedder};
use docqa_core::types::{Chunk, Document, EmbeddedChunk};
use docqa_core::{Error, Result};
use docqa_embed::FakeEmbedder;

pub fn chunk(text: &str, file: &str, page: u32) -> Chunk {
    Chunk { text: text.to_string(), source_file: file.to_string(), page_number: page, chunk_index: 0 }
}

pub fn entry(text: &str, page: u32, vector: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk { chunk: chunk(text, "doc.pdf", page), vector }
}

/// Every file yields `pages` short pages, each of which becomes one chunk.
pub struct StubLoader {
    pub pages: u32,
}

impl DocumentLoader for StubLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        Ok((1..=self.pages)
            .map(|p| Document {
                text: format!("{name} page {p} discusses topic{p}"),
                source_file: name.clone(),
                page_number: p,
            })
            .collect())
    }
}

/// Wraps the fake embedder, counting calls and failing on demand.
pub struct ScriptedEmbedder {
    inner: FakeEmbedder,
    calls: AtomicUsize,
    fail_calls: Mutex<HashSet<usize>>,
    poison: Option<String>,
}

impl ScriptedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { inner: FakeEmbedder::new(dim), calls: AtomicUsize::new(0), fail_calls: Mutex::new(HashSet::new()), poison: None }
    }

    /// Fail the given 1-based calls once each.
    pub fn failing_calls(self, calls: &[usize]) -> Self {
        *self.fail_calls.lock().unwrap() = calls.iter().copied().collect();
        self
    }

    /// Fail every batch containing a text with `marker`.
    pub fn poisoned_by(mut self, marker: &str) -> Self {
        self.poison = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for ScriptedEmbedder {
    fn embedder_id(&self) -> &str {
        self.inner.embedder_id()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn max_len(&self) -> usize {
        self.inner.max_len()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_calls.lock().unwrap().remove(&call) {
            return Err(Error::Embedding(format!("scripted failure on call {call}")));
        }
        if let Some(marker) = &self.poison {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(Error::Embedding("upstream rejected the batch".into()));
            }
        }
        self.inner.embed_batch(texts)
    }
}

/// Write a PDF with one text line per page.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
