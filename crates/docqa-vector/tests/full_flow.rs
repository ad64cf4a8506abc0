mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::write_pdf;
use docqa_core::chunker::ChunkingConfig;
use docqa_core::data_processor::DataProcessor;
use docqa_core::traits::Embedder;
use docqa_embed::FakeEmbedder;
use docqa_vector::{BuildOptions, FlatIndex, IndexBuilder, IndexOrigin};

#[test]
fn pdf_corpus_to_persisted_index_and_back() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("docs");
    let idx = tmp.path().join("index");
    std::fs::create_dir(&src).unwrap();

    write_pdf(
        &src.join("energy.pdf"),
        &[
            "Solar panels convert sunlight into electricity",
            "Wind turbines need regular gearbox maintenance",
            "Battery storage smooths renewable supply",
        ],
    );
    write_pdf(&src.join("garden.pdf"), &["Tomatoes need full sun and steady watering"]);

    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(256));
    let processor = DataProcessor::new(ChunkingConfig::new(200, 40).unwrap()).unwrap();
    let builder = IndexBuilder::new(processor, embedder.clone(), BuildOptions::default());

    let report = builder.load_or_build(&src, &idx).unwrap();
    let IndexOrigin::Built(stats) = &report.origin else {
        panic!("expected a fresh build");
    };
    assert_eq!(stats.files, 2);
    assert_eq!(stats.pages, 4);
    assert_eq!(report.index.len(), 4);

    let q = embedder.embed("gearbox maintenance for wind turbines").unwrap();
    let hits = report.index.search(&q, 2).unwrap();
    let top = &hits.hits[0].chunk;
    assert_eq!(top.source_file, "energy.pdf");
    assert_eq!(top.page_number, 2);

    let reloaded = FlatIndex::load(&idx).unwrap();
    assert_eq!(reloaded.search(&q, 4).unwrap(), report.index.search(&q, 4).unwrap());
}
