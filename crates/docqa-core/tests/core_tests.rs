use std::fs;
use std::path::Path;

use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use tempfile::TempDir;

use docqa_core::chunker::{self, ChunkingConfig};
use docqa_core::credentials::Credentials;
use docqa_core::data_processor::{DataProcessor, PdfLoader};
use docqa_core::traits::DocumentLoader;
use docqa_core::types::{Chunk, Document, RetrievalResult, ScoredChunk};
use docqa_core::{AppConfig, Error};

fn page(text: &str, page_number: u32) -> Document {
    Document { text: text.to_string(), source_file: "notes.pdf".into(), page_number }
}

/// Write a minimal PDF with one text line per page.
fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
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
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
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
            "Resources" => resources_id,
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

struct StubLoader;

impl DocumentLoader for StubLoader {
    fn load(&self, path: &Path) -> docqa_core::Result<Vec<Document>> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        Ok(vec![
            Document { text: "a".repeat(30), source_file: name.clone(), page_number: 1 },
            Document { text: "   ".into(), source_file: name, page_number: 2 },
        ])
    }
}

#[test]
fn chunks_respect_max_size_and_share_overlap() {
    let text: String = "Les données ouvertes façonnent la recherche. ".repeat(40);
    let cfg = ChunkingConfig::new(100, 20).unwrap();
    let chunks = chunker::chunk(&page(&text, 3), &cfg).unwrap();

    assert!(chunks.len() > 1);
    for c in &chunks {
        assert!(c.text.chars().count() <= 100);
        assert_eq!(c.page_number, 3);
        assert_eq!(c.source_file, "notes.pdf");
    }
    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].text.chars().collect();
        let next: Vec<char> = pair[1].text.chars().collect();
        assert_eq!(&prev[prev.len() - 20..], &next[..20]);
    }
}

#[test]
fn chunks_cover_the_whole_page() {
    let text: String = (0..537).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let cfg = ChunkingConfig::new(64, 16).unwrap();
    let chunks = chunker::chunk(&page(&text, 1), &cfg).unwrap();

    let mut rebuilt: String = chunks[0].text.clone();
    for c in &chunks[1..] {
        rebuilt.extend(c.text.chars().skip(16));
    }
    assert_eq!(rebuilt, text);
    assert_eq!(chunks.iter().map(|c| c.chunk_index).collect::<Vec<_>>(), (0..chunks.len()).collect::<Vec<_>>());
}

#[test]
fn short_and_blank_pages() {
    let cfg = ChunkingConfig::default();
    let short = chunker::chunk(&page("Short text", 1), &cfg).unwrap();
    assert_eq!(short.len(), 1);
    assert_eq!(short[0].text, "Short text");

    assert!(chunker::chunk(&page(" \n\t ", 1), &cfg).unwrap().is_empty());
    assert!(chunker::chunk(&page("", 1), &cfg).unwrap().is_empty());
}

#[test]
fn zero_overlap_partitions_text() {
    let cfg = ChunkingConfig::new(4, 0).unwrap();
    let chunks = chunker::chunk(&page("abcdefghij", 1), &cfg).unwrap();
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
}

#[test]
fn overlap_not_below_max_size_is_a_config_error() {
    assert!(matches!(ChunkingConfig::new(100, 100), Err(Error::InvalidConfig(_))));
    assert!(matches!(ChunkingConfig::new(100, 150), Err(Error::InvalidConfig(_))));
    assert!(matches!(ChunkingConfig::new(0, 0), Err(Error::InvalidConfig(_))));

    let bad = ChunkingConfig { max_size: 10, overlap: 10 };
    assert!(chunker::chunk(&page("text", 1), &bad).is_err());
}

#[test]
fn list_pdf_files_is_flat_sorted_and_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.pdf"), b"x").unwrap();
    fs::write(dir.join("A.PDF"), b"x").unwrap();
    fs::write(dir.join("notes.txt"), b"x").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("nested/c.pdf"), b"x").unwrap();

    let processor = DataProcessor::new(ChunkingConfig::default()).unwrap();
    let files = processor.list_pdf_files(dir).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["A.PDF", "b.pdf"]);
}

#[test]
fn empty_directory_reports_no_documents() {
    let tmp = TempDir::new().unwrap();
    let processor = DataProcessor::new(ChunkingConfig::default()).unwrap();
    let err = processor.process_directory(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::NoDocuments(_)));

    let missing = tmp.path().join("missing");
    assert!(matches!(processor.process_directory(&missing), Err(Error::InvalidConfig(_))));
}

#[test]
fn process_directory_uses_loader_and_skips_blank_pages() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("one.pdf"), b"x").unwrap();
    fs::write(tmp.path().join("two.pdf"), b"x").unwrap();

    let cfg = ChunkingConfig::new(20, 5).unwrap();
    let processor = DataProcessor::with_loader(cfg, Box::new(StubLoader)).unwrap();
    let corpus = processor.process_directory(tmp.path()).unwrap();

    assert_eq!(corpus.files.len(), 2);
    assert_eq!(corpus.pages, 4);
    // 30 chars with step 15: windows at 0 and 15
    assert_eq!(corpus.chunks.len(), 4);
    assert!(corpus.chunks.iter().all(|c| c.page_number == 1));
    assert_eq!(corpus.chunks[0].source_file, "one.pdf");
    assert_eq!(corpus.chunks[3].source_file, "two.pdf");
}

#[test]
fn pdf_loader_reads_pages_in_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("report.pdf");
    write_pdf(&path, &["Alpha page text", "Bravo page text", "Charlie page text"]);

    let pages = PdfLoader.load(&path).unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages.iter().map(|p| p.page_number).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(pages.iter().all(|p| p.source_file == "report.pdf"));
    assert!(pages[0].text.contains("Alpha"));
    assert!(pages[2].text.contains("Charlie"));
}

#[test]
fn unreadable_pdf_is_a_load_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"definitely not a pdf").unwrap();
    assert!(matches!(PdfLoader.load(&path), Err(Error::DocumentLoad { .. })));
}

#[test]
fn config_layers_override_defaults() {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::string(
            r#"
            [chunking]
            max_size = 800

            [generation]
            model = "gpt-4o-mini"
            timeout_secs = 30

            [credentials]
            username = "reader"
            "#,
        ));
    let cfg = AppConfig::from_figment(figment).unwrap();

    assert_eq!(cfg.chunking.max_size, 800);
    assert_eq!(cfg.chunking.overlap, 200);
    assert_eq!(cfg.generation.model, "gpt-4o-mini");
    assert_eq!(cfg.generation.timeout_secs, 30);
    assert_eq!(cfg.generation.max_tokens, 3000);
    assert_eq!(cfg.retrieval.top_k, 10);
    assert_eq!(cfg.batching.batch_size, 50);
    assert_eq!(cfg.retry.max_attempts, 2);
    assert_eq!(cfg.credentials.username.as_deref(), Some("reader"));
}

#[test]
fn numeric_secrets_from_the_environment_stay_text() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("APP_CREDENTIALS__PASSWORD", "123456");
        jail.set_env("APP_CREDENTIALS__USERNAME", "4242");
        jail.set_env("APP_CREDENTIALS__API_KEY", "sk-local");
        jail.set_env("APP_RETRIEVAL__TOP_K", "4");

        let cfg = AppConfig::from_figment(AppConfig::figment()).unwrap();
        assert_eq!(cfg.credentials.password.as_deref(), Some("123456"));
        assert_eq!(cfg.credentials.username.as_deref(), Some("4242"));
        assert_eq!(cfg.retrieval.top_k, 4);

        let serving = cfg.credentials.require_for_serving().unwrap();
        assert!(serving.authenticate("4242", " 123456 "));
        Ok(())
    });
}

#[test]
fn config_validation_rejects_bad_values() {
    let cases = [
        "[chunking]\nmax_size = 100\noverlap = 100",
        "[batching]\nbatch_size = 0",
        "[retry]\nmax_attempts = 0",
        "[retry]\ninitial_backoff_ms = 9000\nmax_backoff_ms = 10",
        "[retrieval]\ntop_k = 0",
        "[generation]\ntemperature = 3.5",
        "[logging]\nlevel = \"loud\"",
        "[logging]\nformat = \"xml\"",
    ];
    for case in cases {
        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(case));
        let res = AppConfig::from_figment(figment);
        assert!(matches!(res, Err(Error::InvalidConfig(_))), "accepted: {case}");
    }
}

#[test]
fn serving_requires_every_credential() {
    let creds = Credentials { api_key: Some("sk-test".into()), username: None, password: Some("  ".into()) };
    match creds.require_for_serving() {
        Err(Error::MissingCredentials(missing)) => assert_eq!(missing, vec!["username", "password"]),
        other => panic!("unexpected: {other:?}"),
    }

    let creds = Credentials {
        api_key: Some("sk-test".into()),
        username: Some(" admin ".into()),
        password: Some("s3cret\n".into()),
    };
    let serving = creds.require_for_serving().unwrap();
    assert_eq!(serving.api_key(), "sk-test");
    assert!(serving.authenticate("admin", "s3cret"));
    assert!(serving.authenticate("  admin", "s3cret  "));
    assert!(!serving.authenticate("admin", "wrong"));
    assert!(!format!("{creds:?}").contains("s3cret"));
    assert!(!format!("{serving:?}").contains("sk-test"));
}

#[test]
fn unique_sources_keep_rank_order() {
    let hit = |file: &str, page: u32, score: f32| ScoredChunk {
        chunk: Chunk { text: "t".into(), source_file: file.into(), page_number: page, chunk_index: 0 },
        score,
    };
    let result = RetrievalResult::new(vec![hit("b.pdf", 2, 0.9), hit("a.pdf", 1, 0.8), hit("b.pdf", 2, 0.7), hit("b.pdf", 3, 0.6)]);
    let sources: Vec<String> = result.unique_sources().iter().map(|s| s.to_string()).collect();
    assert_eq!(sources, vec!["b.pdf (page 2)", "a.pdf (page 1)", "b.pdf (page 3)"]);
}
