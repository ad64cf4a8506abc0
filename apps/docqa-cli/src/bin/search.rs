use anyhow::{Context, Result};
use clap::Parser;

use docqa_cli::{bootstrap, embedder, preview, ready_index, PathArgs};
use docqa_core::traits::VectorIndexer;

#[derive(Parser, Debug)]
#[command(name = "docqa-search")]
#[command(about = "Show the chunks retrieved for a query, without generation")]
struct Args {
    query: String,

    #[command(flatten)]
    paths: PathArgs,

    /// Number of chunks to show; defaults to retrieval.top_k
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = bootstrap(&args.paths)?;
    let limit = args.limit.unwrap_or(config.retrieval.top_k);

    let embedder = embedder(&config)?;
    let report = ready_index(&config, embedder.clone(), false)?;
    let query = embedder.embed(&args.query).context("embedding the query")?;
    let result = report.index.search_vec(&query, limit)?;

    println!("Found {} results for: \"{}\"", result.len(), args.query);
    for (i, hit) in result.iter().enumerate() {
        println!(
            "\n  {}. score={:.4}  {}  chunk={}",
            i + 1,
            hit.score,
            hit.chunk.source(),
            hit.chunk.chunk_index
        );
        println!("     {}", preview(&hit.chunk.text, 160));
    }
    Ok(())
}
