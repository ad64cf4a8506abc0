use anyhow::Result;
use clap::Parser;

use docqa_cli::{bootstrap, describe_origin, embedder, ready_index, PathArgs};
use docqa_vector::IndexCache;

#[derive(Parser, Debug)]
#[command(name = "docqa-indexer")]
#[command(about = "Build the vector index from the PDF directory")]
struct Args {
    #[command(flatten)]
    paths: PathArgs,

    /// Delete the persisted index first and build from scratch
    #[arg(long)]
    rebuild: bool,

    /// Hide the per-batch progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = bootstrap(&args.paths)?;

    println!("Data directory: {}", config.data_dir().display());
    println!("Index directory: {}", config.index_dir().display());

    if args.rebuild && IndexCache::new(config.index_dir()).reset()? {
        println!("Removed previous index");
    }

    let embedder = embedder(&config)?;
    println!("Embedder: {}", embedder.embedder_id());
    let report = ready_index(&config, embedder, !args.quiet)?;
    println!("{}", describe_origin(&report));
    Ok(())
}
