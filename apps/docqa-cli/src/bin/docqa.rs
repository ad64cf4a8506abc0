use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use docqa_answer::{AnswerEngine, AnswerMode, AnswerRecord, AnswerSettings, OpenAiChatClient, Session};
use docqa_cli::{bootstrap, describe_origin, embedder, ready_index, LoginArgs, PathArgs};
use docqa_core::config::AppConfig;
use docqa_core::credentials::ServingCredentials;
use docqa_vector::{CacheState, IndexCache};

#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ask cited questions over a folder of PDFs")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the state of the persisted index
    Status,
    /// Delete the persisted index so the next run rebuilds it
    Reset,
    /// Answer one question and exit
    Ask {
        question: String,
        /// question or redaction
        #[arg(long, default_value = "question")]
        mode: AnswerMode,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Interactive session
    Chat {
        #[arg(long, default_value = "question")]
        mode: AnswerMode,
        #[command(flatten)]
        login: LoginArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = bootstrap(&cli.paths)?;

    match cli.command {
        Command::Status => status(&config),
        Command::Reset => reset(&config),
        Command::Ask { question, mode, login } => {
            let credentials = config.credentials.require_for_serving()?;
            login.authenticate(&credentials)?;
            let (engine, index) = serve(&config, &credentials)?;
            let record = engine.answer(&index, &question, mode);
            print_answer(&record);
            Ok(())
        }
        Command::Chat { mode, login } => chat(&config, mode, &login),
    }
}

fn status(config: &AppConfig) -> Result<()> {
    let embedder = embedder(config)?;
    let cache = IndexCache::new(config.index_dir());
    let state = cache.inspect(embedder.embedder_id());
    println!("Index directory: {}", cache.dir().display());
    println!("State: {}", state.label());
    match state {
        CacheState::Ready(manifest) => {
            println!("Entries: {}  dim: {}  metric: {:?}", manifest.count, manifest.dim, manifest.metric);
            println!("Embedder: {}  created: {}", manifest.embedder_id, manifest.created_at);
        }
        CacheState::Stale { found } => {
            println!("Built with '{found}', current embedder is '{}'.", embedder.embedder_id());
            println!("Run `docqa reset` and rebuild.");
        }
        CacheState::Corrupt { reason } => {
            println!("Unreadable: {reason}");
            println!("Run `docqa reset` and rebuild.");
        }
        CacheState::Absent => println!("No index yet. Run `docqa-indexer` to build one."),
    }
    Ok(())
}

fn reset(config: &AppConfig) -> Result<()> {
    let cache = IndexCache::new(config.index_dir());
    if cache.reset()? {
        println!("Removed {}", cache.dir().display());
    } else {
        println!("Nothing to remove at {}", cache.dir().display());
    }
    Ok(())
}

fn serve(config: &AppConfig, credentials: &ServingCredentials) -> Result<(AnswerEngine, docqa_vector::FlatIndex)> {
    let embedder = embedder(config)?;
    let report = ready_index(config, embedder.clone(), true)?;
    eprintln!("{}", describe_origin(&report));

    let generator = OpenAiChatClient::new(config.generation.base_url.clone(), credentials.api_key());
    let engine = AnswerEngine::new(embedder, Arc::new(generator), AnswerSettings::from_config(config));
    Ok((engine, report.index))
}

fn chat(config: &AppConfig, mode: AnswerMode, login: &LoginArgs) -> Result<()> {
    let credentials = config.credentials.require_for_serving()?;
    login.authenticate(&credentials)?;

    let (engine, index) = serve(config, &credentials)?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut session = Session::new(mode);
    println!("Mode: {}. Commands: /mode question|redaction, /sources, /quit", session.mode());

    loop {
        let Ok(line) = prompt_line(&mut lines, "> ") else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/sources" => match session.last() {
                Some(record) => print_sources(record),
                None => println!("No answer yet."),
            },
            _ if input.starts_with("/mode") => {
                match input.trim_start_matches("/mode").parse::<AnswerMode>() {
                    Ok(mode) => {
                        session.set_mode(mode);
                        println!("Mode: {mode}");
                    }
                    Err(e) => println!("{e}"),
                }
            }
            question => {
                let record = session.ask(&engine, &index, question);
                print_answer(record);
            }
        }
    }
    Ok(())
}

fn prompt_line(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?),
        None => bail!("input closed"),
    }
}

fn print_answer(record: &AnswerRecord) {
    println!("\n{}\n", record.text);
    print_sources(record);
}

fn print_sources(record: &AnswerRecord) {
    let sources = record.unique_sources();
    if sources.is_empty() {
        return;
    }
    println!("Sources:");
    for source in sources {
        println!("  - {source}");
    }
}
