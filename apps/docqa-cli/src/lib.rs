//! Wiring shared by the `docqa` binaries: configuration, logging, the
//! embedder and the ready index.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use docqa_core::config::AppConfig;
use docqa_core::credentials::ServingCredentials;
use docqa_core::data_processor::DataProcessor;
use docqa_core::logging;
use docqa_core::traits::Embedder;
use docqa_vector::{BuildOptions, BuildReport, IndexBuilder, IndexOrigin};

/// Path overrides accepted by every binary.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory containing the source PDFs
    #[arg(long, env = "APP_PATHS__DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the persisted index
    #[arg(long, env = "APP_PATHS__INDEX_DIR")]
    pub index_dir: Option<PathBuf>,
}

impl PathArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.paths.data_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(dir) = &self.index_dir {
            config.paths.index_dir = dir.to_string_lossy().into_owned();
        }
    }
}

/// Login for the serving commands. There is no interactive password prompt,
/// so the password never echoes on the terminal.
#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    #[arg(long, env = "DOCQA_USER")]
    pub user: Option<String>,

    #[arg(long, env = "DOCQA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl LoginArgs {
    pub fn authenticate(&self, credentials: &ServingCredentials) -> Result<()> {
        let (Some(user), Some(password)) = (self.user.as_deref(), self.password.as_deref()) else {
            bail!("login required: pass --user and --password, or set DOCQA_USER and DOCQA_PASSWORD");
        };
        if !credentials.authenticate(user, password) {
            bail!("invalid username or password");
        }
        tracing::info!(user = credentials.username(), "login accepted");
        Ok(())
    }
}

/// Load the layered configuration, apply path overrides and start logging.
pub fn bootstrap(paths: &PathArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load().context("loading configuration")?;
    paths.apply(&mut config);
    logging::init(&config.logging)?;
    tracing::debug!(data_dir = %config.data_dir().display(), index_dir = %config.index_dir().display(), "configuration loaded");
    Ok(config)
}

pub fn embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    docqa_embed::get_default_embedder(&config.embedding).context("initialising the embedder")
}

/// Reuse the persisted index or build it from the data directory.
pub fn ready_index(config: &AppConfig, embedder: Arc<dyn Embedder>, show_progress: bool) -> Result<BuildReport> {
    let processor = DataProcessor::new(config.chunking)?;
    let mut options = BuildOptions::from_config(config);
    options.show_progress = show_progress;
    let builder = IndexBuilder::new(processor, embedder, options);
    let report = builder.load_or_build(&config.data_dir(), &config.index_dir())?;
    Ok(report)
}

pub fn describe_origin(report: &BuildReport) -> String {
    match &report.origin {
        IndexOrigin::Loaded => format!("Loaded persisted index ({} chunks)", report.index.len()),
        IndexOrigin::Built(stats) => format!(
            "Built index: {} files, {} pages, {} chunks in {} batches",
            stats.files, stats.pages, stats.chunks, stats.batches
        ),
    }
}

/// Cut `text` to at most `max` characters for console previews.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
