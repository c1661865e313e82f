//! CLI for snapdl.

mod progress_view;
mod terminal;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use snapdl_core::batch::{self, BatchInput};
use snapdl_core::config;
use std::path::PathBuf;

use progress_view::ViewOptions;

/// Top-level CLI: resolve TikTok URLs through snaptik and download the videos.
#[derive(Debug, Parser)]
#[command(name = "snapdl")]
#[command(about = "Download TikTok videos through the snaptik resolver", long_about = None)]
pub struct Cli {
    /// Single TikTok URL.
    #[arg(short = 'u', long = "single-url", value_name = "URL")]
    pub single_url: Option<String>,

    /// Text file containing TikTok URLs, one per line.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub filename: Option<PathBuf>,

    /// Worker threads for each phase (default: one per valid URL).
    #[arg(short = 'w', long, value_name = "N")]
    pub worker: Option<usize>,

    /// Log to stderr, for debugging.
    #[arg(short = 'l', long)]
    pub enable_log: bool,

    /// Erase the progress panel once every download has finished.
    #[arg(short = 't', long)]
    pub transient: bool,

    /// Remove a download's progress bar as soon as it finishes.
    #[arg(short = 'c', long)]
    pub instant_clear: bool,

    /// Directory for downloaded videos (overrides the config file).
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// The URL list file wins over a single URL. `None` when neither is given.
    pub fn input(&self) -> Option<BatchInput> {
        match (&self.filename, &self.single_url) {
            (Some(path), _) => Some(BatchInput::File(path.clone())),
            (None, Some(url)) => Some(BatchInput::Single(url.clone())),
            (None, None) => None,
        }
    }

    fn view_options(&self) -> ViewOptions {
        ViewOptions {
            transient: self.transient,
            instant_clear: self.instant_clear,
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    terminal::clear_screen();

    let Some(input) = cli.input() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut cfg = config::load_or_init()?;
    if let Some(dir) = &cli.output_dir {
        cfg.download.output_dir = dir.clone();
    }
    tracing::debug!("loaded config: {:?}", cfg);

    let (progress_tx, progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let view = tokio::spawn(progress_view::run(
        progress_rx,
        cli.view_options(),
        terminal::width(),
    ));

    let workers = cli.worker;
    // The pipeline blocks on curl; the sender is dropped when it returns, which ends the view.
    let report = tokio::task::spawn_blocking(move || {
        batch::run_batch(&input, workers, &cfg, Some(&progress_tx))
    })
    .await
    .context("batch thread panicked")?;
    let progress = view.await.context("progress view panicked")?;
    let report = report?;

    if report.total == 0 {
        println!("No downloadable video link found.");
    } else {
        tracing::info!(
            saved = report.succeeded(),
            failed = report.failed(),
            completed = progress.completed,
            "batch finished"
        );
    }
    Ok(())
}
