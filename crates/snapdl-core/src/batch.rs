//! One run: validate inputs, resolve links, download them.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;

use crate::config::SnapConfig;
use crate::downloader::{download_batch, BatchReport, DownloadOptions, ProgressEvent};
use crate::error::SnapError;
use crate::extractor::{LinkExtractor, ResolvedLink};
use crate::scheduler::choose_worker_count;
use crate::transport::HttpClient;
use crate::url_model::SourceUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInput {
    Single(String),
    /// Newline-delimited URL list.
    File(PathBuf),
}

/// Reads `path` as one URL per line. Lines are trimmed; blank lines are dropped.
pub fn load_urls(path: &Path) -> Result<Vec<String>, SnapError> {
    let data = fs::read_to_string(path)?;
    let urls: Vec<String> = data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if urls.is_empty() {
        return Err(SnapError::UrlNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(urls)
}

/// Keeps the URLs with a recognized shape, in input order.
pub fn sanitize_urls(raw: &[String]) -> Result<Vec<SourceUrl>, SnapError> {
    let valid: Vec<SourceUrl> = raw
        .iter()
        .filter_map(|url| {
            let parsed = SourceUrl::parse(url);
            if parsed.is_none() {
                tracing::info!(url = %url, "skipping unrecognized URL");
            }
            parsed
        })
        .collect();
    if valid.is_empty() {
        return Err(SnapError::InvalidUrl);
    }
    Ok(valid)
}

fn collect_inputs(input: &BatchInput) -> Result<Vec<String>, SnapError> {
    match input {
        BatchInput::Single(url) => Ok(vec![url.clone()]),
        BatchInput::File(path) => load_urls(path),
    }
}

/// Runs extraction then download with the same worker count.
///
/// Validation errors are returned before any network request. Per-URL and
/// per-download failures are reported and do not stop the run.
pub fn run_batch(
    input: &BatchInput,
    explicit_workers: Option<usize>,
    cfg: &SnapConfig,
    progress_tx: Option<&UnboundedSender<ProgressEvent>>,
) -> Result<BatchReport, SnapError> {
    let urls = sanitize_urls(&collect_inputs(input)?)?;
    let workers = choose_worker_count(explicit_workers, urls.len());
    tracing::info!(urls = urls.len(), workers, "batch validated");

    let client = HttpClient::new(&cfg.transport);
    let extractor = LinkExtractor::new(client.clone(), cfg.resolver.clone());
    let links: Vec<ResolvedLink> = extractor
        .extract_all(&urls, workers, progress_tx)
        .into_iter()
        .flatten()
        .collect();
    tracing::info!(
        resolved = links.len(),
        requested = urls.len(),
        "extraction phase finished"
    );
    if links.is_empty() {
        return Ok(BatchReport::default());
    }

    download_batch(
        &client,
        &links,
        workers,
        &DownloadOptions::from(&cfg.download),
        progress_tx,
    )
}
