//! Download phase: every resolved link to its own timestamped file.
//!
//! Tasks are created up front on the calling thread, so output names are fixed
//! before any worker starts. Workers stream bodies to disk and report
//! [`ProgressEvent`]s; the calling thread receives each task's outcome from the
//! pool, advances the completed counter and sends the result event. Nothing
//! here writes to the terminal.

mod progress;
mod single;

pub use progress::{BatchProgress, ProgressEvent, TaskProgress};

use std::fs;
use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::DownloadConfig;
use crate::error::SnapError;
use crate::extractor::ResolvedLink;
use crate::scheduler::run_bounded;
use crate::transport::HttpClient;
use crate::url_model::FilenameGenerator;

#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub index: usize,
    pub link: ResolvedLink,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    pub file_extension: String,
    pub chunk_size: usize,
}

impl From<&DownloadConfig> for DownloadOptions {
    fn from(cfg: &DownloadConfig) -> Self {
        Self {
            output_dir: cfg.output_dir.clone(),
            filename_prefix: cfg.filename_prefix.clone(),
            file_extension: cfg.file_extension.clone(),
            chunk_size: cfg.chunk_size,
        }
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from(&DownloadConfig::default())
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Failed { path: PathBuf, kind: String, message: String },
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved { .. })
    }
}

/// Outcomes in link order, plus the completed counter.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DownloadOutcome>,
    pub completed: usize,
    pub total: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

fn build_tasks(links: &[ResolvedLink], opts: &DownloadOptions) -> Vec<DownloadTask> {
    let mut names = FilenameGenerator::new(&opts.filename_prefix, &opts.file_extension);
    links
        .iter()
        .enumerate()
        .map(|(index, link)| DownloadTask {
            index,
            link: link.clone(),
            path: opts.output_dir.join(names.next_name()),
        })
        .collect()
}

/// Downloads `links` on at most `workers` threads, continuing past failures.
///
/// Only a failure to create the output directory is returned as an error;
/// per-link failures are recorded in the report.
pub fn download_batch(
    client: &HttpClient,
    links: &[ResolvedLink],
    workers: usize,
    opts: &DownloadOptions,
    progress_tx: Option<&UnboundedSender<ProgressEvent>>,
) -> Result<BatchReport, SnapError> {
    if links.is_empty() {
        return Ok(BatchReport::default());
    }
    fs::create_dir_all(&opts.output_dir)?;

    let tasks = build_tasks(links, opts);
    if let Some(tx) = progress_tx {
        for task in &tasks {
            let _ = tx.send(ProgressEvent::Queued {
                index: task.index,
                path: task.path.clone(),
            });
        }
    }
    tracing::info!(
        links = tasks.len(),
        workers,
        dir = %opts.output_dir.display(),
        "download phase started"
    );

    let total = tasks.len();
    let mut completed = 0usize;
    let results = run_bounded(
        tasks.iter().collect(),
        workers,
        |_, task| single::download_one(client, task, opts.chunk_size, progress_tx),
        |index, res| {
            let task = &tasks[index];
            let event = match res {
                Ok(Ok(bytes)) => {
                    tracing::info!(path = %task.path.display(), bytes, "saved");
                    ProgressEvent::Saved {
                        index,
                        path: task.path.clone(),
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        link = %task.link,
                        path = %task.path.display(),
                        error = %e,
                        "download failed"
                    );
                    ProgressEvent::Failed {
                        index,
                        path: task.path.clone(),
                        kind: e.kind_name().to_string(),
                    }
                }
                Err(panicked) => {
                    tracing::warn!(
                        link = %task.link,
                        error = %panicked,
                        "download worker panicked"
                    );
                    ProgressEvent::Failed {
                        index,
                        path: task.path.clone(),
                        kind: "WorkerPanic".to_string(),
                    }
                }
            };
            completed += 1;
            if let Some(tx) = progress_tx {
                let _ = tx.send(event);
            }
        },
    );

    let outcomes = results
        .into_iter()
        .zip(&tasks)
        .map(|(res, task)| match res {
            Ok(Ok(bytes)) => DownloadOutcome::Saved {
                path: task.path.clone(),
                bytes,
            },
            Ok(Err(e)) => DownloadOutcome::Failed {
                path: task.path.clone(),
                kind: e.kind_name().to_string(),
                message: e.to_string(),
            },
            Err(panicked) => DownloadOutcome::Failed {
                path: task.path.clone(),
                kind: "WorkerPanic".to_string(),
                message: panicked.to_string(),
            },
        })
        .collect();

    tracing::info!(completed, total, "download phase finished");
    Ok(BatchReport {
        outcomes,
        completed,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use std::collections::HashSet;

    #[test]
    fn empty_batch_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let opts = DownloadOptions {
            output_dir: dir.path().join("never-created"),
            ..DownloadOptions::default()
        };
        let client = HttpClient::new(&TransportConfig::default());
        let report = download_batch(&client, &[], 4, &opts, None).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.completed, 0);
        assert!(!opts.output_dir.exists());
    }

    #[test]
    fn tasks_get_distinct_names_under_output_dir() {
        let opts = DownloadOptions::default();
        let links: Vec<ResolvedLink> = (0..50)
            .map(|i| ResolvedLink::new(format!("https://d.snaptik.app/{i}")))
            .collect();
        let tasks = build_tasks(&links, &opts);
        let names: HashSet<&PathBuf> = tasks.iter().map(|t| &t.path).collect();
        assert_eq!(names.len(), 50);
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.index, i);
            assert!(task.path.starts_with("Tiktok Videos"));
            let name = task.path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("Snaptik.app_"));
            assert!(name.ends_with(".mp4"));
        }
    }

    #[test]
    fn unreachable_links_become_failures() {
        let dir = tempfile::tempdir().unwrap();
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let links = vec![
            ResolvedLink::new(format!("http://127.0.0.1:{port}/a")),
            ResolvedLink::new(format!("http://127.0.0.1:{port}/b")),
        ];
        let opts = DownloadOptions {
            output_dir: dir.path().to_path_buf(),
            ..DownloadOptions::default()
        };
        let client = HttpClient::new(&TransportConfig::default());
        let report = download_batch(&client, &links, 2, &opts, None).unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            &report.outcomes[0],
            DownloadOutcome::Failed { kind, .. } if kind == "ConnectError"
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
