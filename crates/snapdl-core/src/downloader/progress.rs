//! Batch events (per-task progress, results, extraction failures) and the
//! aggregate view built from them.

use std::path::PathBuf;

/// Sent by the pipeline; `index` is a download task's position in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A source URL produced no link because its resolve cycle failed.
    ExtractionFailed { url: String, kind: String },
    /// Task created; nothing requested yet.
    Queued { index: usize, path: PathBuf },
    /// Response accepted and file opened. `total_bytes` is 0 when unknown.
    Started { index: usize, total_bytes: u64 },
    /// One chunk written.
    Advanced { index: usize, bytes: u64 },
    Saved { index: usize, path: PathBuf },
    Failed {
        index: usize,
        path: PathBuf,
        kind: String,
    },
}

impl ProgressEvent {
    /// Download task the event belongs to; `None` for extraction events.
    pub fn task_index(&self) -> Option<usize> {
        match self {
            ProgressEvent::ExtractionFailed { .. } => None,
            ProgressEvent::Queued { index, .. }
            | ProgressEvent::Started { index, .. }
            | ProgressEvent::Advanced { index, .. }
            | ProgressEvent::Saved { index, .. }
            | ProgressEvent::Failed { index, .. } => Some(*index),
        }
    }

    /// The user-facing line for a finished task or a failed extraction.
    pub fn result_line(&self) -> Option<String> {
        match self {
            ProgressEvent::Saved { path, .. } => {
                Some(format!("Video has been saved in {}", path.display()))
            }
            ProgressEvent::Failed { path, kind, .. } => {
                Some(format!("Download failed: {}: {}", path.display(), kind))
            }
            ProgressEvent::ExtractionFailed { url, kind } => {
                Some(format!("Extraction failed: {}: {}", url, kind))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskProgress {
    /// Display name (file name of the output path).
    pub filename: String,
    pub downloaded: u64,
    /// Declared size, 0 when unknown.
    pub total: u64,
    pub finished: bool,
    pub failed: bool,
}

impl TaskProgress {
    /// Fraction complete in [0.0, 1.0]; 0 while the size is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return if self.finished && !self.failed { 1.0 } else { 0.0 };
        }
        (self.downloaded as f64 / self.total as f64).min(1.0)
    }
}

/// Per-task bytes plus the batch-wide completed counter.
#[derive(Debug, Clone, Default)]
pub struct BatchProgress {
    pub tasks: Vec<TaskProgress>,
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            tasks: vec![TaskProgress::default(); total],
            completed: 0,
            total,
        }
    }

    pub fn apply(&mut self, event: &ProgressEvent) {
        let Some(index) = event.task_index() else {
            return;
        };
        if index >= self.tasks.len() {
            self.tasks.resize(index + 1, TaskProgress::default());
            self.total = self.total.max(index + 1);
        }
        let task = &mut self.tasks[index];
        match event {
            ProgressEvent::Queued { path, .. } => {
                task.filename = display_name(path);
            }
            ProgressEvent::Started { total_bytes, .. } => {
                task.total = *total_bytes;
                task.downloaded = 0;
            }
            ProgressEvent::Advanced { bytes, .. } => {
                task.downloaded += bytes;
            }
            ProgressEvent::Saved { path, .. } | ProgressEvent::Failed { path, .. } => {
                if task.finished {
                    return;
                }
                if task.filename.is_empty() {
                    task.filename = display_name(path);
                }
                task.finished = true;
                task.failed = matches!(event, ProgressEvent::Failed { .. });
                self.completed += 1;
            }
            ProgressEvent::ExtractionFailed { .. } => {}
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
