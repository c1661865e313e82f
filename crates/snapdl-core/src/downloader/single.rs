//! One media download: streamed GET into a file, in fixed-size chunks.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tokio::sync::mpsc::UnboundedSender;

use super::{DownloadTask, ProgressEvent};
use crate::error::SnapError;
use crate::transport::{BodySink, HttpClient};

/// Writes a response body to `path`, creating the file only once a 2xx
/// response arrives.
struct FileSink<'a> {
    index: usize,
    path: &'a Path,
    chunk_size: usize,
    file: Option<File>,
    progress_tx: Option<&'a UnboundedSender<ProgressEvent>>,
}

impl FileSink<'_> {
    fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = self.progress_tx {
            let _ = tx.send(event);
        }
    }
}

impl BodySink for FileSink<'_> {
    fn on_response(&mut self, content_length: Option<u64>) -> io::Result<()> {
        self.file = Some(File::create(self.path)?);
        self.emit(ProgressEvent::Started {
            index: self.index,
            total_bytes: content_length.unwrap_or(0),
        });
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "body before response head"))?;
        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk)?;
            if let Some(tx) = self.progress_tx {
                let _ = tx.send(ProgressEvent::Advanced {
                    index: self.index,
                    bytes: chunk.len() as u64,
                });
            }
        }
        Ok(())
    }
}

/// Downloads `task.link` to `task.path`. Returns the bytes written.
///
/// On failure the partially written file is removed.
pub(super) fn download_one(
    client: &HttpClient,
    task: &DownloadTask,
    chunk_size: usize,
    progress_tx: Option<&UnboundedSender<ProgressEvent>>,
) -> Result<u64, SnapError> {
    let mut sink = FileSink {
        index: task.index,
        path: &task.path,
        chunk_size: chunk_size.max(1),
        file: None,
        progress_tx,
    };
    let res = client
        .stream_get(task.link.as_str(), &mut sink)
        .map_err(SnapError::from)
        .and_then(|bytes| {
            if let Some(file) = sink.file.as_mut() {
                file.flush()?;
            }
            Ok(bytes)
        });
    if res.is_err() && sink.file.take().is_some() {
        if let Err(e) = fs::remove_file(&task.path) {
            tracing::warn!(path = %task.path.display(), error = %e, "cannot remove partial file");
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_splits_writes_into_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = FileSink {
            index: 4,
            path: &path,
            chunk_size: 1024,
            file: None,
            progress_tx: Some(&tx),
        };
        sink.on_response(Some(2500)).unwrap();
        sink.on_data(&vec![7u8; 2500]).unwrap();
        drop(sink);

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::Started { index: 4, total_bytes: 2500 }
        );
        let chunks: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| match event {
                ProgressEvent::Advanced { bytes, .. } => bytes,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(chunks, vec![1024, 1024, 452]);
        assert_eq!(fs::read(&path).unwrap().len(), 2500);
    }

    #[test]
    fn no_file_before_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.mp4");
        let mut sink = FileSink {
            index: 0,
            path: &path,
            chunk_size: 16,
            file: None,
            progress_tx: None,
        };
        assert!(sink.on_data(b"early").is_err());
        assert!(!path.exists());
    }
}
