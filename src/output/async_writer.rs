use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::output::{ResultSink, VhostHit};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `[200] admin.example.com size: 1234 bytes`
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    pub fn render(&self, hit: &VhostHit) -> anyhow::Result<String> {
        match self {
            OutputFormat::Text => Ok(hit.line()),
            OutputFormat::Jsonl => Ok(serde_json::to_string(hit)?),
        }
    }
}

/// Appends visible results to a file through a background writer task.
pub struct FileSink {
    tx: mpsc::Sender<VhostHit>,
}

/// Owner side of the writer task; `finish` waits until every queued line is on disk.
pub struct WriterHandle {
    path: PathBuf,
    handle: tokio::task::JoinHandle<()>,
}

impl FileSink {
    /// Open (or create) `path` for appending. Fails up front if the file cannot be opened.
    pub async fn create(path: &Path, format: OutputFormat) -> anyhow::Result<(Self, WriterHandle)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("failed to open output file {}", path.display()))?;

        let (tx, rx) = mpsc::channel::<VhostHit>(1024);
        let handle = spawn_result_writer(path.to_path_buf(), file, format, rx);
        Ok((
            Self { tx },
            WriterHandle {
                path: path.to_path_buf(),
                handle,
            },
        ))
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn record(&self, hit: &VhostHit) {
        if self.tx.send(hit.clone()).await.is_err() {
            tracing::error!(host = %hit.host, "result writer has stopped, line dropped");
        }
    }
}

impl WriterHandle {
    /// Resolves once every `FileSink` sender is dropped and the writer has flushed.
    pub async fn finish(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, path = %self.path.display(), "result writer task failed");
        }
    }
}

/// Each line is flushed on its own so an interrupted run keeps what was found.
fn spawn_result_writer(path: PathBuf, mut f: File, format: OutputFormat, mut rx: mpsc::Receiver<VhostHit>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(hit) = rx.recv().await {
            let mut line = match format.render(&hit) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "failed to render result line");
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = f.write_all(line.as_bytes()).await {
                tracing::error!(error = %e, path = %path.display(), "failed to write result line");
                continue;
            }
            if let Err(e) = f.flush().await {
                tracing::error!(error = %e, path = %path.display(), "failed to flush result line");
            }
        }
        if let Err(e) = f.flush().await {
            tracing::error!(error = %e, path = %path.display(), "failed to flush result writer");
        }
    })
}
