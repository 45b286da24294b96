use crate::core::Sample;
use crate::observability::PipelineMetrics;
use crate::pipeline::bus::PipelineEvent;
use async_trait::async_trait;
use chrono::Local;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait implemented by durable sample targets
#[async_trait]
pub trait SampleSink: Send {
    /// Append one record. Must release the backing store on every exit path.
    async fn append(&mut self, sample: &Sample) -> Result<(), PersistError>;
}

/// Session-scoped CSV target named by session start time.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Create a fresh target under `dir`, truncating nothing: the name embeds
    /// the session start timestamp, so every session gets its own file.
    pub async fn create(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let stamp = Local::now().format("%Y_%m_%d_%H%M%S");
        let path = dir.join(format!("{stamp}.csv"));
        File::create(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SampleSink for CsvSink {
    async fn append(&mut self, sample: &Sample) -> Result<(), PersistError> {
        // Scoped acquisition: the handle lives for one write and is closed
        // on every exit path when it drops.
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(format!("{sample}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Consumes accepted samples in arrival order and appends each one to the
/// sink. A failed append is reported on the bus and the loop continues; the
/// ingestion path is never blocked by a write failure.
pub struct PersistenceWorker {
    sink: Box<dyn SampleSink>,
    metrics: Arc<PipelineMetrics>,
}

impl PersistenceWorker {
    pub fn new(sink: Box<dyn SampleSink>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { sink, metrics }
    }

    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<Sample>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        while let Some(sample) = rx.recv().await {
            match self.sink.append(&sample).await {
                Ok(()) => self.metrics.record_persisted(),
                Err(e) => {
                    self.metrics.record_persist_failure();
                    warn!("failed to persist sample: {e}");
                    // Failure reports are advisory; the drain loop must keep
                    // consuming even when the event queue is full.
                    if events
                        .try_send(PipelineEvent::PersistFailed(e.to_string()))
                        .is_err()
                    {
                        debug!("persist failure report dropped");
                    }
                }
            }
        }
    }
}
