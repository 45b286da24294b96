use super::bus::{Coordinator, DisplayEvent};
use super::session::IngestionSession;
use super::state::SessionState;
use crate::ble::BleCentral;
use crate::core::{ControlCommand, PipelineConfig};
use crate::observability::PipelineMetrics;
use crate::store::SlidingWindowStore;
use crate::workers::{
    ControlWriter, InferenceWorker, PersistenceWorker, SampleSink, TremorModel,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Running pipeline: coordinator, session, and the three workers, each on
/// its own task.
pub struct Pipeline {
    commands_tx: mpsc::Sender<ControlCommand>,
    shutdown_tx: watch::Sender<bool>,
    session: JoinHandle<SessionState>,
    tasks: Vec<JoinHandle<()>>,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    /// Load the model, wire every channel, and spawn all tasks. A model
    /// that fails to load is the one startup-fatal condition.
    pub async fn spawn(
        config: PipelineConfig,
        central: Arc<dyn BleCentral>,
        mut model: Box<dyn TremorModel>,
        sink: Box<dyn SampleSink>,
        display_tx: mpsc::Sender<DisplayEvent>,
    ) -> Result<Self> {
        model.load().await.context("Failed to load tremor model")?;

        let capacity = config.channel_capacity;
        let store = Arc::new(SlidingWindowStore::new());
        let metrics = Arc::new(PipelineMetrics::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (commands_tx, commands_rx) = mpsc::channel(capacity);
        let (persist_tx, persist_rx) = mpsc::channel(capacity);
        let (infer_tx, infer_rx) = mpsc::channel(capacity);
        let (control_tx, control_rx) = mpsc::channel(capacity);

        let coordinator = Coordinator::new(
            store,
            metrics.clone(),
            events_rx,
            commands_rx,
            persist_tx,
            infer_tx,
            control_tx,
            display_tx,
            shutdown_rx.clone(),
        );

        let session = IngestionSession::new(
            central,
            config,
            events_tx.clone(),
            shutdown_rx,
            metrics.clone(),
        );

        let persistence = PersistenceWorker::new(sink, metrics.clone());
        let inference = InferenceWorker::new(model);
        let control = ControlWriter::new(metrics.clone());

        let tasks = vec![
            tokio::spawn(coordinator.run()),
            tokio::spawn(persistence.run(persist_rx, events_tx.clone())),
            tokio::spawn(inference.run(infer_rx, events_tx.clone())),
            tokio::spawn(control.run(control_rx, events_tx.clone())),
        ];
        let session = tokio::spawn(session.run());
        drop(events_tx);

        Ok(Self {
            commands_tx,
            shutdown_tx,
            session,
            tasks,
            metrics,
        })
    }

    /// Queue for operator commands.
    pub fn commands(&self) -> mpsc::Sender<ControlCommand> {
        self.commands_tx.clone()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Signal teardown and wait for every task to drain. In-flight work
    /// completes; nothing new is scheduled afterwards.
    pub async fn shutdown(self) -> Result<SessionState> {
        let _ = self.shutdown_tx.send(true);
        drop(self.commands_tx);
        let state = self.session.await.context("Session task panicked")?;
        for task in self.tasks {
            task.await.context("Pipeline task panicked")?;
        }
        Ok(state)
    }

    /// Wait for the session to end on its own (stream end or fatal error),
    /// then tear down the rest of the pipeline.
    pub async fn join(self) -> Result<SessionState> {
        let state = self.session.await.context("Session task panicked")?;
        let _ = self.shutdown_tx.send(true);
        drop(self.commands_tx);
        for task in self.tasks {
            task.await.context("Pipeline task panicked")?;
        }
        Ok(state)
    }
}
