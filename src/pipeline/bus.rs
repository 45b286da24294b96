use crate::ble::ControlHandle;
use crate::core::{ControlCommand, PredictionResult, Sample};
use crate::observability::PipelineMetrics;
use crate::store::{SlidingWindowStore, WindowSnapshot};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Messages flowing into the coordinator from the session and the workers
#[derive(Debug)]
pub enum PipelineEvent {
    /// Decoded sample accepted by the session
    Sample(Sample),
    /// Control peripheral handle, published once after service resolution
    Connected(ControlHandle),
    /// Advisory progress text ("Scanning", "Ready", ...)
    Status(String),
    /// Non-fatal per-sample diagnostics (decode failures)
    Diagnostic(String),
    /// Session-fatal failure; the session has moved to its Error state
    SessionError(String),
    /// Completed inference pass
    Prediction(PredictionResult),
    /// Failed inference pass; the trigger chain still advances
    InferenceFailed(String),
    /// Failed durable append; the pipeline continues
    PersistFailed(String),
    /// Failed control write, surfaced to the operator
    WriteFailed(String),
}

/// Requests consumed by the control writer
#[derive(Debug)]
pub enum ControlRequest {
    Bind(ControlHandle),
    Write(ControlCommand),
}

/// Messages forwarded to the external display collaborator. Free-text
/// content is advisory only and never parsed.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    Sample(Sample),
    Prediction(PredictionResult),
    Status(String),
    Error(String),
    Ready,
}

/// Message bus between the session, the workers, and the display.
///
/// Owns the sliding windows and the routing table, nothing else: every event
/// is forwarded to the consumers that subscribed to its kind at wiring time.
/// Also owns the inference trigger chain: one trigger when the windows first
/// fill, then exactly one new trigger per finished inference, taken against
/// the window state current at that moment.
pub struct Coordinator {
    store: Arc<SlidingWindowStore>,
    metrics: Arc<PipelineMetrics>,
    events_rx: mpsc::Receiver<PipelineEvent>,
    commands_rx: mpsc::Receiver<ControlCommand>,
    persist_tx: mpsc::Sender<Sample>,
    infer_tx: mpsc::Sender<WindowSnapshot>,
    control_tx: mpsc::Sender<ControlRequest>,
    display_tx: mpsc::Sender<DisplayEvent>,
    shutdown: watch::Receiver<bool>,
    primed: bool,
    bound: bool,
    commands_open: bool,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<SlidingWindowStore>,
        metrics: Arc<PipelineMetrics>,
        events_rx: mpsc::Receiver<PipelineEvent>,
        commands_rx: mpsc::Receiver<ControlCommand>,
        persist_tx: mpsc::Sender<Sample>,
        infer_tx: mpsc::Sender<WindowSnapshot>,
        control_tx: mpsc::Sender<ControlRequest>,
        display_tx: mpsc::Sender<DisplayEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            metrics,
            events_rx,
            commands_rx,
            persist_tx,
            infer_tx,
            control_tx,
            display_tx,
            shutdown,
            primed: false,
            bound: false,
            commands_open: true,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.route(event).await,
                    None => break,
                },
                command = self.commands_rx.recv(), if self.commands_open => match command {
                    Some(command) => {
                        if self.control_tx.send(ControlRequest::Write(command)).await.is_err() {
                            warn!("control writer gone, dropping command");
                        }
                    }
                    None => self.commands_open = false,
                },
            }
        }
        debug!("coordinator stopped");
    }

    async fn route(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Sample(sample) => {
                self.metrics.record_sample();
                self.store.push(sample);
                if self.persist_tx.send(sample).await.is_err() {
                    warn!("persistence worker gone, dropping sample");
                }
                self.display(DisplayEvent::Sample(sample));
                // The first push that fills the windows fires the one
                // initial trigger; every later trigger comes from a
                // finished inference.
                if !self.primed && self.store.is_full() {
                    self.primed = true;
                    self.trigger().await;
                }
            }
            PipelineEvent::Prediction(result) => {
                self.metrics.record_inference();
                self.display(DisplayEvent::Prediction(result));
                self.trigger().await;
            }
            PipelineEvent::InferenceFailed(message) => {
                self.metrics.record_inference_failure();
                self.display(DisplayEvent::Error(message));
                // A failed pass must not stall the chain.
                self.trigger().await;
            }
            PipelineEvent::Connected(handle) => {
                if self.bound {
                    warn!("duplicate control handle, ignoring");
                    return;
                }
                self.bound = true;
                if self
                    .control_tx
                    .send(ControlRequest::Bind(handle))
                    .await
                    .is_err()
                {
                    warn!("control writer gone, handle dropped");
                }
                self.display(DisplayEvent::Ready);
            }
            PipelineEvent::Status(message) => {
                self.display(DisplayEvent::Status(message));
            }
            PipelineEvent::Diagnostic(message)
            | PipelineEvent::SessionError(message)
            | PipelineEvent::PersistFailed(message)
            | PipelineEvent::WriteFailed(message) => {
                self.display(DisplayEvent::Error(message));
            }
        }
    }

    /// Fire one inference trigger against the current window state.
    async fn trigger(&self) {
        let snapshot = self.store.snapshot();
        if self.infer_tx.send(snapshot).await.is_err() {
            warn!("inference worker gone, trigger dropped");
        }
    }

    fn display(&self, event: DisplayEvent) {
        // The display collaborator is advisory; a slow or absent display
        // never stalls routing.
        if let Err(e) = self.display_tx.try_send(event) {
            debug!("display event dropped: {e}");
        }
    }
}
