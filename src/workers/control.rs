use crate::ble::ControlHandle;
use crate::core::ControlCommand;
use crate::observability::PipelineMetrics;
use crate::pipeline::bus::{ControlRequest, PipelineEvent};
use log::{debug, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("no control device connected")]
    NotConnected,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Encodes operator commands and writes them to the stimulation peripheral.
///
/// Holds nothing until a [`ControlHandle`] is bound; a write request before
/// that is a precondition violation reported as `NotConnected`. Writes are
/// never retried.
pub struct ControlWriter {
    handle: Option<ControlHandle>,
    metrics: Arc<PipelineMetrics>,
}

impl ControlWriter {
    pub fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            handle: None,
            metrics,
        }
    }

    /// Bind the stimulation peripheral and its control characteristics.
    /// Only the first bind takes effect.
    pub fn bind(&mut self, handle: ControlHandle) {
        if self.handle.is_none() {
            self.handle = Some(handle);
        } else {
            warn!("control handle already bound, ignoring rebind");
        }
    }

    /// Write both command fields, each as one 2-byte little-endian payload
    /// to its own characteristic.
    pub async fn write(&self, command: &ControlCommand) -> Result<(), WriteError> {
        let handle = self.handle.as_ref().ok_or(WriteError::NotConnected)?;
        for (characteristic, payload) in handle.freq_chars.iter().zip(command.encode()) {
            handle
                .peripheral
                .write(*characteristic, &payload)
                .await
                .map_err(|e| WriteError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    /// Write confirmations are advisory; a full event queue drops the
    /// report rather than stalling the request loop.
    fn report(&self, events: &mpsc::Sender<PipelineEvent>, event: PipelineEvent) {
        if events.try_send(event).is_err() {
            debug!("write report dropped");
        }
    }

    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<ControlRequest>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        while let Some(request) = rx.recv().await {
            match request {
                ControlRequest::Bind(handle) => self.bind(handle),
                ControlRequest::Write(command) => match self.write(&command).await {
                    Ok(()) => {
                        self.metrics.record_write();
                        self.report(
                            &events,
                            PipelineEvent::Status("Data written to characteristic".to_string()),
                        );
                    }
                    Err(e) => {
                        self.metrics.record_write_failure();
                        warn!("control write failed: {e}");
                        self.report(&events, PipelineEvent::WriteFailed(e.to_string()));
                    }
                },
            }
        }
    }
}
