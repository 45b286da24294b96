use super::bus::PipelineEvent;
use super::state::SessionState;
use crate::ble::{BleCentral, BlePeripheral, CharacteristicRegistry, ControlHandle};
use crate::core::PipelineConfig;
use crate::decode::decode;
use crate::observability::PipelineMetrics;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Owns discovery, connection, characteristic resolution, and the
/// notification subscription for one run of the pipeline.
///
/// Session-fatal failures move the state machine to `Error` and end the
/// session; per-sample decode failures emit a diagnostic and the loop
/// continues. There is no automatic reconnection.
pub struct IngestionSession {
    central: Arc<dyn BleCentral>,
    config: PipelineConfig,
    events: mpsc::Sender<PipelineEvent>,
    shutdown: watch::Receiver<bool>,
    metrics: Arc<PipelineMetrics>,
    state: SessionState,
}

/// Everything `establish` hands to the steady-state loop.
struct Established {
    control: Arc<dyn BlePeripheral>,
    sensor: Arc<dyn BlePeripheral>,
    notifications: mpsc::Receiver<Vec<u8>>,
}

impl IngestionSession {
    pub fn new(
        central: Arc<dyn BleCentral>,
        config: PipelineConfig,
        events: mpsc::Sender<PipelineEvent>,
        shutdown: watch::Receiver<bool>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            central,
            config,
            events,
            shutdown,
            metrics,
            state: SessionState::Idle,
        }
    }

    /// Drive the session to completion and return its final state.
    pub async fn run(mut self) -> SessionState {
        match self.establish().await {
            Ok(established) => self.stream(established).await,
            Err(message) => self.fail(&message).await,
        }
        self.state
    }

    /// Discovery through subscription. An `Err` carries the session-fatal
    /// message.
    async fn establish(&mut self) -> Result<Established, String> {
        self.transition(SessionState::Discovering);
        self.status("Scanning").await;

        let peripherals = self
            .central
            .scan(self.config.discovery_timeout())
            .await
            .map_err(|e| {
                warn!("scan failed: {e}");
                "unable to connect".to_string()
            })?;

        let control = find_by_name(&peripherals, &self.config.control_device)
            .ok_or_else(|| "unable to connect".to_string())?;
        let sensor = find_by_name(&peripherals, &self.config.sensor_device)
            .ok_or_else(|| "unable to connect".to_string())?;
        debug!(
            "discovered {:?} and {:?}",
            self.config.control_device, self.config.sensor_device
        );

        self.transition(SessionState::Connecting);
        for peripheral in [&control, &sensor] {
            peripheral.connect().await.map_err(|e| {
                warn!("connect failed: {e}");
                "unable to connect".to_string()
            })?;
        }

        self.transition(SessionState::ResolvingServices);
        self.status("Searching for services").await;
        self.status("Searching for characteristics").await;
        let registry =
            CharacteristicRegistry::resolve(control.as_ref(), sensor.as_ref(), &self.config)
                .await
                .map_err(|e| e.to_string())?;

        let notifications = sensor.subscribe(registry.sensor_char).await.map_err(|e| {
            warn!("subscribe failed: {e}");
            "unable to start notification".to_string()
        })?;

        self.transition(SessionState::Subscribed);
        self.emit(PipelineEvent::Connected(ControlHandle {
            peripheral: control.clone(),
            freq_chars: registry.control_chars,
        }))
        .await;
        self.status("Ready").await;
        info!("session subscribed, streaming");

        Ok(Established {
            control,
            sensor,
            notifications,
        })
    }

    /// Steady-state decode loop until shutdown or end of stream.
    async fn stream(&mut self, mut established: Established) {
        loop {
            tokio::select! {
                _ = self.shutdown.changed() => break,
                payload = established.notifications.recv() => match payload {
                    Some(payload) => self.handle_notification(&payload).await,
                    None => {
                        debug!("notification stream ended");
                        break;
                    }
                },
            }
        }
        self.close(established).await;
    }

    async fn handle_notification(&self, payload: &[u8]) {
        match decode(payload) {
            Ok(sample) => self.emit(PipelineEvent::Sample(sample)).await,
            Err(e) => {
                self.metrics.record_decode_error();
                self.emit(PipelineEvent::Diagnostic(format!("unable to decode: {e}")))
                    .await;
            }
        }
    }

    /// Release the subscription and both peripheral handles.
    async fn close(&mut self, established: Established) {
        if let Err(e) = established
            .sensor
            .unsubscribe(self.config.sensor_char_uuid)
            .await
        {
            debug!("unsubscribe failed: {e}");
        }
        for peripheral in [&established.sensor, &established.control] {
            if let Err(e) = peripheral.disconnect().await {
                debug!("disconnect failed: {e}");
            }
        }
        self.transition(SessionState::Closed);
        info!("session closed");
    }

    async fn fail(&mut self, message: &str) {
        warn!("session failed: {message}");
        self.transition(SessionState::Error {
            message: message.to_string(),
        });
        self.emit(PipelineEvent::SessionError(message.to_string()))
            .await;
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid session transition {} -> {}",
            self.state.name(),
            next.name()
        );
        debug!("session state {} -> {}", self.state.name(), next.name());
        self.state = next;
    }

    async fn status(&self, message: &str) {
        self.emit(PipelineEvent::Status(message.to_string())).await;
    }

    async fn emit(&self, event: PipelineEvent) {
        if self.events.send(event).await.is_err() {
            warn!("coordinator gone, event dropped");
        }
    }
}

fn find_by_name(
    peripherals: &[Arc<dyn BlePeripheral>],
    name: &str,
) -> Option<Arc<dyn BlePeripheral>> {
    peripherals
        .iter()
        .find(|p| p.name().as_deref() == Some(name))
        .cloned()
}
