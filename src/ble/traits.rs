use super::types::BleError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Trait implemented by BLE adapters for peripheral discovery
#[async_trait]
pub trait BleCentral: Send + Sync {
    /// Scan for advertising peripherals for at most `timeout`.
    async fn scan(&self, timeout: Duration) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError>;
}

/// Trait implemented by discovered peripherals for connection, notification
/// delivery, and characteristic writes
#[async_trait]
pub trait BlePeripheral: Send + Sync {
    /// Advertised device name, if the advertisement carried one.
    fn name(&self) -> Option<String>;

    /// Open a session and discover services.
    async fn connect(&self) -> Result<(), BleError>;

    async fn disconnect(&self) -> Result<(), BleError>;

    /// Characteristic UUIDs exposed under `service`. Requires a connected
    /// session.
    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, BleError>;

    /// Start notification delivery on `characteristic`. Each received
    /// payload arrives as one owned byte vector; the channel closes when the
    /// peripheral stops notifying or disconnects.
    async fn subscribe(&self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError>;

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<(), BleError>;

    /// Write `payload` to `characteristic` as one write operation.
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<(), BleError>;
}
