use super::traits::BlePeripheral;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the BLE transport layer
#[derive(Debug, Error)]
pub enum BleError {
    #[error("bluetooth adapter unavailable: {0}")]
    Adapter(String),
    #[error("scan failed: {0}")]
    Scan(String),
    #[error("device {0:?} not found")]
    DeviceNotFound(String),
    #[error("unable to connect to {0:?}")]
    Connect(String),
    #[error("service {0} not found")]
    ServiceNotFound(Uuid),
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),
    #[error("unable to start notification: {0}")]
    Subscribe(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Connected stimulation peripheral plus its two resolved control
/// characteristics. Published to the control writer exactly once, after
/// service resolution succeeds.
#[derive(Clone)]
pub struct ControlHandle {
    pub peripheral: Arc<dyn BlePeripheral>,
    pub freq_chars: [Uuid; 2],
}

impl fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHandle")
            .field("peripheral", &self.peripheral.name())
            .field("freq_chars", &self.freq_chars)
            .finish()
    }
}
