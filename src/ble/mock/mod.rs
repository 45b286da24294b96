//! Scripted BLE transport for tests: peripherals advertise configurable
//! services, record every write, and replay notification payloads pushed by
//! the test.

use crate::ble::traits::{BleCentral, BlePeripheral};
use crate::ble::types::BleError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Central whose scan always returns the configured peripherals
pub struct MockCentral {
    peripherals: Vec<Arc<MockPeripheral>>,
}

impl MockCentral {
    pub fn new(peripherals: Vec<Arc<MockPeripheral>>) -> Self {
        Self { peripherals }
    }

    /// Central that discovers nothing, for exercising discovery failures.
    pub fn empty() -> Self {
        Self {
            peripherals: Vec::new(),
        }
    }
}

#[async_trait]
impl BleCentral for MockCentral {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError> {
        Ok(self
            .peripherals
            .iter()
            .map(|p| p.clone() as Arc<dyn BlePeripheral>)
            .collect())
    }
}

/// Scripted peripheral with injectable failures
pub struct MockPeripheral {
    name: Option<String>,
    services: HashMap<Uuid, Vec<Uuid>>,
    fail_connect: bool,
    fail_subscribe: bool,
    fail_writes: bool,
    connected: AtomicBool,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    notify_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
}

impl MockPeripheral {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            services: HashMap::new(),
            fail_connect: false,
            fail_subscribe: false,
            fail_writes: false,
            connected: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
            notify_tx: Mutex::new(None),
        }
    }

    pub fn with_service(mut self, service: Uuid, characteristics: &[Uuid]) -> Self {
        self.services.insert(service, characteristics.to_vec());
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_subscribe(mut self) -> Self {
        self.fail_subscribe = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Push one notification payload to the current subscriber, if any.
    pub async fn notify(&self, payload: Vec<u8>) {
        let tx = self.notify_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(payload).await;
        }
    }

    /// Drop the notifier end, closing the subscriber's stream.
    pub fn stop_notifying(&self) {
        self.notify_tx.lock().unwrap().take();
    }

    /// Writes recorded so far, in order.
    pub fn written(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn has_characteristic(&self, uuid: Uuid) -> bool {
        self.services.values().any(|chars| chars.contains(&uuid))
    }
}

#[async_trait]
impl BlePeripheral for MockPeripheral {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), BleError> {
        if self.fail_connect {
            return Err(BleError::Connect(
                self.name.clone().unwrap_or_default(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        self.connected.store(false, Ordering::SeqCst);
        self.stop_notifying();
        Ok(())
    }

    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, BleError> {
        self.services
            .get(&service)
            .cloned()
            .ok_or(BleError::ServiceNotFound(service))
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError> {
        if self.fail_subscribe {
            return Err(BleError::Subscribe("notify rejected".to_string()));
        }
        if !self.has_characteristic(characteristic) {
            return Err(BleError::CharacteristicNotFound(characteristic));
        }
        let (tx, rx) = mpsc::channel(64);
        *self.notify_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn unsubscribe(&self, _characteristic: Uuid) -> Result<(), BleError> {
        self.stop_notifying();
        Ok(())
    }

    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<(), BleError> {
        if self.fail_writes {
            return Err(BleError::Transport("write rejected".to_string()));
        }
        if !self.has_characteristic(characteristic) {
            return Err(BleError::CharacteristicNotFound(characteristic));
        }
        self.writes
            .lock()
            .unwrap()
            .push((characteristic, payload.to_vec()));
        Ok(())
    }
}
