use crate::ble::traits::{BleCentral, BlePeripheral};
use crate::ble::types::BleError;
use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// BLE central backed by the first system adapter
pub struct BtleCentral {
    adapter: Adapter,
}

impl BtleCentral {
    pub async fn new() -> Result<Self, BleError> {
        let manager = Manager::new()
            .await
            .map_err(|e| BleError::Adapter(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| BleError::Adapter(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| BleError::Adapter("no bluetooth adapter present".to_string()))?;
        Ok(Self { adapter })
    }
}

#[async_trait]
impl BleCentral for BtleCentral {
    async fn scan(&self, timeout: Duration) -> Result<Vec<Arc<dyn BlePeripheral>>, BleError> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| BleError::Scan(e.to_string()))?;
        tokio::time::sleep(timeout).await;
        if let Err(e) = self.adapter.stop_scan().await {
            warn!("failed to stop scan: {e}");
        }

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| BleError::Scan(e.to_string()))?;

        let mut discovered: Vec<Arc<dyn BlePeripheral>> = Vec::with_capacity(peripherals.len());
        for peripheral in peripherals {
            // Advertised name is only reachable asynchronously, resolve it
            // once here so sessions can match on it synchronously.
            let name = match peripheral.properties().await {
                Ok(Some(props)) => props.local_name,
                Ok(None) => None,
                Err(e) => {
                    debug!("skipping peripheral without properties: {e}");
                    None
                }
            };
            discovered.push(Arc::new(BtlePeripheral { inner: peripheral, name }));
        }
        Ok(discovered)
    }
}

/// One discovered peripheral, name resolved at scan time
pub struct BtlePeripheral {
    inner: Peripheral,
    name: Option<String>,
}

impl BtlePeripheral {
    fn find_characteristic(&self, uuid: Uuid) -> Result<btleplug::api::Characteristic, BleError> {
        self.inner
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(BleError::CharacteristicNotFound(uuid))
    }

    fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.inner.id().to_string())
    }
}

#[async_trait]
impl BlePeripheral for BtlePeripheral {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn connect(&self) -> Result<(), BleError> {
        self.inner
            .connect()
            .await
            .map_err(|_| BleError::Connect(self.display_name()))?;
        self.inner
            .discover_services()
            .await
            .map_err(|_| BleError::Connect(self.display_name()))?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BleError> {
        self.inner
            .disconnect()
            .await
            .map_err(|e| BleError::Transport(e.to_string()))
    }

    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>, BleError> {
        if !self.inner.services().iter().any(|s| s.uuid == service) {
            return Err(BleError::ServiceNotFound(service));
        }
        Ok(self
            .inner
            .characteristics()
            .into_iter()
            .filter(|c| c.service_uuid == service)
            .map(|c| c.uuid)
            .collect())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>, BleError> {
        let target = self.find_characteristic(characteristic)?;
        self.inner
            .subscribe(&target)
            .await
            .map_err(|e| BleError::Subscribe(e.to_string()))?;

        let mut stream = self
            .inner
            .notifications()
            .await
            .map_err(|e| BleError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid != characteristic {
                    continue;
                }
                if tx.send(notification.value).await.is_err() {
                    // Subscriber hung up, stop forwarding.
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn unsubscribe(&self, characteristic: Uuid) -> Result<(), BleError> {
        let target = self.find_characteristic(characteristic)?;
        self.inner
            .unsubscribe(&target)
            .await
            .map_err(|e| BleError::Transport(e.to_string()))
    }

    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<(), BleError> {
        let target = self.find_characteristic(characteristic)?;
        self.inner
            .write(&target, payload, WriteType::WithResponse)
            .await
            .map_err(|e| BleError::Transport(e.to_string()))
    }
}
