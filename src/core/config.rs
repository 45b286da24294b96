use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Primary service exposed by both the stimulation and the tremor peripheral.
pub const TREMOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000180c_0000_1000_8000_00805f9b34fb);

/// Tremor sensor notification characteristic.
pub const TREMOR_CHAR_UUID: Uuid = Uuid::from_u128(0x00002a6e_0000_1000_8000_00805f9b34fb);

/// Stimulation parameter characteristics, one per frequency field.
pub const STIMULATION_CHAR_1_UUID: Uuid = Uuid::from_u128(0x00002a6f_0000_1000_8000_00805f9b34fb);
pub const STIMULATION_CHAR_2_UUID: Uuid = Uuid::from_u128(0x00002a70_0000_1000_8000_00805f9b34fb);

/// Pipeline configuration, loadable from a JSON file. Defaults match the
/// deployed device names and UUID layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Advertised name of the stimulation (control) peripheral
    pub control_device: String,

    /// Advertised name of the tremor (sensor) peripheral
    pub sensor_device: String,

    /// Service UUID shared by both peripherals
    pub service_uuid: Uuid,

    /// Control characteristics, written in field order
    pub control_char_uuids: [Uuid; 2],

    /// Sensor notification characteristic
    pub sensor_char_uuid: Uuid,

    /// Bounded discovery scan window in milliseconds
    pub discovery_timeout_ms: u64,

    /// Directory receiving the session-scoped CSV targets
    pub data_dir: PathBuf,

    /// Trained model artifact loaded once at startup
    pub model_path: PathBuf,

    /// Capacity of every inter-worker channel
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            control_device: "MYBLE".to_string(),
            sensor_device: "Arduino".to_string(),
            service_uuid: TREMOR_SERVICE_UUID,
            control_char_uuids: [STIMULATION_CHAR_1_UUID, STIMULATION_CHAR_2_UUID],
            sensor_char_uuid: TREMOR_CHAR_UUID,
            discovery_timeout_ms: 10_000,
            data_dir: PathBuf::from("datafiles"),
            model_path: PathBuf::from("model.json"),
            channel_capacity: 100,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).context("Invalid pipeline configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("Config {} is not valid JSON", path.display()))?;
        Self::from_json(value)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployed_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.control_device, "MYBLE");
        assert_eq!(config.sensor_device, "Arduino");
        assert_eq!(
            config.service_uuid.to_string(),
            "0000180c-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            config.sensor_char_uuid.to_string(),
            "00002a6e-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            config.control_char_uuids[0].to_string(),
            "00002a6f-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            config.control_char_uuids[1].to_string(),
            "00002a70-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = PipelineConfig::from_json(serde_json::json!({
            "sensor_device": "Nano33",
            "discovery_timeout_ms": 2500
        }))
        .unwrap();
        assert_eq!(config.sensor_device, "Nano33");
        assert_eq!(config.discovery_timeout(), Duration::from_millis(2500));
        assert_eq!(config.control_device, "MYBLE");
    }
}
