use super::traits::BlePeripheral;
use super::types::BleError;
use crate::core::PipelineConfig;
use uuid::Uuid;

/// Characteristics resolved once during service resolution.
///
/// Construction fails closed: either every required UUID is present on its
/// peripheral or the session does not advance past `ResolvingServices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicRegistry {
    /// Stimulation parameter characteristics, in field order
    pub control_chars: [Uuid; 2],
    /// Tremor notification characteristic
    pub sensor_char: Uuid,
}

impl CharacteristicRegistry {
    pub async fn resolve(
        control: &dyn BlePeripheral,
        sensor: &dyn BlePeripheral,
        config: &PipelineConfig,
    ) -> Result<Self, BleError> {
        let control_chars = control.characteristics(config.service_uuid).await?;
        for required in &config.control_char_uuids {
            if !control_chars.contains(required) {
                return Err(BleError::CharacteristicNotFound(*required));
            }
        }

        let sensor_chars = sensor.characteristics(config.service_uuid).await?;
        if !sensor_chars.contains(&config.sensor_char_uuid) {
            return Err(BleError::CharacteristicNotFound(config.sensor_char_uuid));
        }

        Ok(Self {
            control_chars: config.control_char_uuids,
            sensor_char: config.sensor_char_uuid,
        })
    }
}
