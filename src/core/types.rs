use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One decoded telemetry reading: the three ADC channel values from a single
/// sensor notification. Ordered by arrival only; carries no wall-clock field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub channels: [i32; 3],
}

impl Sample {
    pub fn new(ch0: i32, ch1: i32, ch2: i32) -> Self {
        Self {
            channels: [ch0, ch1, ch2],
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.channels[0], self.channels[1], self.channels[2]
        )
    }
}

/// Errors produced when encoding an operator frequency entry
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommandError {
    #[error("frequency entry is not a finite number")]
    NotFinite,
    #[error("frequency entry {0} is out of range")]
    OutOfRange(f64),
}

/// Operator-entered stimulation parameters, already encoded for the wire.
///
/// Each field is the operator's decimal kHz value scaled by 10 and rounded to
/// an integer, so it fits a single unsigned 16-bit characteristic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub freq1: u16,
    pub freq2: u16,
}

impl ControlCommand {
    /// Encode two operator kHz entries into a wire-ready command.
    pub fn from_khz(freq1: f64, freq2: f64) -> Result<Self, CommandError> {
        Ok(Self {
            freq1: encode_khz(freq1)?,
            freq2: encode_khz(freq2)?,
        })
    }

    /// Wire form: one 2-byte little-endian payload per control characteristic.
    pub fn encode(&self) -> [[u8; 2]; 2] {
        [self.freq1.to_le_bytes(), self.freq2.to_le_bytes()]
    }
}

fn encode_khz(value: f64) -> Result<u16, CommandError> {
    if !value.is_finite() {
        return Err(CommandError::NotFinite);
    }
    let scaled = (value * 10.0).round();
    if scaled < 0.0 || scaled > f64::from(u16::MAX) {
        return Err(CommandError::OutOfRange(value));
    }
    Ok(scaled as u16)
}

/// Scores produced by one inference pass, already scaled back to domain
/// units (x100). Length is fixed by the loaded model, opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub scores: Vec<f64>,
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, score) in self.scores.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{score:.2}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_record_form() {
        let sample = Sample::new(12, 34, 56);
        assert_eq!(sample.to_string(), "12,34,56");
    }

    #[test]
    fn test_command_encoding_scales_by_ten() {
        let cmd = ControlCommand::from_khz(12.3, 0.5).unwrap();
        assert_eq!(cmd.freq1, 123);
        assert_eq!(cmd.freq2, 5);
        assert_eq!(cmd.encode(), [[123, 0], [5, 0]]);
    }

    #[test]
    fn test_command_rejects_bad_entries() {
        assert_eq!(
            ControlCommand::from_khz(f64::NAN, 1.0),
            Err(CommandError::NotFinite)
        );
        assert_eq!(
            ControlCommand::from_khz(1.0, -2.0),
            Err(CommandError::OutOfRange(-2.0))
        );
        assert!(ControlCommand::from_khz(1.0, 7000.0).is_err());
    }
}
