use crate::core::Sample;
use thiserror::Error;

/// Field separator used by the sensor firmware.
const FIELD_DELIMITER: char = ',';

/// Errors produced while decoding a sensor notification payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    Encoding,
    #[error("field {0:?} is not an integer")]
    Format(String),
    #[error("expected 3 fields, got {0}")]
    Length(usize),
}

/// Decode one raw notification payload into a [`Sample`].
///
/// The firmware sends UTF-8 text, comma-separated, one integer per channel.
/// Fields may carry embedded NUL padding which is stripped before parsing.
/// Pure function; a failed decode drops only the offending notification.
pub fn decode(payload: &[u8]) -> Result<Sample, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::Encoding)?;

    let mut values = Vec::with_capacity(3);
    for field in text.split(FIELD_DELIMITER) {
        let cleaned: String = field.chars().filter(|c| *c != '\0').collect();
        let value = cleaned
            .trim()
            .parse::<i32>()
            .map_err(|_| DecodeError::Format(field.to_string()))?;
        values.push(value);
    }

    if values.len() != 3 {
        return Err(DecodeError::Length(values.len()));
    }

    Ok(Sample::new(values[0], values[1], values[2]))
}
