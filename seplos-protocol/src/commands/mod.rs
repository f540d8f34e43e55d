//! Data types associated with supported commands

mod telecommand;
mod telemetry;

pub use telecommand::*;
pub use telemetry::*;

#[cfg(test)]
pub(crate) use telecommand::tests::TelecommandBuilder;
#[cfg(test)]
pub(crate) use telemetry::tests::TelemetryBuilder;

/// A response payload that could not be decoded into a record
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecordError {
    /// The payload is shorter than the record layout
    Truncated { expected: usize, actual: usize },
    /// A payload field holds something other than hex digits
    InvalidHexCharacter,
}

impl<T: embedded_io::Error> From<RecordError> for crate::Error<T> {
    fn from(value: RecordError) -> Self {
        match value {
            RecordError::Truncated { expected, actual } => {
                crate::Error::TruncatedRecord { expected, actual }
            }
            RecordError::InvalidHexCharacter => crate::Error::InvalidHexCharacter,
        }
    }
}
