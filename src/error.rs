//! Error types for the ternary MAC simulator

use thiserror::Error;

use crate::core::WeightCode;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, MacError>;

/// Caller-side precondition violations and harness failures.
///
/// A legal `step` never fails; every variant here is raised before the
/// accumulator is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacError {
    /// Weight code does not fit in two bits
    #[error("Invalid weight code: {0} (expected 0..=3)")]
    InvalidWeightCode(u64),

    /// Activation outside the signed 8-bit range
    #[error("Activation out of range: {0} (expected -128..=127)")]
    ActivationOutOfRange(i64),

    /// Update would leave the 16-bit accumulator range
    #[error("Accumulator overflow: {accumulator} {weight} {activation} leaves i16 range")]
    AccumulatorOverflow {
        accumulator: i16,
        activation: i8,
        weight: WeightCode,
    },

    /// Pin name not known to the harness
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    /// Stimulus program could not be parsed
    #[error("Failed to parse stimulus JSON: {0}")]
    Parse(String),

    /// Unit diverged from the reference model
    #[error("Mismatch at cycle {cycle}: expected {expected}, got {actual}")]
    Mismatch {
        cycle: usize,
        expected: i64,
        actual: i64,
    },
}

impl From<serde_json::Error> for MacError {
    fn from(err: serde_json::Error) -> Self {
        MacError::Parse(err.to_string())
    }
}
