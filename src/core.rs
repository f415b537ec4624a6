//! Core behavioral model of the streaming ternary MAC
//!
//! This is the cycle-level state machine without any pin or harness code.
//! One call to [`TernaryMac::step`] models one rising clock edge:
//! clear, then valid-gated accumulate, then the saturated output is derived
//! from the updated accumulator.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::{MacError, Result};

/// Lowest value visible on the 8-bit output
pub const OUTPUT_MIN: i16 = i8::MIN as i16;
/// Highest value visible on the 8-bit output
pub const OUTPUT_MAX: i16 = i8::MAX as i16;

// ============================================================================
// Weight encoding
// ============================================================================

/// Ternary weight applied to the activation for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeightCode {
    /// Weight 0: accumulator holds
    #[default]
    NoOp,
    /// Weight +1: activation is added
    Add,
    /// Weight -1: activation is subtracted
    Sub,
}

impl WeightCode {
    pub const CODE_NOP: u8 = 0b00;
    pub const CODE_ADD: u8 = 0b01;
    pub const CODE_SUB: u8 = 0b10;
    /// Reserved encoding, resolved to a hold like `CODE_NOP`
    pub const CODE_RESERVED: u8 = 0b11;

    /// Decode the low two bits of a bus value. Upper bits are ignored.
    #[inline(always)]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            Self::CODE_ADD => WeightCode::Add,
            Self::CODE_SUB => WeightCode::Sub,
            _ => WeightCode::NoOp,
        }
    }

    /// Decode a standalone 2-bit code, rejecting anything wider
    pub fn decode(code: u8) -> Result<Self> {
        if code > Self::CODE_RESERVED {
            return Err(MacError::InvalidWeightCode(u64::from(code)));
        }
        Ok(Self::from_bits(code))
    }

    /// Canonical 2-bit encoding (never produces the reserved code)
    pub fn code(self) -> u8 {
        match self {
            WeightCode::NoOp => Self::CODE_NOP,
            WeightCode::Add => Self::CODE_ADD,
            WeightCode::Sub => Self::CODE_SUB,
        }
    }

    /// Signed weight value in {-1, 0, +1}
    pub fn weight(self) -> i8 {
        match self {
            WeightCode::NoOp => 0,
            WeightCode::Add => 1,
            WeightCode::Sub => -1,
        }
    }
}

impl fmt::Display for WeightCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightCode::NoOp => write!(f, "nop"),
            WeightCode::Add => write!(f, "+"),
            WeightCode::Sub => write!(f, "-"),
        }
    }
}

// ============================================================================
// Cycle inputs
// ============================================================================

/// Everything the driver presents for one clock cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleInput {
    pub activation: i8,
    pub weight: WeightCode,
    pub valid: bool,
    pub clear: bool,
}

impl CycleInput {
    /// Valid accumulate cycle
    pub fn accumulate(activation: i8, weight: WeightCode) -> Self {
        Self { activation, weight, valid: true, clear: false }
    }

    /// Clear cycle; the remaining fields are don't-cares
    pub fn clear() -> Self {
        Self { clear: true, ..Self::default() }
    }

    /// Idle cycle with valid deasserted
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Saturating cast of the accumulator onto the 8-bit output
#[inline(always)]
pub fn saturate(accumulator: i16) -> i8 {
    accumulator.clamp(OUTPUT_MIN, OUTPUT_MAX) as i8
}

// ============================================================================
// MAC unit
// ============================================================================

/// Streaming ternary multiply-accumulate unit.
///
/// The accumulator is the only state. The output is recomputed from it on
/// every read, so saturation has no memory: once the accumulator comes back
/// inside [-128, 127] the output follows it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TernaryMac {
    accumulator: i16,
}

impl TernaryMac {
    /// Power-on state, equivalent to a clear before the first cycle
    pub fn new() -> Self {
        Self { accumulator: 0 }
    }

    pub fn accumulator(&self) -> i16 {
        self.accumulator
    }

    /// Current saturated output
    #[inline(always)]
    pub fn output(&self) -> i8 {
        saturate(self.accumulator)
    }

    pub fn reset(&mut self) {
        debug!(accumulator = self.accumulator, "mac reset");
        self.accumulator = 0;
    }

    /// Combinational next-state function.
    ///
    /// Priority is clear, then valid-gated accumulate, then hold. An update
    /// that would leave the `i16` range is reported instead of wrapping.
    pub fn next_accumulator(&self, input: &CycleInput) -> Result<i16> {
        if input.clear {
            return Ok(0);
        }
        if !input.valid {
            return Ok(self.accumulator);
        }

        let x = i16::from(input.activation);
        let next = match input.weight {
            WeightCode::NoOp => Some(self.accumulator),
            WeightCode::Add => self.accumulator.checked_add(x),
            WeightCode::Sub => self.accumulator.checked_sub(x),
        };

        next.ok_or(MacError::AccumulatorOverflow {
            accumulator: self.accumulator,
            activation: input.activation,
            weight: input.weight,
        })
    }

    /// Advance one clock cycle and return the post-update output.
    ///
    /// On error the accumulator is left untouched.
    pub fn step(&mut self, input: CycleInput) -> Result<i8> {
        let next = match self.next_accumulator(&input) {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "mac step rejected");
                return Err(e);
            }
        };

        if input.clear {
            debug!(previous = self.accumulator, "accumulator cleared");
        }
        self.accumulator = next;

        let output = self.output();
        trace!(
            activation = input.activation,
            weight = %input.weight,
            valid = input.valid,
            clear = input.clear,
            accumulator = self.accumulator,
            output,
            "mac step"
        );
        Ok(output)
    }
}
