//! Tiny Tapeout pin harness for the ternary MAC
//!
//! Drives the unit through the packed 8-bit pin interface of the taped-out
//! design: activation on `ui_in`, control on `uio_in`, saturated result on
//! `uo_out`, active-low reset on `rst_n`.

mod ffi;
pub use ffi::*;

use tracing::debug;

use crate::core::{CycleInput, TernaryMac, WeightCode};
use crate::error::{MacError, Result};

/// `uio_in[1:0]`: weight code
pub const UIO_WEIGHT_MASK: u8 = 0b0000_0011;
/// `uio_in[2]`: valid strobe
pub const UIO_VALID: u8 = 1 << 2;
/// `uio_in[3]`: clear_acc
pub const UIO_CLEAR: u8 = 1 << 3;

/// Input pins, in the order the harness lists them
pub const INPUT_PINS: [&str; 3] = ["ui_in", "uio_in", "rst_n"];
/// Output pins
pub const OUTPUT_PINS: [&str; 1] = ["uo_out"];

/// Unpack the pin bus into typed cycle inputs. `uio_in[7:4]` is unused.
pub fn decode_pins(ui_in: u8, uio_in: u8) -> CycleInput {
    CycleInput {
        activation: ui_in as i8,
        weight: WeightCode::from_bits(uio_in & UIO_WEIGHT_MASK),
        valid: uio_in & UIO_VALID != 0,
        clear: uio_in & UIO_CLEAR != 0,
    }
}

/// Pack typed cycle inputs onto `(ui_in, uio_in)`
pub fn encode_pins(input: &CycleInput) -> (u8, u8) {
    let mut uio_in = input.weight.code();
    if input.valid {
        uio_in |= UIO_VALID;
    }
    if input.clear {
        uio_in |= UIO_CLEAR;
    }
    (input.activation as u8, uio_in)
}

/// Pin-level state of the harness
pub struct TinyTapeoutExtension {
    pub ui_in: u8,
    pub uio_in: u8,
    /// Active-low reset; `false` holds the accumulator at zero
    pub rst_n: bool,
    /// Rising edges seen since creation
    pub cycles: u64,
}

impl Default for TinyTapeoutExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl TinyTapeoutExtension {
    pub fn new() -> Self {
        Self { ui_in: 0, uio_in: 0, rst_n: true, cycles: 0 }
    }

    /// Check whether a pin name belongs to this harness
    pub fn has_signal(name: &str) -> bool {
        INPUT_PINS.contains(&name) || OUTPUT_PINS.contains(&name)
    }

    /// Drive an input pin. Values are truncated to the pin width.
    pub fn poke(&mut self, name: &str, value: u64) -> Result<()> {
        match name {
            "ui_in" => self.ui_in = (value & 0xFF) as u8,
            "uio_in" => self.uio_in = (value & 0xFF) as u8,
            "rst_n" => self.rst_n = value & 1 != 0,
            _ => return Err(MacError::UnknownSignal(name.to_string())),
        }
        Ok(())
    }

    /// Sample a pin; `uo_out` reflects the last completed cycle
    pub fn peek(&self, mac: &TernaryMac, name: &str) -> Result<u64> {
        match name {
            "ui_in" => Ok(self.ui_in as u64),
            "uio_in" => Ok(self.uio_in as u64),
            "rst_n" => Ok(self.rst_n as u64),
            "uo_out" => Ok(mac.output() as u8 as u64),
            _ => Err(MacError::UnknownSignal(name.to_string())),
        }
    }

    /// One rising clock edge with the currently driven pins
    pub fn tick(&mut self, mac: &mut TernaryMac) -> Result<u8> {
        if !self.rst_n {
            mac.reset();
        } else {
            mac.step(decode_pins(self.ui_in, self.uio_in))?;
        }
        self.cycles += 1;
        Ok(mac.output() as u8)
    }

    /// Run `n` cycles with the pins held. Returns the cycles completed.
    pub fn run_cycles(&mut self, mac: &mut TernaryMac, n: usize) -> Result<usize> {
        for _ in 0..n {
            self.tick(mac)?;
        }
        Ok(n)
    }

    /// Hold `rst_n` low for `cycles` edges, then release it
    pub fn hold_reset(&mut self, mac: &mut TernaryMac, cycles: usize) -> Result<()> {
        debug!(cycles, "holding reset");
        self.rst_n = false;
        self.run_cycles(mac, cycles)?;
        self.rst_n = true;
        Ok(())
    }

    /// Assert clear_acc for one cycle, then drop all control lines
    pub fn pulse_clear(&mut self, mac: &mut TernaryMac) -> Result<u8> {
        self.uio_in = UIO_CLEAR;
        let out = self.tick(mac)?;
        self.uio_in = 0;
        Ok(out)
    }

    /// Drive one accumulate cycle and return the signed output
    pub fn drive(
        &mut self,
        mac: &mut TernaryMac,
        activation: i8,
        weight_code: u8,
        valid: bool,
    ) -> Result<i8> {
        WeightCode::decode(weight_code)?;
        self.ui_in = activation as u8;
        self.uio_in = weight_code | if valid { UIO_VALID } else { 0 };
        Ok(self.tick(mac)? as i8)
    }
}
