//! Streaming ternary MAC - cycle-level behavioral simulator
//!
//! This is a pure Rust library with C ABI exports. Host-language testbenches
//! bind to it via Fiddle/ctypes.
//!
//! The module is organized as:
//! - core.rs: the MAC state machine and saturation arithmetic
//! - golden.rs: unbounded reference model and lockstep checker
//! - stimulus.rs: JSON stimulus programs and run reports
//! - extensions/: pin-level harnesses
//!   - tiny_tapeout/: packed `ui_in`/`uio_in`/`uo_out` interface
//! - ffi.rs: Core C ABI function exports

pub mod core;
pub mod error;
pub mod extensions;
mod ffi;
pub mod golden;
pub mod stimulus;

pub use crate::core::{saturate, CycleInput, TernaryMac, WeightCode};
pub use error::{MacError, Result};
pub use extensions::TinyTapeoutExtension;
pub use golden::{Checker, ReferenceModel};
pub use stimulus::{CycleDef, Mismatch, Program, RunReport};

// Re-export FFI functions at crate root for easier linking
pub use ffi::*;
