//! Core C ABI function exports for the MAC simulator
//!
//! These functions are called via Fiddle/ctypes from a host-language testbench.
//! All functions use C-compatible types and follow a consistent naming convention.
//!
//! Pin-harness FFI functions are in extensions/tiny_tapeout/ffi.rs.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_short, c_uint, c_ulong};
use std::ptr;
use std::slice;

use tracing::warn;

use crate::core::{CycleInput, TernaryMac, WeightCode};
use crate::error::{MacError, Result};
use crate::extensions::tiny_tapeout::{TinyTapeoutExtension, INPUT_PINS, OUTPUT_PINS};
use crate::stimulus::Program;

// ============================================================================
// Simulator Context
// ============================================================================

/// Opaque simulator context passed to all FFI functions
#[derive(Default)]
pub struct MacSimContext {
    pub mac: TernaryMac,
    pub pins: TinyTapeoutExtension,
}

impl MacSimContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed step from untyped host values; rejects out-of-range arguments
    /// before touching the accumulator.
    pub fn step_raw(
        &mut self,
        activation: i64,
        weight_code: u64,
        valid: bool,
        clear: bool,
    ) -> Result<i8> {
        let activation = i8::try_from(activation)
            .map_err(|_| MacError::ActivationOutOfRange(activation))?;
        let code = u8::try_from(weight_code)
            .map_err(|_| MacError::InvalidWeightCode(weight_code))?;
        let weight = WeightCode::decode(code)?;
        self.mac.step(CycleInput { activation, weight, valid, clear })
    }

    /// Run a JSON stimulus program and return the JSON report
    pub fn run_program_json(&mut self, json: &str) -> Result<String> {
        let program = Program::from_json(json)?;
        program.run(&mut self.mac)?.to_json()
    }
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

unsafe fn write_error(error_out: *mut *mut c_char, err: &MacError) {
    warn!(error = %err, "ffi call failed");
    if !error_out.is_null() {
        *error_out = into_c_string(err.to_string());
    }
}

unsafe fn signal_name<'a>(name: *const c_char) -> Option<&'a str> {
    if name.is_null() {
        return None;
    }
    CStr::from_ptr(name).to_str().ok()
}

// ============================================================================
// Core FFI Functions
// ============================================================================

/// Create a new MAC simulator in its power-on state
#[no_mangle]
pub extern "C" fn mac_sim_create() -> *mut MacSimContext {
    Box::into_raw(Box::new(MacSimContext::new()))
}

/// Destroy a MAC simulator
#[no_mangle]
pub unsafe extern "C" fn mac_sim_destroy(ctx: *mut MacSimContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Free an error string written to an `error_out` parameter
#[no_mangle]
pub unsafe extern "C" fn mac_sim_free_error(error: *mut c_char) {
    if !error.is_null() {
        drop(CString::from_raw(error));
    }
}

/// Free a string returned by mac_sim functions
#[no_mangle]
pub unsafe extern "C" fn mac_sim_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Run one cycle with typed inputs.
/// Returns 0 on success and writes the output to `output_out`,
/// -1 on error (range violation or accumulator overflow; state unchanged).
#[no_mangle]
pub unsafe extern "C" fn mac_sim_step(
    ctx: *mut MacSimContext,
    activation: c_int,
    weight_code: c_uint,
    valid: c_int,
    clear: c_int,
    output_out: *mut i8,
) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    match ctx.step_raw(activation as i64, weight_code as u64, valid != 0, clear != 0) {
        Ok(out) => {
            if !output_out.is_null() {
                *output_out = out;
            }
            0
        }
        Err(_) => -1,
    }
}

/// Poke a pin value
/// Returns 0 on success, -1 on error (unknown signal)
#[no_mangle]
pub unsafe extern "C" fn mac_sim_poke(
    ctx: *mut MacSimContext,
    name: *const c_char,
    value: c_ulong,
) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    let Some(name) = signal_name(name) else {
        return -1;
    };

    match ctx.pins.poke(name, value as u64) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Peek a pin value
/// Returns the value, or 0 on error (check mac_sim_has_signal)
#[no_mangle]
pub unsafe extern "C" fn mac_sim_peek(
    ctx: *const MacSimContext,
    name: *const c_char,
) -> c_ulong {
    if ctx.is_null() {
        return 0;
    }
    let ctx = &*ctx;
    let Some(name) = signal_name(name) else {
        return 0;
    };

    ctx.pins.peek(&ctx.mac, name).unwrap_or(0) as c_ulong
}

/// Check if a pin exists
#[no_mangle]
pub unsafe extern "C" fn mac_sim_has_signal(name: *const c_char) -> c_int {
    match signal_name(name) {
        Some(name) if TinyTapeoutExtension::has_signal(name) => 1,
        _ => 0,
    }
}

/// One clock edge with the currently poked pins
/// Returns 0 on success, -1 on error
#[no_mangle]
pub unsafe extern "C" fn mac_sim_tick(ctx: *mut MacSimContext) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    match ctx.pins.tick(&mut ctx.mac) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Run cycles with the pins held, returns number of cycles run
#[no_mangle]
pub unsafe extern "C" fn mac_sim_run_cycles(ctx: *mut MacSimContext, n: usize) -> usize {
    if ctx.is_null() {
        return 0;
    }
    let ctx = &mut *ctx;
    let mut done = 0;
    for _ in 0..n {
        if ctx.pins.tick(&mut ctx.mac).is_err() {
            break;
        }
        done += 1;
    }
    done
}

/// Return the accumulator to its power-on value
#[no_mangle]
pub unsafe extern "C" fn mac_sim_reset(ctx: *mut MacSimContext) {
    if !ctx.is_null() {
        (*ctx).mac.reset();
    }
}

/// Get the raw 16-bit accumulator
#[no_mangle]
pub unsafe extern "C" fn mac_sim_accumulator(ctx: *const MacSimContext) -> c_short {
    if ctx.is_null() {
        return 0;
    }
    (*ctx).mac.accumulator()
}

/// Get the saturated output
#[no_mangle]
pub unsafe extern "C" fn mac_sim_output(ctx: *const MacSimContext) -> i8 {
    if ctx.is_null() {
        return 0;
    }
    (*ctx).mac.output()
}

/// Get input pin names (comma-separated, caller must free)
#[no_mangle]
pub extern "C" fn mac_sim_input_names() -> *mut c_char {
    into_c_string(INPUT_PINS.join(","))
}

/// Get output pin names (comma-separated, caller must free)
#[no_mangle]
pub extern "C" fn mac_sim_output_names() -> *mut c_char {
    into_c_string(OUTPUT_PINS.join(","))
}

/// Run a JSON stimulus program against the simulator state.
/// Returns the JSON run report (caller must free), or null on error with the
/// message written to error_out if provided.
#[no_mangle]
pub unsafe extern "C" fn mac_sim_run_program(
    ctx: *mut MacSimContext,
    json: *const c_char,
    json_len: usize,
    error_out: *mut *mut c_char,
) -> *mut c_char {
    if ctx.is_null() || json.is_null() {
        return ptr::null_mut();
    }
    let ctx = &mut *ctx;
    let json_slice = slice::from_raw_parts(json as *const u8, json_len);
    let json_str = match std::str::from_utf8(json_slice) {
        Ok(s) => s,
        Err(e) => {
            write_error(error_out, &MacError::Parse(format!("Invalid UTF-8 in JSON: {}", e)));
            return ptr::null_mut();
        }
    };

    match ctx.run_program_json(json_str) {
        Ok(report) => into_c_string(report),
        Err(e) => {
            write_error(error_out, &e);
            ptr::null_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_raw_rejects_bad_arguments() {
        let mut ctx = MacSimContext::new();
        ctx.step_raw(100, 1, true, false).unwrap();
        assert_eq!(ctx.step_raw(128, 1, true, false), Err(MacError::ActivationOutOfRange(128)));
        assert_eq!(ctx.step_raw(-129, 2, true, false), Err(MacError::ActivationOutOfRange(-129)));
        assert_eq!(ctx.step_raw(1, 4, true, false), Err(MacError::InvalidWeightCode(4)));
        let err = ctx.step_raw(1, 1000, true, false).unwrap_err();
        assert_eq!(err, MacError::InvalidWeightCode(1000));
        assert!(err.to_string().contains("1000"));
        assert_eq!(ctx.mac.accumulator(), 100);
    }

    #[test]
    fn test_run_program_json() {
        let mut ctx = MacSimContext::new();
        let json = r#"{ "name": "p", "cycles": [ { "activation": 7, "weight_code": 1 } ] }"#;
        let report = ctx.run_program_json(json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["outputs"], serde_json::json!([7]));
        assert_eq!(value["final_accumulator"], 7);
    }
}
