//! Tiny Tapeout harness FFI functions
//!
//! C ABI exports for the pin-level reset/clear/drive sequences.

use std::os::raw::{c_int, c_uint};

use crate::ffi::MacSimContext;

/// Hold rst_n low for `cycles` edges, then release it
/// Returns 0 on success, -1 on error
#[no_mangle]
pub unsafe extern "C" fn mac_sim_tt_hold_reset(ctx: *mut MacSimContext, cycles: usize) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    match ctx.pins.hold_reset(&mut ctx.mac, cycles) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Pulse clear_acc for one cycle
/// Returns 0 on success, -1 on error
#[no_mangle]
pub unsafe extern "C" fn mac_sim_tt_pulse_clear(ctx: *mut MacSimContext) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    match ctx.pins.pulse_clear(&mut ctx.mac) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Drive one accumulate cycle on the pins.
/// Returns 0 on success and writes the signed output to `output_out`,
/// -1 on error (weight code wider than two bits, or accumulator overflow).
#[no_mangle]
pub unsafe extern "C" fn mac_sim_tt_drive(
    ctx: *mut MacSimContext,
    activation: i8,
    weight_code: c_uint,
    valid: c_int,
    output_out: *mut i8,
) -> c_int {
    if ctx.is_null() {
        return -1;
    }
    let ctx = &mut *ctx;
    let Ok(code) = u8::try_from(weight_code) else {
        return -1;
    };
    match ctx.pins.drive(&mut ctx.mac, activation, code, valid != 0) {
        Ok(out) => {
            if !output_out.is_null() {
                *output_out = out;
            }
            0
        }
        Err(_) => -1,
    }
}

/// Number of clock edges the harness has applied
#[no_mangle]
pub unsafe extern "C" fn mac_sim_tt_cycle_count(ctx: *const MacSimContext) -> u64 {
    if ctx.is_null() {
        return 0;
    }
    (*ctx).pins.cycles
}
