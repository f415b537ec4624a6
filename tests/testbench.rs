//! Pin-level replay of the tapeout verification suite
//!
//! Same sequences the hardware testbench drives: reset, clear pulse, then
//! either a random stress run or targeted saturation vectors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ternary_mac::extensions::tiny_tapeout::UIO_CLEAR;
use ternary_mac::{Checker, Program, TernaryMac, TinyTapeoutExtension};

fn expected(acc: i64) -> i8 {
    acc.clamp(-128, 127) as i8
}

/// Reset for 10 cycles, pulse clear_acc, then one idle cycle
fn bring_up() -> (TernaryMac, TinyTapeoutExtension) {
    let mut mac = TernaryMac::new();
    let mut pins = TinyTapeoutExtension::new();
    pins.hold_reset(&mut mac, 10).unwrap();
    pins.pulse_clear(&mut mac).unwrap();
    pins.tick(&mut mac).unwrap();
    assert_eq!(pins.cycles, 12);
    (mac, pins)
}

#[test]
fn test_ternary_mac_random_stress() {
    let (mut mac, mut pins) = bring_up();
    let mut rng = StdRng::seed_from_u64(0x7e57);
    let mut acc: i64 = 0;

    for cycle in 0..100 {
        let x: i8 = rng.gen_range(-128..=127);
        let w: u8 = rng.gen_range(0..=2);
        let actual = pins.drive(&mut mac, x, w, true).unwrap();

        match w {
            1 => acc += x as i64,
            2 => acc -= x as i64,
            _ => {}
        }
        assert_eq!(actual, expected(acc), "cycle {cycle}: x={x} w={w} acc={acc}");
        assert_eq!(mac.accumulator() as i64, acc);
    }
}

#[test]
fn test_saturation_clamp() {
    let (mut mac, mut pins) = bring_up();

    // Part A: positive overflow
    let mut acc: i64 = 0;
    for _ in 0..5 {
        let actual = pins.drive(&mut mac, 127, 1, true).unwrap();
        acc += 127;
        assert_eq!(actual, expected(acc));
    }
    assert_eq!(acc, 635);
    assert_eq!(mac.accumulator(), 635);
    assert_eq!(pins.peek(&mac, "uo_out").unwrap() as u8 as i8, 127);

    // Part B: clear, then negative overflow
    pins.pulse_clear(&mut mac).unwrap();
    pins.tick(&mut mac).unwrap();
    acc = 0;
    for _ in 0..5 {
        let actual = pins.drive(&mut mac, 127, 2, true).unwrap();
        acc -= 127;
        assert_eq!(actual, expected(acc));
    }
    assert_eq!(mac.accumulator(), -635);
    assert_eq!(pins.peek(&mac, "uo_out").unwrap() as u8 as i8, -128);

    // Part C: clear after saturation
    pins.uio_in = UIO_CLEAR;
    pins.tick(&mut mac).unwrap();
    pins.uio_in = 0;
    assert_eq!(pins.peek(&mac, "uo_out").unwrap(), 0);

    // Part D: weight 0 and the reserved weight 3 both hold
    assert_eq!(pins.drive(&mut mac, 42, 1, true).unwrap(), 42);
    for _ in 0..3 {
        assert_eq!(pins.drive(&mut mac, 100, 0, true).unwrap(), 42);
    }
    assert_eq!(pins.drive(&mut mac, 100, 3, true).unwrap(), 42);

    // Part E: valid low gates accumulation
    assert_eq!(pins.drive(&mut mac, 100, 1, false).unwrap(), 42);
    assert_eq!(mac.accumulator(), 42);
}

#[test]
fn test_recovery_needs_compensation_or_clear() {
    let (mut mac, mut pins) = bring_up();
    for _ in 0..5 {
        pins.drive(&mut mac, 127, 1, true).unwrap();
    }
    // 635 - 4*127 = 127: back at the boundary from above
    for _ in 0..3 {
        assert_eq!(pins.drive(&mut mac, 127, 2, true).unwrap(), 127);
    }
    assert_eq!(pins.drive(&mut mac, 127, 2, true).unwrap(), 127);
    assert_eq!(mac.accumulator(), 127);
    assert_eq!(pins.drive(&mut mac, 1, 2, true).unwrap(), 126);
}

#[test]
fn test_drive_rejects_wide_weight_code() {
    let (mut mac, mut pins) = bring_up();
    assert!(pins.drive(&mut mac, 1, 4, true).is_err());
    assert_eq!(mac.accumulator(), 0);
    assert_eq!(pins.cycles, 12);
}

#[test]
fn test_random_program_against_reference() {
    let mut rng = StdRng::seed_from_u64(0x7e57);
    let program = Program::random(&mut rng, 100);

    let mut checker = Checker::new();
    let outputs = checker.run(program.inputs().unwrap()).unwrap();
    assert_eq!(checker.cycles(), 101);

    let mut mac = TernaryMac::new();
    let report = program.run(&mut mac).unwrap();
    assert!(report.passed());
    assert_eq!(report.outputs, outputs);
    assert_eq!(report.final_accumulator as i64, checker.reference().sum());
    assert_eq!(mac.accumulator(), checker.mac().accumulator());
}
