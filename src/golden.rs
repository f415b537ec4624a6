//! Golden reference model for lockstep checking
//!
//! The reference keeps an unbounded running sum, so it is independent of the
//! 16-bit register width of the unit under test.

use tracing::{debug, warn};

use crate::core::{CycleInput, TernaryMac, WeightCode, OUTPUT_MAX, OUTPUT_MIN};
use crate::error::{MacError, Result};

/// Unbounded running-sum model of the MAC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceModel {
    sum: i64,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// Output the unit should show for the current sum
    pub fn expected_output(&self) -> i64 {
        self.sum.clamp(i64::from(OUTPUT_MIN), i64::from(OUTPUT_MAX))
    }

    pub fn apply(&mut self, input: &CycleInput) {
        if input.clear {
            self.sum = 0;
            return;
        }
        if !input.valid {
            return;
        }
        let x = i64::from(input.activation);
        match input.weight {
            WeightCode::Add => self.sum += x,
            WeightCode::Sub => self.sum -= x,
            WeightCode::NoOp => {}
        }
    }
}

/// Steps a [`TernaryMac`] and a [`ReferenceModel`] together and compares
/// them after every cycle.
#[derive(Debug, Clone, Default)]
pub struct Checker {
    mac: TernaryMac,
    reference: ReferenceModel,
    cycle: usize,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mac(&self) -> &TernaryMac {
        &self.mac
    }

    pub fn reference(&self) -> &ReferenceModel {
        &self.reference
    }

    /// Number of cycles checked so far
    pub fn cycles(&self) -> usize {
        self.cycle
    }

    /// Run one cycle on both models and return the unit's output
    pub fn step(&mut self, input: CycleInput) -> Result<i8> {
        let cycle = self.cycle;
        let output = self.mac.step(input)?;
        self.reference.apply(&input);
        self.cycle += 1;

        let expected_acc = self.reference.sum();
        let actual_acc = i64::from(self.mac.accumulator());
        if actual_acc != expected_acc {
            warn!(cycle, expected = expected_acc, actual = actual_acc, "accumulator diverged");
            return Err(MacError::Mismatch { cycle, expected: expected_acc, actual: actual_acc });
        }

        let expected_out = self.reference.expected_output();
        if i64::from(output) != expected_out {
            warn!(cycle, expected = expected_out, actual = output, "output diverged");
            return Err(MacError::Mismatch {
                cycle,
                expected: expected_out,
                actual: i64::from(output),
            });
        }

        Ok(output)
    }

    /// Check a whole sequence, stopping at the first divergence
    pub fn run<I>(&mut self, inputs: I) -> Result<Vec<i8>>
    where
        I: IntoIterator<Item = CycleInput>,
    {
        let outputs = inputs
            .into_iter()
            .map(|input| self.step(input))
            .collect::<Result<Vec<_>>>()?;
        debug!(cycles = self.cycle, sum = self.reference.sum(), "lockstep check passed");
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_skips_gated_and_noop_cycles() {
        let mut model = ReferenceModel::new();
        model.apply(&CycleInput::accumulate(50, WeightCode::Add));
        model.apply(&CycleInput { valid: false, ..CycleInput::accumulate(50, WeightCode::Add) });
        model.apply(&CycleInput::accumulate(50, WeightCode::NoOp));
        model.apply(&CycleInput::accumulate(-20, WeightCode::Sub));
        assert_eq!(model.sum(), 70);
        model.apply(&CycleInput::clear());
        assert_eq!(model.sum(), 0);
    }

    #[test]
    fn test_reference_output_clamps() {
        let mut model = ReferenceModel::new();
        for _ in 0..5 {
            model.apply(&CycleInput::accumulate(127, WeightCode::Add));
        }
        assert_eq!(model.sum(), 635);
        assert_eq!(model.expected_output(), 127);
    }

    #[test]
    fn test_checker_runs_clean_sequence() {
        let mut checker = Checker::new();
        let inputs = vec![
            CycleInput::clear(),
            CycleInput::accumulate(127, WeightCode::Add),
            CycleInput::accumulate(127, WeightCode::Add),
            CycleInput::accumulate(-128, WeightCode::Add),
            CycleInput::idle(),
        ];
        let outputs = checker.run(inputs).unwrap();
        assert_eq!(outputs, vec![0, 127, 127, 126, 126]);
        assert_eq!(checker.cycles(), 5);
        assert_eq!(checker.mac().accumulator(), 126);
    }

    #[test]
    fn test_checker_propagates_overflow() {
        let mut checker = Checker::new();
        let inputs = std::iter::repeat(CycleInput::accumulate(-128, WeightCode::Add)).take(257);
        let err = checker.run(inputs).unwrap_err();
        assert!(matches!(err, MacError::AccumulatorOverflow { accumulator: -32768, .. }));
        assert_eq!(checker.cycles(), 256);
    }
}
