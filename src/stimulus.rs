//! Stimulus programs: JSON-described cycle sequences and their run reports

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{CycleInput, TernaryMac, WeightCode};
use crate::error::Result;

fn default_valid() -> bool {
    true
}

/// One cycle as written in a stimulus document.
///
/// `weight_code` keeps the raw 2-bit bus encoding so the reserved code 3 can
/// be driven exactly like the hardware sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDef {
    #[serde(default)]
    pub activation: i8,
    #[serde(default)]
    pub weight_code: u8,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub clear: bool,
    /// Output the driver expects after this cycle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<i8>,
}

impl Default for CycleDef {
    fn default() -> Self {
        Self { activation: 0, weight_code: 0, valid: default_valid(), clear: false, expect: None }
    }
}

impl CycleDef {
    pub fn to_input(&self) -> Result<CycleInput> {
        Ok(CycleInput {
            activation: self.activation,
            weight: WeightCode::decode(self.weight_code)?,
            valid: self.valid,
            clear: self.clear,
        })
    }
}

/// Named sequence of cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub name: String,
    pub cycles: Vec<CycleDef>,
}

/// Output that disagreed with a cycle's `expect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub cycle: usize,
    pub expected: i8,
    pub actual: i8,
}

/// Result of running a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub outputs: Vec<i8>,
    pub final_accumulator: i16,
    pub mismatches: Vec<Mismatch>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Program {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Random stress program: a leading clear, then `cycles` valid cycles
    /// with uniform activations and weight codes drawn from {0, 1, 2}.
    pub fn random<R: Rng>(rng: &mut R, cycles: usize) -> Self {
        let mut defs = Vec::with_capacity(cycles + 1);
        defs.push(CycleDef { valid: false, clear: true, ..CycleDef::default() });
        for _ in 0..cycles {
            defs.push(CycleDef {
                activation: rng.gen_range(i8::MIN..=i8::MAX),
                weight_code: rng.gen_range(0..=2),
                valid: true,
                clear: false,
                expect: None,
            });
        }
        Self { name: format!("random_{}", cycles), cycles: defs }
    }

    /// Decode every cycle up front so a bad weight code is rejected before
    /// the unit sees any input.
    pub fn inputs(&self) -> Result<Vec<CycleInput>> {
        self.cycles.iter().map(CycleDef::to_input).collect()
    }

    /// Drive the program through `mac`, continuing from its current state.
    ///
    /// The program runs on a scratch copy that is committed only when every
    /// cycle succeeds, so a rejected program leaves `mac` untouched.
    pub fn run(&self, mac: &mut TernaryMac) -> Result<RunReport> {
        let inputs = self.inputs()?;
        let mut scratch = mac.clone();
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut mismatches = Vec::new();

        for (cycle, (input, def)) in inputs.into_iter().zip(&self.cycles).enumerate() {
            let actual = scratch.step(input)?;
            outputs.push(actual);
            if let Some(expected) = def.expect {
                if expected != actual {
                    warn!(program = %self.name, cycle, expected, actual, "unexpected output");
                    mismatches.push(Mismatch { cycle, expected, actual });
                }
            }
        }

        *mac = scratch;
        info!(
            program = %self.name,
            cycles = outputs.len(),
            accumulator = mac.accumulator(),
            mismatches = mismatches.len(),
            "program finished"
        );

        Ok(RunReport {
            name: self.name.clone(),
            outputs,
            final_accumulator: mac.accumulator(),
            mismatches,
        })
    }
}
