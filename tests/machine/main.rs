//! Integration tests for the execution engine.
//!
//! Programs here are written in the textual instruction format and go
//! through the parser, so these tests exercise the validated-input contract
//! end to end.

mod scenarios;

use pl0vm_foundation::{DataModel, Instruction};
use pl0vm_machine::StepOutcome;

/// Parses a program text, asserting it validates.
pub fn load(source: &str) -> Vec<Instruction> {
    let outcome = pl0vm_parser::parse_program(source);
    assert!(
        outcome.is_ok(),
        "test program failed to validate: {:?} {:?}",
        outcome.parse_errors,
        outcome.validation_errors
    );
    outcome.instructions
}

/// Runs a program to its natural end, threading input through the steps.
pub fn run(
    model: &mut DataModel,
    instructions: &[Instruction],
    input: &str,
) -> Result<StepOutcome, pl0vm_foundation::Error> {
    let mut input = input.to_string();
    loop {
        let outcome = pl0vm_machine::step(model, instructions, &input)?;
        input = outcome.remaining_input.clone();
        if outcome.ended {
            return Ok(outcome);
        }
    }
}
