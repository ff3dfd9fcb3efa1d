//! Integration tests for the explanation generator.

mod narrations;

use pl0vm_foundation::{Instruction, Opcode};

/// Builds a program from `(opcode, level, parameter)` triples.
pub fn program(ops: &[(Opcode, i64, i64)]) -> Vec<Instruction> {
    ops.iter()
        .enumerate()
        .map(|(index, &(opcode, level, parameter))| {
            Instruction::new(index, opcode, level, parameter)
        })
        .collect()
}
