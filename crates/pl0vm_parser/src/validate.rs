//! Per-opcode constraint validation over a parsed instruction list.
//!
//! These are the constraints the VM core trusts (and does not re-check):
//! contiguous 0-based indices, non-negative levels, and the operand shape
//! of each opcode. Jump and call targets are range-checked at runtime, not
//! here, because the program counter is data.

use pl0vm_foundation::{Instruction, Opcode};

use crate::parse::LineError;

/// Checks every instruction against the input contract of the VM core.
///
/// Returns one error per offending instruction, indexed by its position.
#[must_use]
pub fn validate(instructions: &[Instruction]) -> Vec<LineError> {
    let mut errors = Vec::new();

    for (position, instruction) in instructions.iter().enumerate() {
        if let Some(message) = check(position, instruction) {
            errors.push(LineError {
                line: position,
                message,
            });
        }
    }

    errors
}

fn check(position: usize, instruction: &Instruction) -> Option<String> {
    let opcode = instruction.opcode;

    if instruction.index != position {
        return Some(format!(
            "instruction index {} does not match its position {} (number from 0)",
            instruction.index, position
        ));
    }
    if instruction.level < 0 {
        return Some("level cannot be negative".to_string());
    }

    match opcode {
        Opcode::Lit | Opcode::Int | Opcode::Jmp | Opcode::Jmc => {
            if instruction.level != 0 {
                return Some(format!("{opcode} must have level 0"));
            }
            if matches!(opcode, Opcode::Jmp | Opcode::Jmc) && instruction.parameter < 0 {
                return Some(format!("{opcode} must target an address >= 0"));
            }
        }
        Opcode::Opr => {
            if instruction.level != 0 {
                return Some("OPR must have level 0".to_string());
            }
            if !(1..=13).contains(&instruction.parameter) {
                return Some("OPR must have a parameter (A) between 1 and 13".to_string());
            }
        }
        Opcode::Cal => {
            if instruction.parameter < 0 {
                return Some("CAL must target an address >= 0".to_string());
            }
        }
        Opcode::Lod | Opcode::Sto => {}
        Opcode::Ret
        | Opcode::Rea
        | Opcode::Wri
        | Opcode::New
        | Opcode::Del
        | Opcode::Lda
        | Opcode::Sta
        | Opcode::Pld
        | Opcode::Pst => {
            if instruction.level != 0 || instruction.parameter != 0 {
                return Some(format!("{opcode} must have both level and parameter (A) 0"));
            }
        }
    }

    None
}
