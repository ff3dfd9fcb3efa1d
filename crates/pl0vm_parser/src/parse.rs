//! Line-oriented parsing of the four-column instruction format.

use thiserror::Error;

use pl0vm_foundation::{Instruction, Opcode};

use crate::validate::validate;

/// A problem tied to one source line (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct LineError {
    /// The 0-based source line the problem was found on.
    pub line: usize,
    /// What is wrong with the line.
    pub message: String,
}

impl LineError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// The result of parsing and validating a program text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// The parsed instructions; empty when any line failed to parse.
    pub instructions: Vec<Instruction>,
    /// Per-line format problems.
    pub parse_errors: Vec<LineError>,
    /// Per-line constraint violations found after a clean parse.
    pub validation_errors: Vec<LineError>,
}

impl ParseOutcome {
    /// Returns true when the program parsed and validated cleanly.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.parse_errors.is_empty() && self.validation_errors.is_empty()
    }

    /// Returns true when the source held no instructions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty() && self.parse_errors.is_empty()
    }
}

/// Parses a program text and validates the per-opcode constraints.
///
/// Blank lines are skipped. When any line fails to parse the instruction
/// list comes back empty; validation problems keep the instructions so the
/// caller can point at the offending lines.
#[must_use]
pub fn parse_program(source: &str) -> ParseOutcome {
    let mut instructions = Vec::new();
    let mut parse_errors = Vec::new();

    for (line_number, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line_number, line) {
            Ok(instruction) => instructions.push(instruction),
            Err(error) => parse_errors.push(error),
        }
    }

    if !parse_errors.is_empty() {
        return ParseOutcome {
            instructions: Vec::new(),
            parse_errors,
            validation_errors: Vec::new(),
        };
    }

    let validation_errors = validate(&instructions);
    ParseOutcome {
        instructions,
        parse_errors,
        validation_errors,
    }
}

fn parse_line(line_number: usize, line: &str) -> Result<Instruction, LineError> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 4 {
        return Err(LineError::new(line_number, "line has fewer than 4 columns"));
    }
    if columns.len() > 4 {
        return Err(LineError::new(line_number, "line has more than 4 columns"));
    }

    let index: usize = columns[0]
        .parse()
        .map_err(|_| LineError::new(line_number, "index must be a non-negative integer"))?;
    let opcode: Opcode = columns[1]
        .parse()
        .map_err(|()| LineError::new(line_number, format!("unknown mnemonic '{}'", columns[1])))?;
    let level: i64 = columns[2]
        .parse()
        .map_err(|_| LineError::new(line_number, "level (L) must be an integer"))?;
    let parameter: i64 = columns[3]
        .parse()
        .map_err(|_| LineError::new(line_number, "parameter (A) must be an integer"))?;

    Ok(Instruction::new(index, opcode, level, parameter))
}
