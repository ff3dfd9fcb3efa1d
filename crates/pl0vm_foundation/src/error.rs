//! Error types for the PL/0 VM.
//!
//! Uses `thiserror` for ergonomic error definition. Faults carry structured
//! context (addresses, limits, the offending opcode); user-facing message
//! formatting stays at the boundary.

use std::fmt;

use thiserror::Error;

use crate::instruction::Opcode;

/// Convenience result alias for VM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal step failure.
///
/// Fatal errors abort the step; the machine state may be partially mutated
/// and the caller decides whether to keep stepping, revert a snapshot, or
/// stop.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of fault that occurred.
    pub kind: ErrorKind,
    /// The instruction that was executing when the fault occurred, if known.
    pub context: Option<StepContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Attaches step context to this error.
    #[must_use]
    pub fn with_context(mut self, context: StepContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a level-too-deep error.
    #[must_use]
    pub const fn level_too_deep(remaining: i64) -> Self {
        Self::new(ErrorKind::LevelTooDeep { remaining })
    }

    /// Creates a jump-out-of-range error.
    #[must_use]
    pub const fn jump_out_of_range(target: i64, program_len: usize) -> Self {
        Self::new(ErrorKind::JumpOutOfRange {
            target,
            program_len,
        })
    }

    /// Creates a stack-overflow error.
    #[must_use]
    pub const fn stack_overflow(limit: usize) -> Self {
        Self::new(ErrorKind::StackOverflow { limit })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Categorized fault kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The stack was accessed with a negative index.
    #[error("stack accessed with a negative index")]
    NegativeStackAccess,

    /// The stack grew past its configured maximum size.
    #[error("stack size exceeded the maximum of {limit} cells")]
    StackOverflow {
        /// The configured maximum number of cells.
        limit: usize,
    },

    /// A jump, call, or return targeted an instruction outside the program.
    #[error("instruction {target} is outside the program (length {program_len})")]
    JumpOutOfRange {
        /// The requested instruction index.
        target: i64,
        /// The number of instructions in the program.
        program_len: usize,
    },

    /// A static-link chase reached the outermost frame with levels remaining.
    #[error("static base lookup reached the outermost frame with {remaining} level(s) left")]
    LevelTooDeep {
        /// Levels that were still to be resolved.
        remaining: i64,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An `OPR` instruction carried an undefined sub-operation code.
    #[error("unknown OPR sub-operation {code}")]
    UnknownOperation {
        /// The undefined sub-operation code.
        code: i64,
    },

    /// A heap access fell outside the heap's address range.
    #[error("heap address {address} is out of range")]
    HeapOutOfRange {
        /// The requested heap address.
        address: i64,
    },

    /// A heap access hit a cell that is not part of an allocated block.
    #[error("heap address {address} is not allocated")]
    HeapUnallocated {
        /// The requested heap address.
        address: i64,
    },

    /// `WRI` popped a value that is not an unsigned byte.
    #[error("value {value} is not an unsigned byte")]
    ByteOutOfRange {
        /// The popped value.
        value: i64,
    },

    /// `REA` executed with an empty input buffer.
    #[error("no input available to read")]
    InputExhausted,

    /// `INT` tried to shrink the stack below the current frame or below -1.
    #[error("cannot shrink the stack top to {target}")]
    InvalidShrink {
        /// The stack top the shrink would have produced.
        target: i64,
    },

    /// A step was requested with the program counter past the last instruction.
    #[error("no instruction at index {pc} (program length {program_len})")]
    NoInstruction {
        /// The current program counter.
        pc: usize,
        /// The number of instructions in the program.
        program_len: usize,
    },

    /// Internal invariant violation (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// The instruction a fault was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    /// Program counter at the start of the step.
    pub pc: usize,
    /// Opcode of the faulting instruction.
    pub opcode: Opcode,
}

impl fmt::Display for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at instruction {} ({})", self.pc, self.opcode)
    }
}

/// A non-fatal condition: the step completed, but the caller should know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// `DEL` named an address where no allocated block starts.
    #[error("no allocated block starts at heap address {address}")]
    FreeUnallocated {
        /// The address the program tried to free.
        address: i64,
    },

    /// `NEW` requested a non-positive or over-capacity cell count.
    #[error("{count} is not a valid allocation size; -1 was pushed")]
    InvalidAllocationSize {
        /// The requested cell count.
        count: i64,
    },

    /// `NEW` found no free block large enough.
    #[error("no free heap block of {count} cells; -1 was pushed")]
    HeapExhausted {
        /// The requested cell count.
        count: i64,
    },
}
