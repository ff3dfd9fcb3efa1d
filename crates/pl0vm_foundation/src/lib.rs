//! Data model, instruction set, and error types for the PL/0 VM.
//!
//! This crate provides:
//! - [`Opcode`] / [`Operation`] / [`Instruction`] - The instruction set
//! - [`DataModel`] - The complete machine state (stack, heap, registers, I/O)
//! - [`Error`] - Fatal step failures with structured context
//! - [`Warning`] - Non-fatal conditions reported alongside a completed step

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod instruction;
mod model;

pub use error::{Error, ErrorKind, Result, StepContext, Warning};
pub use instruction::{Instruction, Opcode, Operation};
pub use model::{DataModel, Heap, HeapBlock, Stack, StackFrame};
