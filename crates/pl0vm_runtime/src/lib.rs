//! Stepping session, REPL, and CLI for the PL/0 VM.
//!
//! This crate provides:
//! - [`Session`] - Owns the machine state, program, and step-back history
//! - [`Repl`] - Interactive stepping loop with narrated execution
//! - The `pl0vm` binary - REPL by default, batch runner for a program file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod editor;
mod repl;
mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor, ScriptedEditor};
pub use repl::Repl;
pub use session::{DEFAULT_HEAP_CAPACITY, DEFAULT_STACK_MAX_SIZE, Session};
