//! Structured narration of pending PL/0 instructions.
//!
//! This crate provides:
//! - [`explain`] - A pure, read-only shadow of the execution engine
//! - [`Narration`] / [`Placeholder`] - The structured explanation it produces
//!
//! The explainer re-derives every address, operand, and fault condition the
//! engine would compute for the instruction at the current program counter,
//! without mutating anything. Where the engine would fault, the narration
//! states the fault instead of raising it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod explain;
mod narration;

pub use explain::explain;
pub use narration::{Highlight, Narration, NarrationKind, Placeholder};
