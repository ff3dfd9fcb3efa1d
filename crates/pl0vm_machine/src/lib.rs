//! Heap allocator, frame resolver, and execution engine for the PL/0 VM.
//!
//! This crate provides:
//! - [`allocator`] - First-fit heap allocation with splitting and coalescing
//! - [`frame`] - Static-link resolution across activation frames
//! - [`step`] - The per-instruction execution engine
//!
//! The allocator probes and the frame resolver are pure and shared with the
//! explanation layer, so the narration of a step and the step itself derive
//! every address from the same code.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod allocator;
pub mod frame;
pub mod step;

pub use step::{StepOutcome, step};
