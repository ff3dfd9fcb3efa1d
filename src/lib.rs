//! PL/0 VM - a single-stepping stack machine with narrated execution.
//!
//! This crate re-exports all layers of the system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: pl0vm_runtime    — Stepping session, REPL, CLI
//! Layer 3: pl0vm_explain    — Narration of pending instructions
//! Layer 2: pl0vm_parser     — Instruction text parsing and validation
//! Layer 1: pl0vm_machine    — Allocator, frame resolver, execution engine
//! Layer 0: pl0vm_foundation — Data model, instruction set, errors
//! ```
//!
//! The intended stepping flow is: explain the pending instruction (a pure
//! read), show the narration, then execute it. The explainer derives every
//! address through the same helpers as the engine, so the two cannot
//! disagree about what a step will do.

pub use pl0vm_explain as explain;
pub use pl0vm_foundation as foundation;
pub use pl0vm_machine as machine;
pub use pl0vm_parser as parser;
pub use pl0vm_runtime as runtime;
