//! Session state for interactive stepping.
//!
//! The session owns the machine state, the validated program, and the
//! pending input buffer. Before every step it snapshots the model (the core
//! is stateless between calls, so step-back is simply restoring the
//! previous deep copy), which is exactly the history contract the VM core
//! leaves to its caller.

use std::collections::VecDeque;

use pl0vm_explain::{Narration, explain};
use pl0vm_foundation::{DataModel, Instruction, Result};
use pl0vm_machine::{StepOutcome, step};

/// Default maximum number of stack cells.
pub const DEFAULT_STACK_MAX_SIZE: usize = 1024 * 512;

/// Default number of heap cells.
pub const DEFAULT_HEAP_CAPACITY: usize = 5000;

/// Default number of retained step-back snapshots.
const DEFAULT_MAX_HISTORY: usize = 1024;

/// One step-back snapshot: the model and the input that was pending.
#[derive(Clone, Debug)]
struct Snapshot {
    model: DataModel,
    input: String,
}

/// An interactive stepping session over one machine and one program.
pub struct Session {
    model: DataModel,
    instructions: Vec<Instruction>,
    input: String,
    history: VecDeque<Snapshot>,
    max_history: usize,
    stack_max_size: usize,
    heap_capacity: usize,
    finished: bool,
}

impl Session {
    /// Creates a session with the default capacities and no program.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_STACK_MAX_SIZE, DEFAULT_HEAP_CAPACITY)
    }

    /// Creates a session with explicit stack and heap capacities.
    #[must_use]
    pub fn with_capacities(stack_max_size: usize, heap_capacity: usize) -> Self {
        Self {
            model: DataModel::new(stack_max_size, heap_capacity),
            instructions: Vec::new(),
            input: String::new(),
            history: VecDeque::new(),
            max_history: DEFAULT_MAX_HISTORY,
            stack_max_size,
            heap_capacity,
            finished: false,
        }
    }

    /// Limits how many step-back snapshots are retained.
    #[must_use]
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Loads a validated program and resets the machine.
    pub fn load(&mut self, instructions: Vec<Instruction>) {
        self.instructions = instructions;
        self.reset();
    }

    /// Resets the machine, history, and pending input; the program stays.
    pub fn reset(&mut self) {
        self.model = DataModel::new(self.stack_max_size, self.heap_capacity);
        self.input.clear();
        self.history.clear();
        self.finished = false;
    }

    /// Appends text to the pending input buffer.
    pub fn queue_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    /// Returns the current machine state.
    #[must_use]
    pub const fn model(&self) -> &DataModel {
        &self.model
    }

    /// Returns the loaded program.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the input not yet consumed by `REA`.
    #[must_use]
    pub fn pending_input(&self) -> &str {
        &self.input
    }

    /// Returns true once the program has ended or faulted.
    #[must_use]
    pub const fn finished(&self) -> bool {
        self.finished
    }

    /// Returns how many step-back snapshots are available.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Explains the pending instruction without executing it.
    #[must_use]
    pub fn explain(&self) -> Narration {
        explain(&self.model, &self.instructions, &self.input)
    }

    /// Executes one step, snapshotting the machine first.
    ///
    /// # Errors
    ///
    /// Propagates the engine's fatal errors; the session is then marked
    /// finished, and [`Session::back`] restores the pre-fault state.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.push_snapshot();

        let input = self.input.clone();
        match step(&mut self.model, &self.instructions, &input) {
            Ok(outcome) => {
                self.input = outcome.remaining_input.clone();
                self.finished = outcome.ended;
                Ok(outcome)
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Restores the most recent snapshot. Returns false when there is none.
    pub fn back(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_back() else {
            return false;
        };
        self.model = snapshot.model;
        self.input = snapshot.input;
        self.finished = false;
        true
    }

    fn push_snapshot(&mut self) {
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(Snapshot {
            model: self.model.clone(),
            input: self.input.clone(),
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
