//! The narration data model: message templates, placeholders, highlights.
//!
//! A narration is one explanation for one pending instruction. Its message
//! is an English template with positional `%N` markers; each marker has a
//! [`Placeholder`] carrying the substituted value plus the stack cells, heap
//! cells, and instructions a presentation layer should highlight. Rendering
//! (and any localization) happens at the boundary, not here.

#![allow(clippy::cast_possible_wrap)]

use pl0vm_foundation::ErrorKind;

/// How a highlighted location should be emphasized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    /// Emphasize the value itself.
    Bold,
    /// Emphasize the containing cell.
    Background,
}

/// One `%N` marker of a narration message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    /// The positional token this placeholder substitutes (`1` for `%1`).
    pub token: u8,
    /// The literal value to substitute.
    pub value: i64,
    /// Stack cell indices to highlight.
    pub stack: Vec<i64>,
    /// Heap cell addresses to highlight.
    pub heap: Vec<usize>,
    /// Instruction indices to highlight.
    pub instructions: Vec<usize>,
    /// Whether to highlight the instruction's level field.
    pub level: bool,
    /// Whether to highlight the instruction's parameter field.
    pub parameter: bool,
    /// Whether to highlight the input pane.
    pub input: bool,
    /// Whether to highlight the output pane.
    pub output: bool,
    /// The emphasis style for the highlighted locations.
    pub highlight: Highlight,
}

impl Placeholder {
    fn new(token: u8, value: i64, highlight: Highlight) -> Self {
        Self {
            token,
            value,
            stack: Vec::new(),
            heap: Vec::new(),
            instructions: Vec::new(),
            level: false,
            parameter: false,
            input: false,
            output: false,
            highlight,
        }
    }

    /// Creates a bold placeholder.
    #[must_use]
    pub fn bold(token: u8, value: i64) -> Self {
        Self::new(token, value, Highlight::Bold)
    }

    /// Creates a background-highlighted placeholder.
    #[must_use]
    pub fn background(token: u8, value: i64) -> Self {
        Self::new(token, value, Highlight::Background)
    }

    /// Adds stack cells to highlight.
    #[must_use]
    pub fn on_stack(mut self, indices: impl IntoIterator<Item = i64>) -> Self {
        self.stack.extend(indices);
        self
    }

    /// Adds heap cells to highlight.
    #[must_use]
    pub fn on_heap(mut self, addresses: impl IntoIterator<Item = usize>) -> Self {
        self.heap.extend(addresses);
        self
    }

    /// Adds an instruction to highlight.
    #[must_use]
    pub fn on_instruction(mut self, index: usize) -> Self {
        self.instructions.push(index);
        self
    }

    /// Highlights the instruction's level field.
    #[must_use]
    pub const fn marks_level(mut self) -> Self {
        self.level = true;
        self
    }

    /// Highlights the instruction's parameter field.
    #[must_use]
    pub const fn marks_parameter(mut self) -> Self {
        self.parameter = true;
        self
    }

    /// Highlights the input pane.
    #[must_use]
    pub const fn marks_input(mut self) -> Self {
        self.input = true;
        self
    }

    /// Highlights the output pane.
    #[must_use]
    pub const fn marks_output(mut self) -> Self {
        self.output = true;
        self
    }
}

/// Whether a narration describes a normal effect or a would-be fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrationKind {
    /// The step would complete (possibly with warnings).
    Describe,
    /// The step would abort with a fatal error.
    Fault,
}

/// The structured explanation of one pending instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narration {
    /// Whether the step would complete or fault.
    pub kind: NarrationKind,
    /// English template with positional `%N` markers.
    pub message: &'static str,
    /// One entry per `%N` marker.
    pub placeholders: Vec<Placeholder>,
    /// True when this step would terminate the program.
    pub ends: bool,
}

impl Narration {
    /// Creates a narration for a step that would complete.
    #[must_use]
    pub const fn describe(message: &'static str) -> Self {
        Self {
            kind: NarrationKind::Describe,
            message,
            placeholders: Vec::new(),
            ends: false,
        }
    }

    /// Creates a narration for a step that would fault.
    #[must_use]
    pub const fn fault(message: &'static str) -> Self {
        Self {
            kind: NarrationKind::Fault,
            message,
            placeholders: Vec::new(),
            ends: false,
        }
    }

    /// Adds a placeholder.
    #[must_use]
    pub fn with(mut self, placeholder: Placeholder) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    /// Marks the narrated step as terminating the program.
    #[must_use]
    pub const fn ending(mut self) -> Self {
        self.ends = true;
        self
    }

    /// Returns true when the narrated step would fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.kind == NarrationKind::Fault
    }

    /// Builds the fault narration for an engine error kind.
    ///
    /// This is the mechanical half of explain/step fault parity: wherever
    /// the explainer re-runs an engine derivation and receives an error, the
    /// error maps to narration through this single table.
    #[must_use]
    pub fn from_error(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::NegativeStackAccess => {
                Self::fault("The stack would be accessed with a negative index")
            }
            ErrorKind::StackOverflow { limit } => {
                Self::fault("The stack would exceed its maximum size of %1 cells")
                    .with(Placeholder::bold(1, *limit as i64))
            }
            ErrorKind::JumpOutOfRange { target, .. } => {
                Self::fault("Instruction %1 is outside the program")
                    .with(Placeholder::bold(1, *target))
            }
            ErrorKind::LevelTooDeep { .. } => Self::fault(
                "The level is too deep - the static base would lie below the outermost frame",
            ),
            ErrorKind::DivisionByZero => Self::fault("The divisor on top of the stack is zero"),
            ErrorKind::UnknownOperation { code } => {
                Self::fault("Unknown operation %1").with(Placeholder::bold(1, *code))
            }
            ErrorKind::HeapOutOfRange { address } => {
                Self::fault("Address %1 is outside the heap").with(Placeholder::bold(1, *address))
            }
            ErrorKind::HeapUnallocated { address } => {
                Self::fault("Address %1 is not allocated")
                    .with(Placeholder::background(1, *address))
            }
            ErrorKind::ByteOutOfRange { value } => {
                Self::fault("The value on top of the stack (%1) is not an unsigned byte")
                    .with(Placeholder::bold(1, *value))
            }
            ErrorKind::InputExhausted => Self::fault(
                "There is no input left to read - supply input or the interpreter will stop",
            ),
            ErrorKind::InvalidShrink { target } => {
                Self::fault("Cannot shrink the stack top to %1")
                    .with(Placeholder::bold(1, *target))
            }
            ErrorKind::NoInstruction { pc, .. } => {
                Self::fault("There is no instruction at index %1")
                    .with(Placeholder::bold(1, *pc as i64))
            }
            ErrorKind::Internal(_) => Self::fault("Internal error"),
        }
    }

    /// Renders the message with every `%N` marker substituted.
    #[must_use]
    pub fn render(&self) -> String {
        let mut message = self.message.to_string();
        for placeholder in &self.placeholders {
            let marker = format!("%{}", placeholder.token);
            message = message.replace(&marker, &placeholder.value.to_string());
        }
        message
    }
}
