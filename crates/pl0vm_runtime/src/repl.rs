//! The interactive stepping REPL.
//!
//! Each `step` command follows the core's intended flow: first the pending
//! instruction is explained (a pure read), then the engine executes it.
//! Narration rendering happens here, at the boundary, not in the core.

use std::fs;
use std::path::Path;

use pl0vm_explain::Narration;
use pl0vm_foundation::{Error, Result};
use pl0vm_machine::StepOutcome;
use pl0vm_parser::parse_program;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (machine, program, history).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "pl0> ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            println!("PL/0 VM {} - 'help' lists commands", env!("CARGO_PKG_VERSION"));
        }

        loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => print_error(&e),
            }
        }

        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let line = match self.editor.read_line(&self.prompt)? {
            ReadResult::Line(line) => line,
            ReadResult::Interrupted => return Ok(true),
            ReadResult::Eof => return Ok(false),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        self.editor.add_history(trimmed);

        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (trimmed, ""),
        };

        match command {
            "help" => print_help(),
            "load" => self.load(rest),
            "input" => {
                self.session.queue_input(rest);
                println!("input: {:?}", self.session.pending_input());
            }
            "step" => {
                let count = rest.parse().unwrap_or(1);
                self.step(count);
            }
            "back" => {
                let count: usize = rest.parse().unwrap_or(1);
                let stepped = (0..count).take_while(|_| self.session.back()).count();
                println!("took back {stepped} step(s)");
            }
            "explain" => print_narration(&self.session.explain()),
            "stack" => self.print_stack(),
            "heap" => self.print_heap(),
            "state" => self.print_state(),
            "reset" => {
                self.session.reset();
                println!("machine reset");
            }
            "quit" | "exit" => return Ok(false),
            unknown => println!("unknown command '{unknown}'; try 'help'"),
        }

        Ok(true)
    }

    fn load(&mut self, path: &str) {
        if path.is_empty() {
            println!("usage: load <file>");
            return;
        }
        let source = match fs::read_to_string(Path::new(path)) {
            Ok(source) => source,
            Err(e) => {
                println!("cannot read {path}: {e}");
                return;
            }
        };

        let outcome = parse_program(&source);
        for error in &outcome.parse_errors {
            println!("parse error: {error}");
        }
        for error in &outcome.validation_errors {
            println!("validation error: {error}");
        }
        if outcome.is_ok() && !outcome.instructions.is_empty() {
            println!("loaded {} instruction(s)", outcome.instructions.len());
            self.session.load(outcome.instructions);
        }
    }

    fn step(&mut self, count: usize) {
        for _ in 0..count {
            if self.session.instructions().is_empty() {
                println!("no program loaded");
                return;
            }
            if self.session.finished() {
                println!("the program has finished; 'back' or 'reset' to continue");
                return;
            }

            // Explain first (pure read), then execute.
            print_narration(&self.session.explain());
            match self.session.step() {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => {
                    print_error(&e);
                    return;
                }
            }
        }
    }

    fn print_state(&self) {
        let model = self.session.model();
        println!(
            "pc={} base={} sp={} steps-back={}",
            model.pc,
            model.base,
            model.sp,
            self.session.history_len()
        );
        if !model.output.is_empty() {
            println!("output: {:?}", model.output);
        }
        if !self.session.pending_input().is_empty() {
            println!("input:  {:?}", self.session.pending_input());
        }
    }

    fn print_stack(&self) {
        let model = self.session.model();
        if model.sp < 0 {
            println!("stack is empty");
            return;
        }
        for index in 0..=model.sp {
            let frame_mark = model
                .stack
                .frames
                .iter()
                .position(|frame| frame.index == index)
                .map_or("   ", |_| "=> ");
            let value = model.stack.cell(index).unwrap_or(0);
            let pointer = if index == model.sp { " <- sp" } else { "" };
            println!("{frame_mark}[{index:>4}] {value}{pointer}");
        }
    }

    fn print_heap(&self) {
        let heap = &self.session.model().heap;
        for block in &heap.blocks {
            if block.free {
                println!("[{:>4}..{:>4}) free", block.index, block.end());
            } else {
                println!(
                    "[{:>4}..{:>4}) used {:?}",
                    block.index,
                    block.end(),
                    block.values
                );
            }
        }
    }
}

fn print_narration(narration: &Narration) {
    if narration.is_fault() {
        println!("! {}", narration.render());
    } else {
        println!("- {}", narration.render());
    }
}

fn print_outcome(outcome: &StepOutcome) {
    if !outcome.output.is_empty() {
        println!("output: {:?}", outcome.output);
    }
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    if outcome.ended {
        println!("program ended");
    }
}

fn print_error(error: &Error) {
    match &error.context {
        Some(context) => println!("fault {context}: {error}"),
        None => println!("fault: {error}"),
    }
}

fn print_help() {
    println!("commands:");
    println!("  load <file>   load and validate a program");
    println!("  input <text>  append text to the pending input");
    println!("  step [n]      explain and execute the next instruction(s)");
    println!("  back [n]      undo the last step(s)");
    println!("  explain       describe the pending instruction");
    println!("  stack         show the stack and frames");
    println!("  heap          show the heap partition");
    println!("  state         show registers, output, and input");
    println!("  reset         reset the machine, keep the program");
    println!("  quit          leave");
}
