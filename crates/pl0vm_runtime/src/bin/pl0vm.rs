//! PL/0 VM CLI entry point.
//!
//! Without arguments this starts the interactive stepping REPL. With a
//! program file it runs the program to completion (or the first fault),
//! printing the program's output and any warnings.

use std::env;
use std::fs;
use std::process::ExitCode;

use pl0vm_parser::parse_program;
use pl0vm_runtime::{Repl, Session};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    file: Option<String>,
    input: String,
    narrate: bool,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, String> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--narrate" => config.narrate = true,
            "--input" => {
                i += 1;
                if i >= args.len() {
                    return Err("--input requires a value".to_string());
                }
                config.input = args[i].clone();
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}"));
            }
            path => {
                if config.file.is_some() {
                    return Err("only one program file can be given".to_string());
                }
                config.file = Some(path.to_string());
            }
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), String> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }
    if config.show_version {
        println!("pl0vm {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match config.file {
        Some(ref path) => run_file(&config, path),
        None => {
            let mut repl = Repl::new().map_err(|e| e.to_string())?;
            repl.run().map_err(|e| e.to_string())
        }
    }
}

fn run_file(config: &CliConfig, path: &str) -> Result<(), String> {
    let source = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;

    let outcome = parse_program(&source);
    if !outcome.is_ok() {
        for error in &outcome.parse_errors {
            eprintln!("parse error: {error}");
        }
        for error in &outcome.validation_errors {
            eprintln!("validation error: {error}");
        }
        return Err(format!("{path} did not validate"));
    }
    if outcome.instructions.is_empty() {
        return Err(format!("{path} holds no instructions"));
    }

    let mut session = Session::new();
    session.load(outcome.instructions);
    session.queue_input(&config.input);

    loop {
        if config.narrate {
            eprintln!("{}", session.explain().render());
        }
        let step = session.step().map_err(|e| e.to_string())?;
        for warning in &step.warnings {
            eprintln!("warning: {warning}");
        }
        if step.ended {
            break;
        }
    }

    print!("{}", session.model().output);
    Ok(())
}

fn print_help() {
    println!("usage: pl0vm [options] [program]");
    println!();
    println!("Without a program file, starts the interactive stepping REPL.");
    println!();
    println!("options:");
    println!("  --input <text>  input characters for REA");
    println!("  --narrate       print each step's narration to stderr");
    println!("  -V, --version   print the version");
    println!("  -h, --help      this help");
}
