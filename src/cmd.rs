use crate::repl;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use lox_common::error::report_err;
use lox_interpreter::Interpreter;
use lox_syntax::printer;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// Exit codes from sysexits.h.
pub const EX_USAGE: u8 = 64;
pub const EX_DATAERR: u8 = 65;
pub const EX_SOFTWARE: u8 = 70;
pub const EX_IOERR: u8 = 74;

#[derive(Debug, Parser)]
#[command(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub struct Cmd {
    /// Log more (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start an interactive session (the default).
    Repl,
    /// Run a script.
    Run {
        path: PathBuf,
        /// Print the parsed program before running it.
        #[arg(long)]
        print_ast: bool,
    },
}

impl Cmd {
    /// Parses the command line. On failure, the message (or the help text)
    /// has been printed and the process should exit with the returned code.
    pub fn parse_args() -> Result<Self, u8> {
        Self::try_parse().map_err(|e| {
            e.print().ok();
            usage_exit_code(&e)
        })
    }

    pub fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.command {
            None | Some(Command::Repl) => repl::run().map(|()| ExitCode::SUCCESS),
            Some(Command::Run { path, print_ast }) => run(path, *print_ast),
        }
    }
}

/// `--help` and `--version` are reported by clap as errors but are not
/// failures.
fn usage_exit_code(e: &clap::Error) -> u8 {
    if e.use_stderr() {
        EX_USAGE
    } else {
        0
    }
}

/// Runs one script. Syntax errors and runtime errors map to distinct exit
/// codes; a script with syntax errors is never executed.
fn run(path: &Path, print_ast: bool) -> Result<ExitCode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read file: {}", path.display()))?;
    let name = path.display().to_string();
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);

    tracing::debug!(path = %path.display(), "parsing");
    let program = match lox_syntax::parse(&source) {
        Ok(program) => program,
        Err(errors) => {
            report_err(&mut stderr, &name, &source, &errors);
            return Ok(ExitCode::from(EX_DATAERR));
        }
    };

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    if print_ast {
        stdout
            .write_all(printer::print_program(&program).as_bytes())
            .context("could not write to stdout")?;
    }

    tracing::debug!(stmts = program.stmts.len(), "interpreting");
    let mut interpreter = Interpreter::new(&mut stdout);
    if let Err(e) = interpreter.interpret(&program) {
        report_err(&mut stderr, &name, &source, &[e]);
        return Ok(ExitCode::from(EX_SOFTWARE));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn exit_code(args: &[&str]) -> Option<u8> {
        Cmd::try_parse_from(args).err().map(|e| usage_exit_code(&e))
    }

    #[test]
    fn usage_errors() {
        assert_eq!(Some(EX_USAGE), exit_code(&["lox", "bogus"]));
        assert_eq!(Some(EX_USAGE), exit_code(&["lox", "run"]));
        assert_eq!(Some(EX_USAGE), exit_code(&["lox", "run", "a.lox", "b.lox"]));
    }

    #[test]
    fn help_is_not_an_error() {
        assert_eq!(Some(0), exit_code(&["lox", "--help"]));
        assert_eq!(Some(0), exit_code(&["lox", "--version"]));
    }

    #[test]
    fn valid_arguments() {
        assert_eq!(None, exit_code(&["lox"]));
        assert_eq!(None, exit_code(&["lox", "run", "a.lox", "--print-ast"]));
        assert_eq!(None, exit_code(&["lox", "-vv", "repl"]));
    }
}
