mod cmd;
mod repl;

use crate::cmd::{Cmd, EX_IOERR};

use std::process::ExitCode;

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cmd = match Cmd::parse_args() {
        Ok(cmd) => cmd,
        Err(code) => return ExitCode::from(code),
    };
    cmd.init_tracing();
    match cmd.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lox: {e:#}");
            ExitCode::from(EX_IOERR)
        }
    }
}
