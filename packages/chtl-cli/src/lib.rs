#![deny(clippy::all)]

//! `chtlc`: the CHTL compiler's command-line driver.
//!
//! This crate is intentionally thin. It owns the cross-file pipeline
//! (resolve imports, share one Symbol Map across a compile) and the
//! argument parsing / diagnostic rendering / exit-code layer around the
//! `chtl` crate; it does not itself lex, parse, or transform anything.

use std::process::ExitCode;

use anyhow::Result;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

pub mod args;
mod commands;
mod exit_status;
pub mod pipeline;
mod report;

/// Dispatches a parsed [`Arguments`] to its command implementation and
/// converts the resulting [`ExitStatus`] to a process exit code.
pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let status = match args.command {
        Command::Check(cmd) => commands::check(cmd)?,
        Command::Pack(cmd) => commands::pack(cmd)?,
        Command::Unpack(cmd) => commands::unpack(cmd)?,
    };
    Ok(status.into())
}
