use std::process::ExitCode;

use clap::Parser;
use chtl_cli::Arguments;

fn main() -> ExitCode {
    let args = Arguments::parse();
    match chtl_cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("chtlc: {err}");
            ExitCode::from(2)
        }
    }
}
