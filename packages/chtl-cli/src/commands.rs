//! Command implementations dispatched from `run_cli`.

use anyhow::{Context, Result};

use crate::args::{CheckArgs, PackArgs, UnpackArgs};
use crate::exit_status::ExitStatus;
use crate::pipeline::Session;
use crate::report::print_diagnostics;

pub fn check(args: CheckArgs) -> Result<ExitStatus> {
    if !args.file.is_file() {
        eprintln!("chtlc: no such file: {}", args.file.display());
        return Ok(ExitStatus::UserError);
    }

    let mut session = Session::new();
    let compiled = session
        .compile_entry(&args.file, args.max_errors)
        .with_context(|| format!("reading {}", args.file.display()))?;

    print_diagnostics(&compiled.path, &compiled.diagnostics);

    if compiled.diagnostics.halted() {
        return Ok(ExitStatus::InternalError);
    }
    if compiled.has_errors() {
        return Ok(ExitStatus::UserError);
    }
    Ok(ExitStatus::Success)
}

pub fn pack(args: PackArgs) -> Result<ExitStatus> {
    match chtl::archive::pack(&args.src_dir, &args.out_file, &args.module_name) {
        Ok(()) => {
            println!("packed {} -> {}", args.src_dir.display(), args.out_file.display());
            Ok(ExitStatus::Success)
        }
        Err(err) => {
            eprintln!("chtlc: {err}");
            Ok(ExitStatus::UserError)
        }
    }
}

pub fn unpack(args: UnpackArgs) -> Result<ExitStatus> {
    match chtl::archive::unpack(&args.archive_file, &args.out_dir) {
        Ok(()) => {
            println!("unpacked {} -> {}", args.archive_file.display(), args.out_dir.display());
            Ok(ExitStatus::Success)
        }
        Err(err) => {
            eprintln!("chtlc: {err}");
            Ok(ExitStatus::UserError)
        }
    }
}
