//! CLI argument definitions using clap's derive API.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chtlc", author, version, about = "CHTL compiler driver", long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a `.chtl` entry file through scanning, parsing, import
    /// resolution, and the transform pipeline, and report diagnostics.
    Check(CheckArgs),
    /// Pack a module directory (`src/`, `info/<name>.chtl`) into a
    /// `.cmod`/`.cjmod` archive.
    Pack(PackArgs),
    /// Unpack a `.cmod`/`.cjmod` archive into a directory, verifying every
    /// entry's CRC-32.
    Unpack(UnpackArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Entry `.chtl` file to compile.
    pub file: PathBuf,

    /// Stop after this many `error`-or-above diagnostics (default:
    /// unlimited).
    #[arg(long)]
    pub max_errors: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PackArgs {
    /// Module directory containing `src/` and `info/<name>.chtl`.
    pub src_dir: PathBuf,
    /// Output archive path.
    pub out_file: PathBuf,
    /// Module name — must match `info/<name>.chtl`.
    #[arg(long)]
    pub module_name: String,
}

#[derive(Debug, Args)]
pub struct UnpackArgs {
    /// Archive to unpack.
    pub archive_file: PathBuf,
    /// Destination directory.
    pub out_dir: PathBuf,
}
