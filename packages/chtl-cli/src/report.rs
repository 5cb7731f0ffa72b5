//! Renders a compiled file's diagnostics in the `file:line:col: kind:
//! message` form and a trailing severity-count summary.

use chtl::diagnostics::DiagnosticBag;
use std::path::Path;

pub fn print_diagnostics(path: &Path, diags: &DiagnosticBag) {
    let file_path = path.display().to_string();
    for diag in diags.messages() {
        eprintln!("{}", diag.render(&file_path));
    }
    if !diags.messages().is_empty() {
        eprintln!("{}: {}", file_path, diags.summary());
    }
}
