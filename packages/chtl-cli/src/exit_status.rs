use std::process::ExitCode;

/// Exit status for the `chtlc` binary.
///
/// - `Success` (0): compiled with no diagnostics at `error` or above.
/// - `UserError` (1): a user- or file-level problem — missing input file,
///   lexical/syntactic/semantic/import diagnostics at `error` or above.
/// - `InternalError` (2): a fatal diagnostic fired (invariant violated, or
///   the error budget was exceeded) or the process hit an I/O failure it
///   could not attribute to a single file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    UserError,
    InternalError,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::UserError => ExitCode::from(1),
            ExitStatus::InternalError => ExitCode::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::from(ExitStatus::Success), ExitCode::from(0));
        assert_eq!(ExitCode::from(ExitStatus::UserError), ExitCode::from(1));
        assert_eq!(ExitCode::from(ExitStatus::InternalError), ExitCode::from(2));
    }
}
