//! Diagnostic accumulation. A single [`DiagnosticBag`] is threaded
//! through scanning, parsing, import resolution and the transform passes so
//! callers get one ordered, de-duplicated report per compiled file.

use crate::source::SourcePos;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Mirrors the pipeline's state machine so diagnostics can say which phase
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Scanning,
    Parsing,
    TemplateParsing,
    CustomParsing,
    ImportResolution,
    TransformVariableExpansion,
    TransformTemplateExpansion,
    TransformSpecialization,
    TransformInheritance,
    TransformSelectorAutomation,
    TransformReferenceResolution,
    TransformCommentLowering,
    ModuleArchive,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Scanning => "scanning",
            Phase::Parsing => "parsing",
            Phase::TemplateParsing => "template-parsing",
            Phase::CustomParsing => "custom-parsing",
            Phase::ImportResolution => "import-resolution",
            Phase::TransformVariableExpansion => "transform-variable-expansion",
            Phase::TransformTemplateExpansion => "transform-template-expansion",
            Phase::TransformSpecialization => "transform-specialization",
            Phase::TransformInheritance => "transform-inheritance",
            Phase::TransformSelectorAutomation => "transform-selector-automation",
            Phase::TransformReferenceResolution => "transform-reference-resolution",
            Phase::TransformCommentLowering => "transform-comment-lowering",
            Phase::ModuleArchive => "module-archive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub position: SourcePos,
    pub message: String,
    pub phase: Phase,
}

impl Diagnostic {
    /// `file:line:col: kind: message`, matching the user-visible format in
    /// the error handling design.
    pub fn render(&self, file_path: &str) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            file_path, self.position.line, self.position.column, self.severity, self.message
        )
    }
}

/// Ordered, de-duplicated diagnostic sink with an error budget. Cascading
/// diagnostics at the same (position, message) are suppressed.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    messages: Vec<Diagnostic>,
    seen: std::collections::HashSet<(SourcePos, String)>,
    max_errors: Option<usize>,
    error_count: usize,
    halted: bool,
}

impl DiagnosticBag {
    pub fn new(max_errors: Option<usize>) -> Self {
        DiagnosticBag { max_errors, ..Default::default() }
    }

    pub fn push(&mut self, severity: Severity, position: SourcePos, message: impl Into<String>, phase: Phase) {
        let message = message.into();
        let key = (position, message.clone());
        if !self.seen.insert(key) {
            return;
        }
        if severity >= Severity::Error {
            self.error_count += 1;
        }
        if severity == Severity::Fatal {
            self.halted = true;
        }
        if let Some(max) = self.max_errors {
            if self.error_count > max {
                self.halted = true;
            }
        }
        self.messages.push(Diagnostic { severity, position, message, phase });
    }

    pub fn info(&mut self, position: SourcePos, message: impl Into<String>, phase: Phase) {
        self.push(Severity::Info, position, message, phase);
    }

    pub fn warning(&mut self, position: SourcePos, message: impl Into<String>, phase: Phase) {
        self.push(Severity::Warning, position, message, phase);
    }

    pub fn error(&mut self, position: SourcePos, message: impl Into<String>, phase: Phase) {
        self.push(Severity::Error, position, message, phase);
    }

    pub fn fatal(&mut self, position: SourcePos, message: impl Into<String>, phase: Phase) {
        self.push(Severity::Fatal, position, message, phase);
    }

    /// True once a `fatal` has fired or the error budget was exceeded; the
    /// pipeline should stop issuing further work for the current file.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Forces `halted()` to report true without logging an additional
    /// diagnostic. Used by strict-mode parsing, where the propagation
    /// policy halts on the first lexical or syntactic error rather than
    /// synchronizing and continuing.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn counts_by_severity(&self) -> [(Severity, usize); 4] {
        let mut counts = [
            (Severity::Info, 0),
            (Severity::Warning, 0),
            (Severity::Error, 0),
            (Severity::Fatal, 0),
        ];
        for m in &self.messages {
            for c in counts.iter_mut() {
                if c.0 == m.severity {
                    c.1 += 1;
                }
            }
        }
        counts
    }

    pub fn summary(&self) -> String {
        let counts = self.counts_by_severity();
        counts
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(sev, n)| format!("{} {}", n, sev))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos { file_id: 0, offset: 0, line: 1, column: 1 }
    }

    #[test]
    fn duplicate_position_and_message_is_suppressed() {
        let mut bag = DiagnosticBag::new(None);
        bag.error(pos(), "boom", Phase::Parsing);
        bag.error(pos(), "boom", Phase::Parsing);
        assert_eq!(bag.messages().len(), 1);
    }

    #[test]
    fn error_budget_halts() {
        let mut bag = DiagnosticBag::new(Some(1));
        bag.error(pos(), "one", Phase::Parsing);
        assert!(!bag.halted());
        bag.error(pos(), "two", Phase::Parsing);
        assert!(bag.halted());
    }

    #[test]
    fn fatal_halts_immediately() {
        let mut bag = DiagnosticBag::new(None);
        bag.fatal(pos(), "invariant violated", Phase::Parsing);
        assert!(bag.halted());
    }
}
