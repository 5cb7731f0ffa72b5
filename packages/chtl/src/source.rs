//! Source buffers and position tracking shared by every phase of the pipeline.

use std::fmt;
use std::rc::Rc;

/// A loaded source file. `id` is assigned by whoever owns the set of files
/// being compiled together (the CLI, or the import resolver for re-entrant
/// compiles) and is what [`SourcePos`] refers back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub id: u32,
    pub path: String,
    pub content: Rc<str>,
}

impl SourceFile {
    pub fn new(id: u32, path: impl Into<String>, content: impl Into<String>) -> Self {
        SourceFile { id, path: path.into(), content: Rc::from(content.into()) }
    }
}

/// A (fileId, byteOffset, line, column) position. Lines and columns are
/// 1-based; tab width is never normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourcePos {
    pub file_id: u32,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub const fn start(file_id: u32) -> Self {
        SourcePos { file_id, offset: 0, line: 1, column: 1 }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range plus the positions at each end, used by both
/// fragments and AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl SourceSpan {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        SourceSpan { start, end }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start.offset..self.end.offset
    }

    /// Whether `self` and `other` describe disjoint byte ranges.
    pub fn is_disjoint_from(&self, other: &SourceSpan) -> bool {
        self.end.offset <= other.start.offset || other.end.offset <= self.start.offset
    }

    /// Whether `other` is fully contained within `self`.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

/// Tracks line/column as bytes of a source are consumed. Used by the lexer
/// and scanner so that every emitted token/fragment carries an accurate
/// position without rescanning the buffer from the start each time.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    file_id: u32,
    offset: usize,
    line: u32,
    column: u32,
}

impl PositionTracker {
    pub fn new(file_id: u32) -> Self {
        PositionTracker { file_id, offset: 0, line: 1, column: 1 }
    }

    pub fn pos(&self) -> SourcePos {
        SourcePos { file_id: self.file_id, offset: self.offset, line: self.line, column: self.column }
    }

    /// Advance the tracker past `ch`, updating line/column. CR is treated as
    /// part of a CRLF pair and does not itself advance the line; LF does.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else if ch != '\r' {
            self.column += 1;
        }
    }

    pub fn advance_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.advance(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_lines_and_columns() {
        let mut t = PositionTracker::new(0);
        t.advance_str("ab\ncd");
        let pos = t.pos();
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(pos.offset, 5);
    }

    #[test]
    fn crlf_only_advances_line_once() {
        let mut t = PositionTracker::new(0);
        t.advance_str("a\r\nb");
        assert_eq!(t.pos().line, 2);
    }

    #[test]
    fn span_disjointness() {
        let a = SourceSpan::new(
            SourcePos { file_id: 0, offset: 0, line: 1, column: 1 },
            SourcePos { file_id: 0, offset: 5, line: 1, column: 6 },
        );
        let b = SourceSpan::new(
            SourcePos { file_id: 0, offset: 5, line: 1, column: 6 },
            SourcePos { file_id: 0, offset: 10, line: 1, column: 11 },
        );
        assert!(a.is_disjoint_from(&b));
    }
}
