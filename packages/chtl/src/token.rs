//! The CHTL token model.

use crate::source::SourceSpan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Punctuation {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Equals,
    Comma,
    Ampersand,
    Dot,
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Text,
    Style,
    Script,
    Inherit,
    Delete,
    Insert,
    After,
    Before,
    Replace,
    At,
    Top,
    Bottom,
    Except,
    From,
    As,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        Some(match s {
            "text" => Keyword::Text,
            "style" => Keyword::Style,
            "script" => Keyword::Script,
            "inherit" => Keyword::Inherit,
            "delete" => Keyword::Delete,
            "insert" => Keyword::Insert,
            "after" => Keyword::After,
            "before" => Keyword::Before,
            "replace" => Keyword::Replace,
            "at" => Keyword::At,
            "top" => Keyword::Top,
            "bottom" => Keyword::Bottom,
            "except" => Keyword::Except,
            "from" => Keyword::From,
            "as" => Keyword::As,
            _ => return None,
        })
    }
}

/// A `[Xxx]` bracketed marker that opens a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Template,
    Custom,
    Origin,
    Import,
    Namespace,
    Configuration,
    Info,
}

impl Marker {
    pub fn from_str(s: &str) -> Option<Marker> {
        Some(match s {
            "Template" => Marker::Template,
            "Custom" => Marker::Custom,
            "Origin" => Marker::Origin,
            "Import" => Marker::Import,
            "Namespace" => Marker::Namespace,
            "Configuration" => Marker::Configuration,
            "Info" => Marker::Info,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    SingleLine,
    MultiLine,
    /// `--` contextual comment, lowered by context during semantic transforms.
    Dash,
    /// `-->` generator comment preserved verbatim into HTML output.
    Generator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Punctuation(Punctuation),
    Keyword(Keyword),
    Marker(Marker),
    /// `@Html`, `@Style`, `@Element`, or any user-introduced `@Name`.
    TypeTag(String),
    Identifier(String),
    Number(String),
    StringLiteral(String),
    UnquotedLiteral(String),
    Comment(CommentKind, String),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan) -> Self {
        Token { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn punct(&self) -> Option<Punctuation> {
        match self.kind {
            TokenKind::Punctuation(p) => Some(p),
            _ => None,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }
}
