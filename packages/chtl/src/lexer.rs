//! CHTL lexer. Tokenizes a single CHTL fragment's text into the
//! [`Token`] stream consumed by the parser.
//!
//! Two things make this lexer parser-driven rather than a flat
//! tokenize-then-parse pass: `UnquotedLiteral` is only a bareword in the
//! value position after `:`/`=`, and its terminator (`;`, `,`, or the
//! enclosing `}`) isn't knowable without that context. The parser calls
//! [`Lexer::next_value_token`] instead of [`Lexer::next_token`] whenever it
//! has just consumed a `:` or `=`.

use crate::source::{PositionTracker, SourceSpan};
use crate::token::{CommentKind, Keyword, Marker, Punctuation, Token, TokenKind};

/// Whitespace the lexer skips between tokens. CHTL has no significant
/// indentation, so this is the full Unicode `White_Space` set plus NBSP
/// (stylesheets copy-pasted from design tools bring it in around `:`/`;`).
fn is_chtl_whitespace(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{00A0}'
}

/// Digits accepted in a number literal and in the decimal/exponent tails
/// `lex_number` scans one character at a time.
fn is_ascii_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// `\n`/`\r` — where a line/dash/generator comment or an unterminated
/// literal stops, since CHTL comments and dash-comments never span lines.
fn ends_line(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// First character of a bare identifier, keyword, or type-tag name.
/// `$` is included because CHTL variable-template references
/// (`ThemeColor(tableColor)`-style interpolation slots) lex as ordinary
/// identifiers that happen to start with `$` in some CHTL dialects'
/// source; keeping it here means `lex_word` doesn't need a special case.
fn starts_identifier(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

/// Non-leading identifier character. Note this is deliberately narrower
/// than `lex_word`'s own accept set: `lex_word` additionally allows `-`
/// so that hyphenated CSS-style property names (`font-size`) lex as one
/// identifier instead of three tokens.
fn continues_identifier(ch: char) -> bool {
    starts_identifier(ch) || is_ascii_digit(ch)
}

pub struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    offset: usize,
    pos: PositionTracker,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, file_id: u32) -> Self {
        Lexer { src, chars: src.chars().peekable(), offset: 0, pos: PositionTracker::new(file_id) }
    }

    pub fn position(&self) -> crate::source::SourcePos {
        self.pos.pos()
    }

    pub fn byte_offset(&self) -> usize {
        self.offset
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Forward-only seek to a byte offset, used after a caller has located
    /// a raw span (e.g. a matching `}`) by inspecting the source directly.
    pub fn seek_to(&mut self, byte_offset: usize) {
        while self.offset < byte_offset {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_at(&self, byte_offset: usize) -> Option<char> {
        self.src.get(byte_offset..)?.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        self.pos.advance(c);
        Some(c)
    }

    fn cur_offset(&mut self) -> usize {
        self.offset
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if is_chtl_whitespace(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn span_from(&mut self, start: crate::source::SourcePos) -> SourceSpan {
        SourceSpan::new(start, self.position())
    }

    /// Read the next structural token. Comments are returned as tokens
    /// rather than skipped, so generator comments (`-->`) survive into the
    /// AST untouched.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position();
        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, self.span_from(start)));
        };

        if c == '/' {
            let off = self.cur_offset();
            let next = self.peek_at(off + 1);
            if next == Some('/') {
                return self.lex_line_comment(start);
            }
            if next == Some('*') {
                return self.lex_block_comment(start);
            }
        }
        if c == '-' {
            let off = self.cur_offset();
            if self.peek_at(off + 1) == Some('-') {
                if self.peek_at(off + 2) == Some('>') {
                    return self.lex_generator_comment(start);
                }
                return self.lex_dash_comment(start);
            }
        }
        if c == '[' {
            if let Some(tok) = self.try_lex_marker(start) {
                return Ok(tok);
            }
        }
        if c == '@' {
            return self.lex_type_tag(start);
        }
        if c == '"' || c == '\'' {
            return self.lex_string(start, c);
        }
        if is_ascii_digit(c) || (c == '+' || c == '-') && self.looks_like_number() {
            return self.lex_number(start);
        }
        if starts_identifier(c) {
            return self.lex_word(start);
        }

        if let Some(p) = self.match_punctuation(c) {
            self.bump();
            return Ok(Token::new(TokenKind::Punctuation(p), self.span_from(start)));
        }

        // Unrecognized character: consume it as a single-char identifier so
        // the parser can surface a precise diagnostic instead of looping.
        self.bump();
        Ok(Token::new(TokenKind::Identifier(c.to_string()), self.span_from(start)))
    }

    fn looks_like_number(&mut self) -> bool {
        let off = self.cur_offset();
        matches!(self.peek_at(off + 1), Some(d) if is_ascii_digit(d))
    }

    fn match_punctuation(&self, c: char) -> Option<Punctuation> {
        Some(match c {
            '{' => Punctuation::LBrace,
            '}' => Punctuation::RBrace,
            '(' => Punctuation::LParen,
            ')' => Punctuation::RParen,
            '[' => Punctuation::LBracket,
            ']' => Punctuation::RBracket,
            ':' => Punctuation::Colon,
            ';' => Punctuation::Semicolon,
            '=' => Punctuation::Equals,
            ',' => Punctuation::Comma,
            '&' => Punctuation::Ampersand,
            '.' => Punctuation::Dot,
            '#' => Punctuation::Hash,
            _ => return None,
        })
    }

    fn lex_line_comment(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        self.bump(); // '/'
        self.bump(); // '/'
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if ends_line(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Ok(Token::new(TokenKind::Comment(CommentKind::SingleLine, text), self.span_from(start)))
    }

    fn lex_block_comment(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        self.bump(); // '/'
        self.bump(); // '*'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => return Err(LexError::UnterminatedBlockComment),
                Some('*') => {
                    let off = self.cur_offset();
                    if self.peek_at(off + 1) == Some('/') {
                        self.bump();
                        self.bump();
                        break;
                    }
                    text.push('*');
                    self.bump();
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token::new(TokenKind::Comment(CommentKind::MultiLine, text), self.span_from(start)))
    }

    fn lex_dash_comment(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        self.bump(); // '-'
        self.bump(); // '-'
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if ends_line(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Ok(Token::new(TokenKind::Comment(CommentKind::Dash, text.trim().to_string()), self.span_from(start)))
    }

    fn lex_generator_comment(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        self.bump();
        self.bump();
        self.bump(); // '-', '-', '>'
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if ends_line(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Ok(Token::new(TokenKind::Comment(CommentKind::Generator, text.trim().to_string()), self.span_from(start)))
    }

    fn try_lex_marker(&mut self, start: crate::source::SourcePos) -> Option<Token> {
        let off = self.cur_offset();
        let rest = &self.src[off..];
        let close = rest.find(']')?;
        let name = &rest[1..close];
        if !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let marker = Marker::from_str(name)?;
        for _ in 0..=close {
            self.bump();
        }
        Some(Token::new(TokenKind::Marker(marker), self.span_from(start)))
    }

    fn lex_type_tag(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        self.bump(); // '@'
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if continues_identifier(c) {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(Token::new(TokenKind::TypeTag(name), self.span_from(start)))
    }

    fn lex_string(&mut self, start: crate::source::SourcePos, quote: char) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => return Err(LexError::UnterminatedString),
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    if let Some(escaped) = self.peek_char() {
                        text.push(escaped);
                        self.bump();
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token::new(TokenKind::StringLiteral(text), self.span_from(start)))
    }

    /// Numbers: signed decimal, optional fraction, optional scientific
    /// exponent. A trailing unit (`px`, `em`, ...) is left for the
    /// subsequent `UnquotedLiteral` to pick up.
    fn lex_number(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        let mut text = String::new();
        if matches!(self.peek_char(), Some('+') | Some('-')) {
            text.push(self.bump().unwrap());
        }
        while let Some(c) = self.peek_char() {
            if is_ascii_digit(c) {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.') {
            let off = self.cur_offset();
            if matches!(self.peek_at(off + 1), Some(d) if is_ascii_digit(d)) {
                text.push('.');
                self.bump();
                while let Some(c) = self.peek_char() {
                    if is_ascii_digit(c) {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let off = self.cur_offset();
            let mut look = off + 1;
            let mut has_sign = false;
            if matches!(self.peek_at(look), Some('+') | Some('-')) {
                has_sign = true;
                look += 1;
            }
            if matches!(self.peek_at(look), Some(d) if is_ascii_digit(d)) {
                text.push(self.bump().unwrap()); // e/E
                if has_sign {
                    text.push(self.bump().unwrap());
                }
                while let Some(c) = self.peek_char() {
                    if is_ascii_digit(c) {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(Token::new(TokenKind::Number(text), self.span_from(start)))
    }

    fn lex_word(&mut self, start: crate::source::SourcePos) -> Result<Token, LexError> {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if continues_identifier(c) || c == '-' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match Keyword::from_str(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(text),
        };
        Ok(Token::new(kind, self.span_from(start)))
    }

    /// Read a value-position token: a quoted string keeps its usual
    /// semantics, anything else is collected as an `UnquotedLiteral` up to
    /// (but not including) `;`, `,`, or `}`.
    pub fn next_value_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position();
        match self.peek_char() {
            None => Ok(Token::new(TokenKind::Eof, self.span_from(start))),
            Some('"') | Some('\'') => {
                let q = self.peek_char().unwrap();
                self.lex_string(start, q)
            }
            Some(_) => {
                let mut text = String::new();
                while let Some(c) = self.peek_char() {
                    if c == ';' || c == ',' || c == '}' {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
                let trimmed = text.trim_end();
                Ok(Token::new(TokenKind::UnquotedLiteral(trimmed.to_string()), self.span_from(start)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lx = Lexer::new(src, 0);
        let mut out = Vec::new();
        loop {
            let tok = lx.next_token().unwrap();
            if tok.is_eof() {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn lexes_marker_and_type_tag() {
        let toks = kinds("[Template] @Style Base");
        assert_eq!(
            toks,
            vec![
                TokenKind::Marker(Marker::Template),
                TokenKind::TypeTag("Style".into()),
                TokenKind::Identifier("Base".into()),
            ]
        );
    }

    #[test]
    fn lexes_number_without_trailing_unit() {
        let mut lx = Lexer::new("24px", 0);
        let num = lx.next_token().unwrap();
        assert_eq!(num.kind, TokenKind::Number("24".into()));
    }

    #[test]
    fn dash_comment_is_its_own_kind() {
        let toks = kinds("-- hello world");
        assert_eq!(toks, vec![TokenKind::Comment(CommentKind::Dash, "hello world".into())]);
    }

    #[test]
    fn scientific_number() {
        let mut lx = Lexer::new("-1.5e-3", 0);
        let tok = lx.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Number("-1.5e-3".into()));
    }

    #[test]
    fn unterminated_string_errors() {
        let mut lx = Lexer::new("\"abc", 0);
        assert!(matches!(lx.next_token(), Err(LexError::UnterminatedString)));
    }

    #[test]
    fn value_token_reads_unquoted_literal_up_to_semicolon() {
        let mut lx = Lexer::new(" #08f; next", 0);
        let tok = lx.next_value_token().unwrap();
        assert_eq!(tok.kind, TokenKind::UnquotedLiteral("#08f".into()));
    }
}
