//! Recursive-descent parser: token stream to AST, driving symbol
//! registration as it goes.
//!
//! The grammar is not pre-tokenized into a buffer; the parser pulls one
//! token of lookahead from the lexer at a time, except where a construct
//! needs raw, unparsed text (`script { ... }`, `[Origin] ... { ... }`), in
//! which case it locates the matching `}` directly in the source and seeks
//! the lexer past it.

use crate::ast::{
    Ast, Attribute, Combinator, DeleteKind, DeleteTarget, ExceptMode, ImportKind, InsertPosition,
    NodeId, NodeKind, OriginKind, PropertyOverride, SelectorKind, StyleValueKind, TemplateKind,
};
use crate::diagnostics::{DiagnosticBag, Phase};
use crate::lexer::Lexer;
use crate::scanner::find_matching_brace;
use crate::source::SourceSpan;
use crate::symbol::{SymbolEntry, SymbolKind, SymbolTable};
use crate::token::{Keyword, Marker, Punctuation, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    Strict,
    Recovering,
}

/// Whether a bare `ident IndexAccess?` delete target names a style
/// property or a child element; the grammar is identical in both
/// positions so the caller supplies which one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteContext {
    Style,
    Element,
}

pub struct Parser<'a, 's> {
    lexer: Lexer<'a>,
    cur: Token,
    file_id: u32,
    mode: ParserMode,
    ast: Ast,
    diags: DiagnosticBag,
    symbols: &'s mut SymbolTable,
    namespace_path: Vec<String>,
}

impl<'a, 's> Parser<'a, 's> {
    pub fn parse(
        src: &'a str,
        file_id: u32,
        mode: ParserMode,
        max_errors: Option<usize>,
        symbols: &'s mut SymbolTable,
    ) -> (Ast, DiagnosticBag) {
        let mut lexer = Lexer::new(src, file_id);
        let cur = Self::lex_next(&mut lexer, &mut DiagnosticBag::new(max_errors));
        let mut parser = Parser {
            lexer,
            cur,
            file_id,
            mode,
            ast: Ast::new(),
            diags: DiagnosticBag::new(max_errors),
            symbols,
            namespace_path: Vec::new(),
        };
        parser.run();
        (parser.ast, parser.diags)
    }

    fn run(&mut self) {
        let root = self.ast.root;
        let mut children = Vec::new();
        while !self.cur.is_eof() && !self.diags.halted() {
            match self.parse_top_level(root) {
                Some(id) => children.push(id),
                None => self.recover_or_halt(),
            }
        }
        self.ast.get_mut(root).kind = NodeKind::Program { children };
    }

    // ---- token plumbing ----------------------------------------------

    fn lex_next(lexer: &mut Lexer<'a>, diags: &mut DiagnosticBag) -> Token {
        match lexer.next_token() {
            Ok(tok) => tok,
            Err(err) => {
                diags.error(lexer.position(), err.to_string(), Phase::Scanning);
                Token::new(TokenKind::Eof, SourceSpan::new(lexer.position(), lexer.position()))
            }
        }
    }

    fn bump(&mut self) -> Token {
        let next = Self::lex_next(&mut self.lexer, &mut self.diags);
        std::mem::replace(&mut self.cur, next)
    }

    fn bump_value(&mut self) -> Token {
        let next = match self.lexer.next_value_token() {
            Ok(tok) => tok,
            Err(err) => {
                self.diags.error(self.lexer.position(), err.to_string(), Phase::Scanning);
                Token::new(TokenKind::Eof, SourceSpan::new(self.lexer.position(), self.lexer.position()))
            }
        };
        std::mem::replace(&mut self.cur, next)
    }

    /// Call with `cur` still holding the unconsumed `:`/`='`/`{` that opens a
    /// value position. Discards it and re-lexes the following text as a
    /// bareword/string value, leaving `cur` on the token that follows the
    /// value (so a later `eat_punct` for `;`/`}` works normally). Using
    /// `bump` here instead would already have mis-tokenized the value's
    /// first character (e.g. splitting `#08f` into `#` and `08f`), since
    /// `next_token` doesn't know it is about to read a bareword value.
    fn consume_value(&mut self) -> String {
        self.bump_value();
        let text = match &self.cur.kind {
            TokenKind::StringLiteral(s) => s.clone(),
            TokenKind::UnquotedLiteral(s) => s.clone(),
            other => format!("{:?}", other),
        };
        self.bump();
        text
    }

    /// Lookahead from the current (unconsumed) `:`/`=` to tell whether the
    /// value is a call (`Name(...)`) rather than a bareword/string literal.
    /// Calls need structural tokenization to capture their arguments; plain
    /// values need the bareword reader to capture units, hex colors, etc.
    fn value_looks_like_call(&self) -> bool {
        let mut probe = Lexer::new(self.lexer.source(), self.file_id);
        probe.seek_to(self.lexer.byte_offset());
        let Ok(first) = probe.next_token() else { return false };
        if !matches!(first.kind, TokenKind::Identifier(_)) {
            return false;
        }
        matches!(probe.next_token(), Ok(Token { kind: TokenKind::Punctuation(Punctuation::LParen), .. }))
    }

    /// Like [`Self::value_looks_like_call`]: peeks past the current
    /// unconsumed delimiter to see whether the value is a quoted string,
    /// which tokenizes identically whether read structurally or as a
    /// bareword value.
    fn peek_is_string_literal(&self) -> bool {
        let mut probe = Lexer::new(self.lexer.source(), self.file_id);
        probe.seek_to(self.lexer.byte_offset());
        matches!(probe.next_token(), Ok(Token { kind: TokenKind::StringLiteral(_), .. }))
    }

    fn at_punct(&self, p: Punctuation) -> bool {
        self.cur.punct() == Some(p)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        self.cur.keyword() == Some(k)
    }

    fn eat_punct(&mut self, p: Punctuation, what: &str) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            let pos = self.cur.span.start;
            self.diags.error(pos, format!("expected {}", what), Phase::Parsing);
            false
        }
    }

    fn eat_keyword(&mut self, k: Keyword, what: &str) -> bool {
        if self.at_keyword(k) {
            self.bump();
            true
        } else {
            let pos = self.cur.span.start;
            self.diags.error(pos, format!("expected {}", what), Phase::Parsing);
            false
        }
    }

    fn ident(&mut self) -> Option<String> {
        match &self.cur.kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            TokenKind::Keyword(_) => {
                // Keywords are reserved words, but still valid bare
                // identifiers in tag/attribute-name position (e.g. `top`
                // used as a CSS property name).
                let text = format!("{:?}", self.cur.kind).to_lowercase();
                self.bump();
                Some(text)
            }
            _ => {
                let pos = self.cur.span.start;
                self.diags.error(pos, "expected identifier", Phase::Parsing);
                None
            }
        }
    }

    fn type_tag(&mut self) -> Option<String> {
        match &self.cur.kind {
            TokenKind::TypeTag(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => {
                let pos = self.cur.span.start;
                self.diags.error(pos, "expected a type tag (@Name)", Phase::Parsing);
                None
            }
        }
    }

    fn string_literal(&mut self) -> Option<String> {
        match &self.cur.kind {
            TokenKind::StringLiteral(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => {
                let pos = self.cur.span.start;
                self.diags.error(pos, "expected a string literal", Phase::Parsing);
                None
            }
        }
    }

    fn template_kind_of(tag: &str) -> Option<TemplateKind> {
        match tag {
            "Style" => Some(TemplateKind::Style),
            "Element" => Some(TemplateKind::Element),
            "Var" => Some(TemplateKind::Var),
            _ => None,
        }
    }

    fn at_sync_point(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::Marker(_) | TokenKind::Eof
        ) || self.at_punct(Punctuation::RBrace)
            || matches!(&self.cur.kind, TokenKind::Identifier(name) if is_html_tag(name))
    }

    fn synchronize(&mut self) {
        self.bump();
        while !self.at_sync_point() {
            self.bump();
        }
    }

    /// Recovery step taken after a construct fails to parse: in recovering
    /// mode, synchronize to the next marker and keep going; in strict mode,
    /// halt the pipeline on the spot instead.
    fn recover_or_halt(&mut self) {
        if self.mode == ParserMode::Strict {
            self.diags.halt();
        } else {
            self.synchronize();
        }
    }

    // ---- top level ------------------------------------------------------

    fn parse_top_level(&mut self, parent: NodeId) -> Option<NodeId> {
        match &self.cur.kind {
            TokenKind::Marker(Marker::Template) => self.parse_template_or_custom_decl(parent, false),
            TokenKind::Marker(Marker::Custom) => self.parse_template_or_custom_decl(parent, true),
            TokenKind::Marker(Marker::Origin) => self.parse_origin_decl(parent),
            TokenKind::Marker(Marker::Import) => self.parse_import(parent),
            TokenKind::Marker(Marker::Namespace) => self.parse_namespace(parent),
            TokenKind::Marker(Marker::Configuration) => self.parse_configuration(parent),
            TokenKind::Comment(kind, text) => {
                let kind = comment_kind_from_token(*kind);
                let text = text.clone();
                let span = self.cur.span;
                self.bump();
                Some(self.ast.insert(NodeKind::Comment { kind, text }, span, parent))
            }
            TokenKind::Identifier(_) => self.parse_element(parent),
            _ => {
                let pos = self.cur.span.start;
                self.diags.error(pos, "unexpected token at top level", Phase::Parsing);
                None
            }
        }
    }

    // ---- Element ----------------------------------------------------

    fn parse_element(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        let tag = self.ident()?;
        let index = self.parse_optional_index();

        if !self.at_punct(Punctuation::LBrace) {
            let span = self.span_from(start);
            return Some(self.ast.insert(
                NodeKind::Element { tag, index, attrs: Vec::new(), children: Vec::new() },
                span,
                parent,
            ));
        }
        self.bump(); // '{'

        let id = self.ast.insert(
            NodeKind::Element { tag: tag.clone(), index, attrs: Vec::new(), children: Vec::new() },
            self.span_from(start),
            parent,
        );
        let mut attrs = Vec::new();
        let mut children = Vec::new();

        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            if self.looks_like_attribute() {
                if let Some(attr) = self.parse_attribute() {
                    attrs.push(attr);
                }
                continue;
            }
            match self.parse_element_child(id) {
                Some(child) => children.push(child),
                None => self.recover_or_halt(),
            }
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close element");
        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData {
            kind: NodeKind::Element { tag, index, attrs, children },
            span,
        };
        Some(id)
    }

    fn parse_optional_index(&mut self) -> Option<usize> {
        if self.at_punct(Punctuation::LBracket) {
            self.bump();
            let idx = match &self.cur.kind {
                TokenKind::Number(n) => n.parse::<usize>().ok(),
                _ => None,
            };
            self.bump();
            self.eat_punct(Punctuation::RBracket, "']' to close index access");
            idx
        } else {
            None
        }
    }

    /// `ident (':'|'=') ...` distinguishes an attribute from a child
    /// element, which is `ident ('['...']')? '{'` or a bare `ident ';'`.
    fn looks_like_attribute(&mut self) -> bool {
        matches!(&self.cur.kind, TokenKind::Identifier(_))
            && matches!(self.peek_second_kind(), Some(TokenKind::Punctuation(Punctuation::Colon)) | Some(TokenKind::Punctuation(Punctuation::Equals)))
    }

    /// One-token-of-extra lookahead without disturbing `self.cur`: clone the
    /// lexer's remaining-source state implicitly by re-lexing from a saved
    /// offset. Cheap because attribute/child disambiguation only needs the
    /// token immediately after the current identifier.
    fn peek_second_kind(&self) -> Option<TokenKind> {
        let save_offset = self.lexer.byte_offset();
        let mut probe = Lexer::new(self.lexer.source(), self.file_id);
        probe.seek_to(save_offset);
        probe.next_token().ok().map(|t| t.kind)
    }

    fn parse_attribute(&mut self) -> Option<Attribute> {
        let name = self.ident()?;
        let uses_ce_equality = self.at_punct(Punctuation::Equals);
        if !(self.at_punct(Punctuation::Colon) || uses_ce_equality) {
            let pos = self.cur.span.start;
            self.diags.error(pos, "expected ':' or '=' in attribute", Phase::Parsing);
            return None;
        }
        let value = self.consume_value();
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        Some(Attribute { name, value, uses_ce_equality })
    }

    fn parse_element_child(&mut self, parent: NodeId) -> Option<NodeId> {
        match &self.cur.kind {
            TokenKind::Keyword(Keyword::Text) => self.parse_text_block(parent),
            TokenKind::Keyword(Keyword::Style) => self.parse_style_block(parent, true),
            TokenKind::Keyword(Keyword::Script) => self.parse_script_block(parent, true),
            TokenKind::Keyword(Keyword::Inherit) => self.parse_inherit(parent),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(parent, DeleteContext::Element),
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert(parent),
            TokenKind::Keyword(Keyword::Except) => self.parse_except(parent),
            TokenKind::Comment(kind, text) => {
                let kind = comment_kind_from_token(*kind);
                let text = text.clone();
                let span = self.cur.span;
                self.bump();
                Some(self.ast.insert(NodeKind::Comment { kind, text }, span, parent))
            }
            TokenKind::Identifier(name) if self.peek_second_kind() == Some(TokenKind::Punctuation(Punctuation::LParen)) => {
                let name = name.clone();
                self.parse_template_use(parent, name, TemplateKind::Element)
            }
            TokenKind::Identifier(_) => self.parse_element(parent),
            _ => {
                let pos = self.cur.span.start;
                self.diags.error(pos, "unexpected token inside element body", Phase::Parsing);
                None
            }
        }
    }

    fn parse_text_block(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'text'
        if !self.at_punct(Punctuation::LBrace) {
            let pos = self.cur.span.start;
            self.diags.error(pos, "expected '{' after text", Phase::Parsing);
            return None;
        }
        let content = if self.peek_is_string_literal() {
            self.bump(); // '{'; cur becomes the string literal
            match &self.cur.kind {
                TokenKind::StringLiteral(s) => {
                    let s = s.clone();
                    self.bump();
                    s
                }
                _ => unreachable!(),
            }
        } else {
            self.consume_value()
        };
        self.eat_punct(Punctuation::RBrace, "'}' to close text block");
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::TextBlock { content }, span, parent))
    }

    // ---- TemplateUse / VariableReference -----------------------------

    /// `ident '(' ')'` optionally followed by a specialization block. The
    /// block's presence is the only syntactic signal that this is a
    /// Custom use (plain Templates never carry one); the symbol table
    /// cross-check during expansion catches a mismatch.
    fn parse_template_use(&mut self, parent: NodeId, name: String, kind: TemplateKind) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // ident
        self.eat_punct(Punctuation::LParen, "'(' in template use");
        self.eat_punct(Punctuation::RParen, "')' in template use");

        let id = self.ast.insert(
            NodeKind::TemplateUse {
                kind,
                name: name.clone(),
                is_custom: false,
                namespace: None,
                overrides: Vec::new(),
                specialization: None,
            },
            self.span_from(start),
            parent,
        );

        if self.at_punct(Punctuation::LBrace) {
            let delete_ctx = match kind {
                TemplateKind::Style => DeleteContext::Style,
                TemplateKind::Element | TemplateKind::Var => DeleteContext::Element,
            };
            let spec = self.parse_specialization(id, delete_ctx)?;
            let (overrides, is_custom) = match self.ast.kind(spec) {
                NodeKind::Specialization { overrides, .. } => (overrides.clone(), true),
                _ => (Vec::new(), true),
            };
            let span = self.span_from(start);
            *self.ast.get_mut(id) = crate::ast::NodeData {
                kind: NodeKind::TemplateUse {
                    kind,
                    name,
                    is_custom,
                    namespace: None,
                    overrides,
                    specialization: Some(spec),
                },
                span,
            };
        }
        Some(id)
    }

    /// Specialization bodies mix property overrides (`name: value;`),
    /// `delete`/`insert` statements, and nested elements/template uses
    /// refining a Custom's cloned body.
    fn parse_specialization(&mut self, parent: NodeId, delete_ctx: DeleteContext) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // '{'
        let id = self.ast.insert(
            NodeKind::Specialization { children: Vec::new(), overrides: Vec::new(), deletions: Vec::new() },
            self.span_from(start),
            parent,
        );
        let mut children = Vec::new();
        let mut overrides = Vec::new();
        let mut deletions = Vec::new();

        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            match &self.cur.kind {
                TokenKind::Keyword(Keyword::Delete) => {
                    self.bump();
                    deletions.extend(self.parse_delete_targets(delete_ctx));
                    if self.at_punct(Punctuation::Semicolon) {
                        self.bump();
                    }
                }
                TokenKind::Keyword(Keyword::Insert) => {
                    if let Some(ins) = self.parse_insert(id) {
                        children.push(ins);
                    }
                }
                TokenKind::Identifier(name)
                    if matches!(self.peek_second_kind(), Some(TokenKind::Punctuation(Punctuation::Colon)) | Some(TokenKind::Punctuation(Punctuation::Equals))) =>
                {
                    let name = name.clone();
                    self.bump(); // name; cur is now the unconsumed ':'/'='
                    let vstart = self.cur.span.start;
                    let text = self.consume_value();
                    if self.at_punct(Punctuation::Semicolon) {
                        self.bump();
                    }
                    let vspan = self.span_from(vstart);
                    let value_id = self.ast.insert(
                        NodeKind::StyleValue { kind: StyleValueKind::Literal, value: text, args: Vec::new() },
                        vspan,
                        id,
                    );
                    overrides.push(PropertyOverride { name, value: value_id });
                }
                TokenKind::Identifier(name) if self.peek_second_kind() == Some(TokenKind::Punctuation(Punctuation::LParen)) => {
                    let name = name.clone();
                    if let Some(tu) = self.parse_template_use(id, name, TemplateKind::Element) {
                        children.push(tu);
                    }
                }
                TokenKind::Identifier(_) => {
                    if let Some(el) = self.parse_element(id) {
                        children.push(el);
                    }
                }
                _ => {
                    let pos = self.cur.span.start;
                    self.diags.error(pos, "unexpected token inside specialization", Phase::Parsing);
                    self.bump();
                }
            }
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close specialization");
        let span = self.span_from(start);
        *self.ast.get_mut(id) =
            crate::ast::NodeData { kind: NodeKind::Specialization { children, overrides, deletions }, span };
        Some(id)
    }

    // ---- Style ----------------------------------------------------------

    fn parse_style_block(&mut self, parent: NodeId, is_local: bool) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'style'
        self.eat_punct(Punctuation::LBrace, "'{' after style");
        let id = self.ast.insert(NodeKind::StyleBlock { is_local, children: Vec::new() }, self.span_from(start), parent);
        let mut children = Vec::new();

        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            if let Some(child) = self.parse_style_content_item(id) {
                children.push(child);
            } else {
                self.bump();
            }
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close style block");
        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData { kind: NodeKind::StyleBlock { is_local, children }, span };
        Some(id)
    }

    fn parse_style_content_item(&mut self, parent: NodeId) -> Option<NodeId> {
        match &self.cur.kind {
            TokenKind::Keyword(Keyword::Inherit) => self.parse_inherit(parent),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(parent, DeleteContext::Style),
            TokenKind::Identifier(name) if self.peek_second_kind() == Some(TokenKind::Punctuation(Punctuation::LParen)) => {
                let name = name.clone();
                self.parse_template_use(parent, name, TemplateKind::Style)
            }
            TokenKind::Comment(kind, text) => {
                let kind = comment_kind_from_token(*kind);
                let text = text.clone();
                let span = self.cur.span;
                self.bump();
                Some(self.ast.insert(NodeKind::Comment { kind, text }, span, parent))
            }
            _ if self.looks_like_selector_start() => self.parse_style_rule(parent),
            TokenKind::Identifier(_) => self.parse_style_property(parent),
            _ => None,
        }
    }

    fn looks_like_selector_start(&self) -> bool {
        self.at_punct(Punctuation::Dot)
            || self.at_punct(Punctuation::Hash)
            || self.at_punct(Punctuation::Ampersand)
            || matches!(self.cur.kind, TokenKind::Punctuation(Punctuation::Colon))
    }

    fn parse_style_rule(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        let id = self.ast.insert(
            NodeKind::StyleRule { selector: 0, properties: Vec::new() },
            self.span_from(start),
            parent,
        );
        let selector = self.parse_selector_chain(id)?;
        self.eat_punct(Punctuation::LBrace, "'{' to open style rule body");
        let mut properties = Vec::new();
        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            let item = match &self.cur.kind {
                TokenKind::Keyword(Keyword::Inherit) => self.parse_inherit(id),
                TokenKind::Keyword(Keyword::Delete) => self.parse_delete(id, DeleteContext::Style),
                TokenKind::Identifier(name) if self.peek_second_kind() == Some(TokenKind::Punctuation(Punctuation::LParen)) => {
                    let name = name.clone();
                    self.parse_template_use(id, name, TemplateKind::Style)
                }
                TokenKind::Identifier(_) => self.parse_style_property(id),
                _ => None,
            };
            match item {
                Some(n) => properties.push(n),
                None => { self.bump(); }
            };
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close style rule");
        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData { kind: NodeKind::StyleRule { selector, properties }, span };
        Some(id)
    }

    /// A single simple selector, optionally chained through a combinator
    /// to a right-hand selector (right-recursive, so `a > b c` nests as
    /// `Combinator(a, Combinator(b, c))`... modeled here single-level deep
    /// per parse call, extended by recursion in `rhs`).
    fn parse_selector_chain(&mut self, parent: NodeId) -> Option<NodeId> {
        let left = self.parse_simple_selector(parent)?;
        if let Some(combinator) = self.peek_combinator() {
            self.consume_combinator(combinator);
            let right = self.parse_selector_chain(parent)?;
            let span = self.ast.get(left).span;
            return Some(self.ast.insert(
                NodeKind::StyleSelector {
                    kind: SelectorKind::Combinator,
                    value: String::new(),
                    combinator: Some(combinator),
                    left: Some(left),
                    right: Some(right),
                },
                span,
                parent,
            ));
        }
        Some(left)
    }

    fn peek_combinator(&self) -> Option<Combinator> {
        match &self.cur.kind {
            TokenKind::Identifier(s) if s == ">" => Some(Combinator::Child),
            TokenKind::Identifier(s) if s == "+" => Some(Combinator::AdjacentSibling),
            TokenKind::Identifier(s) if s == "~" => Some(Combinator::GeneralSibling),
            _ if self.looks_like_selector_start() || matches!(self.cur.kind, TokenKind::Identifier(_)) => {
                Some(Combinator::Descendant)
            }
            _ => None,
        }
    }

    fn consume_combinator(&mut self, combinator: Combinator) {
        if combinator != Combinator::Descendant {
            self.bump();
        }
    }

    fn parse_simple_selector(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        if self.at_punct(Punctuation::Dot) {
            self.bump();
            let name = self.ident()?;
            let span = self.span_from(start);
            return Some(self.ast.insert(
                NodeKind::StyleSelector { kind: SelectorKind::Class, value: name, combinator: None, left: None, right: None },
                span,
                parent,
            ));
        }
        if self.at_punct(Punctuation::Hash) {
            self.bump();
            let name = self.ident()?;
            let span = self.span_from(start);
            return Some(self.ast.insert(
                NodeKind::StyleSelector { kind: SelectorKind::Id, value: name, combinator: None, left: None, right: None },
                span,
                parent,
            ));
        }
        if self.at_punct(Punctuation::Ampersand) {
            self.bump();
            let span = self.span_from(start);
            return Some(self.ast.insert(
                NodeKind::StyleSelector { kind: SelectorKind::Ampersand, value: "&".into(), combinator: None, left: None, right: None },
                span,
                parent,
            ));
        }
        if self.at_punct(Punctuation::Colon) {
            self.bump();
            let double = self.at_punct(Punctuation::Colon);
            if double {
                self.bump();
            }
            let name = self.ident()?;
            let kind = if double { SelectorKind::PseudoElement } else { SelectorKind::PseudoClass };
            let span = self.span_from(start);
            return Some(self.ast.insert(NodeKind::StyleSelector { kind, value: name, combinator: None, left: None, right: None }, span, parent));
        }
        if let TokenKind::Identifier(name) = &self.cur.kind {
            let name = if name == "*" { String::new() } else { name.clone() };
            let kind = if name.is_empty() { SelectorKind::Universal } else { SelectorKind::Element };
            self.bump();
            let span = self.span_from(start);
            return Some(self.ast.insert(NodeKind::StyleSelector { kind, value: name, combinator: None, left: None, right: None }, span, parent));
        }
        let pos = self.cur.span.start;
        self.diags.error(pos, "expected a selector", Phase::Parsing);
        None
    }

    fn parse_style_property(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        let name = self.ident()?;
        if !self.at_punct(Punctuation::Colon) {
            let pos = self.cur.span.start;
            self.diags.error(pos, "expected ':' after property name", Phase::Parsing);
            return None;
        }
        let mut values = Vec::new();
        if self.value_looks_like_call() {
            self.bump(); // ':'; the next real token is an identifier either way
            loop {
                let value = self.parse_style_value(parent)?;
                values.push(value);
                if matches!(&self.cur.kind, TokenKind::Identifier(_) | TokenKind::Number(_) | TokenKind::StringLiteral(_)) {
                    continue;
                }
                break;
            }
        } else {
            let vstart_tok = self.cur.span.start;
            let text = self.consume_value();
            let vspan = self.span_from(vstart_tok);
            values.push(self.ast.insert(
                NodeKind::StyleValue { kind: StyleValueKind::Literal, value: text, args: Vec::new() },
                vspan,
                parent,
            ));
        }
        let mut important = false;
        if let TokenKind::Identifier(s) = &self.cur.kind {
            if s == "important" {
                important = true;
                self.bump();
            }
        }
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::StyleProperty { name, values, important }, span, parent))
    }

    /// A value is a quoted string, a `Name(args)` call (disambiguated
    /// below into a variable reference, `calc`, or a plain CSS function),
    /// or an unquoted literal run up to `;`/`,`/`}`.
    fn parse_style_value(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        if let TokenKind::Identifier(name) = &self.cur.kind {
            let name = name.clone();
            if self.peek_second_kind() == Some(TokenKind::Punctuation(Punctuation::LParen)) {
                self.bump(); // name; cur is now '(' and the lexer sits just past it
                if name == "calc" {
                    let open_idx = self.lexer.byte_offset() - 1;
                    let src = self.lexer.source();
                    let raw = match find_matching_paren(src, open_idx) {
                        Some(close_idx) => {
                            let raw = src[open_idx + 1..close_idx].to_string();
                            self.lexer.seek_to(close_idx);
                            self.bump(); // cur becomes ')'
                            raw
                        }
                        None => {
                            self.diags.error(self.cur.span.start, "unterminated calc(...)", Phase::Parsing);
                            String::new()
                        }
                    };
                    self.eat_punct(Punctuation::RParen, "')' to close calc(...)");
                    let span = self.span_from(start);
                    return Some(self.ast.insert(
                        NodeKind::StyleValue { kind: StyleValueKind::Calc, value: raw.trim().to_string(), args: Vec::new() },
                        span,
                        parent,
                    ));
                }
                self.bump(); // '('
                let args = self.parse_call_args(parent);
                self.eat_punct(Punctuation::RParen, "')' to close function call");
                let span = self.span_from(start);
                if args.len() == 1 && matches!(self.ast.kind(args[0]), NodeKind::StyleValue { kind: StyleValueKind::Literal, .. }) {
                    let entry_name = match self.ast.kind(args[0]) {
                        NodeKind::StyleValue { value, .. } => value.clone(),
                        _ => unreachable!(),
                    };
                    let var_ref = self.ast.insert(
                        NodeKind::VariableReference { group: name, name: entry_name, spec: None },
                        span,
                        parent,
                    );
                    return Some(self.ast.insert(
                        NodeKind::StyleValue { kind: StyleValueKind::Variable, value: String::new(), args: vec![var_ref] },
                        span,
                        parent,
                    ));
                }
                return Some(self.ast.insert(
                    NodeKind::StyleValue { kind: StyleValueKind::Function, value: name, args },
                    span,
                    parent,
                ));
            }
        }
        // Everything else (hex colors, units, multi-word barewords) is read
        // as one bareword run, same as an attribute value.
        let tok = self.bump_value();
        let text = match tok.kind {
            TokenKind::StringLiteral(s) => s,
            TokenKind::UnquotedLiteral(s) => s,
            other => format!("{:?}", other),
        };
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::StyleValue { kind: StyleValueKind::Literal, value: text, args: Vec::new() }, span, parent))
    }

    fn parse_call_args(&mut self, parent: NodeId) -> Vec<NodeId> {
        let mut args = Vec::new();
        while !self.at_punct(Punctuation::RParen) && !self.cur.is_eof() {
            let start = self.cur.span.start;
            let tok = self.bump();
            let text = match tok.kind {
                TokenKind::StringLiteral(s) => s,
                TokenKind::Identifier(s) => s,
                TokenKind::Number(s) => s,
                other => format!("{:?}", other),
            };
            let span = self.span_from(start);
            args.push(self.ast.insert(NodeKind::StyleValue { kind: StyleValueKind::Literal, value: text, args: Vec::new() }, span, parent));
            if self.at_punct(Punctuation::Comma) {
                self.bump();
            }
        }
        args
    }

    // ---- Script -----------------------------------------------------

    /// Raw-captured: once the opening `{` is behind us, the matching `}`
    /// is located directly against the source text rather than by
    /// tokenizing the (possibly non-CHTL) body.
    fn parse_script_block(&mut self, parent: NodeId, is_local: bool) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'script'
        self.eat_punct(Punctuation::LBrace, "'{' after script");
        let open = self.lexer.byte_offset().saturating_sub(1);
        let src = self.lexer.source();
        let Some(close) = find_matching_brace(src, open) else {
            self.diags.error(self.cur.span.start, "unterminated script block", Phase::Parsing);
            return None;
        };
        let content = src[open + 1..close].to_string();
        self.lexer.seek_to(close);
        self.bump(); // '}'
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::ScriptBlock { is_local, content }, span, parent))
    }

    // ---- TemplateDecl / CustomDecl ------------------------------------

    fn parse_template_or_custom_decl(&mut self, parent: NodeId, is_custom: bool) -> Option<NodeId> {
        let start = self.cur.span.start;
        let phase = if is_custom { Phase::CustomParsing } else { Phase::TemplateParsing };
        self.bump(); // marker
        let tag = self.type_tag()?;
        let Some(kind) = Self::template_kind_of(&tag) else {
            self.diags.error(start, format!("unknown template type tag @{}", tag), phase);
            return None;
        };
        let name = self.ident()?;
        self.eat_punct(Punctuation::LBrace, "'{' to open declaration body");

        let id = self.ast.insert(
            if is_custom {
                NodeKind::CustomDecl { kind, name: name.clone(), body: Vec::new() }
            } else {
                NodeKind::TemplateDecl { kind, name: name.clone(), body: Vec::new() }
            },
            self.span_from(start),
            parent,
        );
        let mut body = Vec::new();
        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            let item = match kind {
                TemplateKind::Var => self.parse_variable_entry_as_node(id),
                TemplateKind::Style => match &self.cur.kind {
                    TokenKind::Keyword(Keyword::Inherit) => self.parse_inherit(id),
                    TokenKind::Identifier(_) => self.parse_style_property(id),
                    _ => None,
                },
                TemplateKind::Element => self.parse_element_child(id),
            };
            match item {
                Some(n) => body.push(n),
                None => { self.bump(); }
            }
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close declaration");

        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData {
            kind: if is_custom {
                NodeKind::CustomDecl { kind, name: name.clone(), body }
            } else {
                NodeKind::TemplateDecl { kind, name: name.clone(), body }
            },
            span,
        };

        let symbol_kind = SymbolKind::template(kind, is_custom);
        if let Some(conflict) = self.symbols.add_symbol(
            &self.namespace_path.clone(),
            SymbolEntry { kind: symbol_kind, name: name.clone(), position: start, owning_file: self.file_id, node_id: id },
        ) {
            self.diags.error(
                conflict.incoming,
                format!("duplicate {} '{}' (first declared at {})", symbol_kind, name, conflict.existing),
                phase,
            );
        }
        Some(id)
    }

    fn parse_variable_entry_as_node(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        let name = self.ident()?;
        let value = if self.at_punct(Punctuation::Colon) || self.at_punct(Punctuation::Equals) {
            Some(self.consume_value())
        } else {
            None
        };
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        let span = self.span_from(start);
        let v = value.clone().unwrap_or_default();
        let value_node = self.ast.insert(NodeKind::StyleValue { kind: StyleValueKind::Literal, value: v, args: Vec::new() }, span, parent);
        Some(self.ast.insert(
            NodeKind::StyleProperty {
                name: name.clone(),
                values: vec![value_node],
                important: false,
            },
            span,
            parent,
        ))
    }

    // ---- Origin -----------------------------------------------------

    fn parse_origin_decl(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // '[Origin]'
        let origin_kind = match &self.cur.kind {
            TokenKind::TypeTag(tag) => {
                let tag = tag.clone();
                self.bump();
                match tag.as_str() {
                    "Html" => OriginKind::Html,
                    "Style" => OriginKind::Style,
                    "JavaScript" => OriginKind::JavaScript,
                    other => OriginKind::Custom(other.to_string()),
                }
            }
            TokenKind::Identifier(ident) => {
                let ident = ident.clone();
                self.bump();
                OriginKind::Custom(ident)
            }
            _ => {
                self.diags.error(start, "expected a type tag after [Origin]", Phase::Parsing);
                OriginKind::Custom(String::new())
            }
        };
        let name = match &self.cur.kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => None,
        };
        self.eat_punct(Punctuation::LBrace, "'{' to open origin body");
        let open = self.lexer.byte_offset().saturating_sub(1);
        let src = self.lexer.source();
        let Some(close) = find_matching_brace(src, open) else {
            self.diags.error(self.cur.span.start, "unterminated origin block", Phase::Parsing);
            return None;
        };
        let content = src[open + 1..close].to_string();
        self.lexer.seek_to(close);
        self.bump(); // '}'
        let span = self.span_from(start);
        let id = self.ast.insert(NodeKind::Origin { origin_kind, name: name.clone(), content }, span, parent);
        if let Some(name) = name {
            if let Some(conflict) = self.symbols.add_symbol(
                &self.namespace_path.clone(),
                SymbolEntry { kind: SymbolKind::Origin, name: name.clone(), position: start, owning_file: self.file_id, node_id: id },
            ) {
                self.diags.error(conflict.incoming, format!("duplicate [Origin] '{}'", name), Phase::Parsing);
            }
        }
        Some(id)
    }

    // ---- Import -----------------------------------------------------

    fn parse_import(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // '[Import]'
        let (kind, tag) = match &self.cur.kind {
            TokenKind::TypeTag(tag) => {
                let tag = tag.clone();
                self.bump();
                let kind = match tag.as_str() {
                    "Html" => ImportKind::Html,
                    "Style" => ImportKind::Style,
                    "JavaScript" => ImportKind::JavaScript,
                    "CJmod" => ImportKind::CJmod,
                    _ => ImportKind::Chtl,
                };
                (kind, tag)
            }
            _ => {
                self.diags.error(start, "expected a type tag after [Import]", Phase::Parsing);
                (ImportKind::Chtl, String::new())
            }
        };
        let _ = tag;
        let target = match &self.cur.kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => None,
        };
        self.eat_keyword(Keyword::From, "'from' in import");
        let from_path = self.string_literal().unwrap_or_default();
        let official_prefix = from_path.starts_with("chtl::");
        let as_name = if self.at_keyword(Keyword::As) {
            self.bump();
            self.ident()
        } else {
            None
        };
        let import_list = if self.at_punct(Punctuation::LBrace) {
            self.bump();
            if let TokenKind::Identifier(kw) = &self.cur.kind {
                if kw == "import" {
                    self.bump();
                    self.eat_punct(Punctuation::Colon, "':' after import");
                }
            }
            self.eat_punct(Punctuation::LBracket, "'[' to open import list");
            let mut list = Vec::new();
            while !self.at_punct(Punctuation::RBracket) && !self.cur.is_eof() {
                if let Some(name) = self.ident() {
                    list.push(name);
                }
                if self.at_punct(Punctuation::Comma) {
                    self.bump();
                }
            }
            self.eat_punct(Punctuation::RBracket, "']' to close import list");
            self.eat_punct(Punctuation::RBrace, "'}' to close import block");
            Some(list)
        } else {
            None
        };
        let span = self.span_from(start);
        Some(self.ast.insert(
            NodeKind::Import { kind, target, from_path, as_name, import_list, official_prefix },
            span,
            parent,
        ))
    }

    // ---- Namespace / Configuration ------------------------------------

    fn parse_namespace(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // '[Namespace]'
        let name = self.ident()?;
        self.eat_punct(Punctuation::LBrace, "'{' to open namespace");
        self.symbols.add_namespace(&self.namespace_path, &name);
        self.namespace_path.push(name.clone());

        let id = self.ast.insert(NodeKind::Namespace { name: name.clone(), constraints: Vec::new(), children: Vec::new() }, self.span_from(start), parent);
        let mut constraints = Vec::new();
        let mut children = Vec::new();
        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            if self.at_keyword(Keyword::Except) {
                if let Some(ex) = self.parse_except(id) {
                    constraints.push(ex);
                }
                continue;
            }
            match self.parse_top_level(id) {
                Some(n) => children.push(n),
                None => self.recover_or_halt(),
            }
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close namespace");
        self.namespace_path.pop();
        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData { kind: NodeKind::Namespace { name, constraints, children }, span };
        Some(id)
    }

    fn parse_configuration(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // '[Configuration]'
        let name = match &self.cur.kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.bump();
                Some(s)
            }
            _ => None,
        };
        self.eat_punct(Punctuation::LBrace, "'{' to open configuration");
        let mut entries = Vec::new();
        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            let Some(key) = self.ident() else {
                self.bump();
                continue;
            };
            if !self.at_punct(Punctuation::Colon) {
                let pos = self.cur.span.start;
                self.diags.error(pos, "expected ':' in configuration entry", Phase::Parsing);
                self.bump();
                continue;
            }
            let value = self.consume_value();
            if self.at_punct(Punctuation::Semicolon) {
                self.bump();
            }
            entries.push((key, value));
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close configuration");
        let span = self.span_from(start);
        let id = self.ast.insert(NodeKind::Configuration { name: name.clone(), entries }, span, parent);
        if let Some(name) = name {
            self.symbols.add_symbol(
                &self.namespace_path.clone(),
                SymbolEntry { kind: SymbolKind::Configuration, name, position: start, owning_file: self.file_id, node_id: id },
            );
        }
        Some(id)
    }

    // ---- Inherit / Delete / Insert / Except --------------------------

    fn parse_inherit(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'inherit'
        let tag = self.type_tag()?;
        let target_kind = Self::template_kind_of(&tag).unwrap_or(TemplateKind::Element);
        let target = self.ident()?;
        let namespace = if self.at_keyword(Keyword::From) {
            self.bump();
            self.ident()
        } else {
            None
        };
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::Inherit { target_kind, target, namespace }, span, parent))
    }

    fn parse_delete(&mut self, parent: NodeId, ctx: DeleteContext) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'delete'
        let targets = self.parse_delete_targets(ctx);
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::Delete { targets }, span, parent))
    }

    fn parse_delete_targets(&mut self, ctx: DeleteContext) -> Vec<DeleteTarget> {
        let mut targets = Vec::new();
        loop {
            if let TokenKind::TypeTag(tag) = &self.cur.kind {
                let tag = tag.clone();
                self.bump();
                let template_kind = Self::template_kind_of(&tag);
                if let Some(name) = self.ident() {
                    targets.push(DeleteTarget { kind: DeleteKind::Inheritance, name, template_kind, index: None });
                }
            } else if let Some(name) = self.ident() {
                let index = self.parse_optional_index();
                let kind = match ctx {
                    DeleteContext::Style => DeleteKind::Property,
                    DeleteContext::Element => DeleteKind::Element,
                };
                targets.push(DeleteTarget { kind, name, template_kind: None, index });
            } else {
                break;
            }
            if self.at_punct(Punctuation::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        targets
    }

    fn parse_insert(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'insert'
        let (position, target, target_index) = if self.at_keyword(Keyword::At) {
            self.bump();
            let pos = if self.at_keyword(Keyword::Top) {
                self.bump();
                InsertPosition::AtTop
            } else {
                self.eat_keyword(Keyword::Bottom, "'bottom' after 'at'");
                InsertPosition::AtBottom
            };
            (pos, None, None)
        } else {
            let pos = if self.at_keyword(Keyword::After) {
                self.bump();
                InsertPosition::After
            } else if self.at_keyword(Keyword::Before) {
                self.bump();
                InsertPosition::Before
            } else {
                self.eat_keyword(Keyword::Replace, "'after'/'before'/'replace'/'at' in insert");
                InsertPosition::Replace
            };
            let target = self.ident();
            let index = self.parse_optional_index();
            (pos, target, index)
        };
        self.eat_punct(Punctuation::LBrace, "'{' to open insert body");
        let id = self.ast.insert(
            NodeKind::Insert { position, target: target.clone(), target_index, content: Vec::new() },
            self.span_from(start),
            parent,
        );
        let mut content = Vec::new();
        while !self.at_punct(Punctuation::RBrace) && !self.cur.is_eof() && !self.diags.halted() {
            match self.parse_element(id) {
                Some(el) => content.push(el),
                None => { self.bump(); }
            };
        }
        self.eat_punct(Punctuation::RBrace, "'}' to close insert body");
        let span = self.span_from(start);
        *self.ast.get_mut(id) = crate::ast::NodeData { kind: NodeKind::Insert { position, target, target_index, content }, span };
        Some(id)
    }

    fn parse_except(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.cur.span.start;
        self.bump(); // 'except'
        let mut targets = Vec::new();
        let mut mode = ExceptMode::Precise;
        let mut first = true;
        loop {
            match &self.cur.kind {
                TokenKind::TypeTag(tag) => {
                    if first {
                        mode = ExceptMode::Type;
                    }
                    targets.push(format!("@{}", tag));
                    self.bump();
                }
                TokenKind::Marker(m) => {
                    if first {
                        mode = ExceptMode::Global;
                    }
                    let marker_name = format!("{:?}", m);
                    self.bump();
                    if let TokenKind::TypeTag(tag) = &self.cur.kind {
                        targets.push(format!("[{}] @{}", marker_name, tag));
                        self.bump();
                    } else {
                        targets.push(format!("[{}]", marker_name));
                    }
                }
                TokenKind::Identifier(name) => {
                    targets.push(name.clone());
                    self.bump();
                }
                _ => break,
            }
            first = false;
            if self.at_punct(Punctuation::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        if self.at_punct(Punctuation::Semicolon) {
            self.bump();
        }
        let span = self.span_from(start);
        Some(self.ast.insert(NodeKind::Except { mode, targets }, span, parent))
    }

    fn span_from(&self, start: crate::source::SourcePos) -> SourceSpan {
        SourceSpan::new(start, self.cur.span.start)
    }
}

fn comment_kind_from_token(kind: crate::token::CommentKind) -> crate::ast::CommentKind {
    match kind {
        crate::token::CommentKind::SingleLine => crate::ast::CommentKind::SingleLine,
        crate::token::CommentKind::MultiLine => crate::ast::CommentKind::MultiLine,
        crate::token::CommentKind::Dash => crate::ast::CommentKind::Dash,
        crate::token::CommentKind::Generator => crate::ast::CommentKind::Generator,
    }
}

fn is_html_tag(name: &str) -> bool {
    matches!(
        name,
        "div" | "span" | "p" | "a" | "img" | "ul" | "ol" | "li" | "table" | "tr" | "td" | "th"
            | "header" | "footer" | "main" | "section" | "article" | "nav" | "aside" | "form"
            | "input" | "button" | "label" | "select" | "option" | "textarea" | "h1" | "h2"
            | "h3" | "h4" | "h5" | "h6" | "html" | "head" | "body" | "title" | "meta" | "link"
            | "script" | "style" | "video" | "audio" | "canvas" | "svg" | "iframe" | "br" | "hr"
    )
}

/// Same bracket-matching rules as [`find_matching_brace`] but for parens.
fn find_matching_paren(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0i32;
    let mut i = open;
    let mut in_string: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                in_string = None;
            }
        } else {
            match b {
                b'"' | b'\'' => in_string = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}
