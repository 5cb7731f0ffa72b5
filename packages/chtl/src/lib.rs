#![deny(clippy::all)]

//! CHTL compiler core.
//!
//! This crate owns everything up to the emit boundary: the unified
//! scanner that slices a source file into typed fragments, the CHTL
//! lexer and recursive-descent parser, the symbol/namespace map, the
//! import resolver, the fixed-order semantic transform pipeline, and the
//! CMOD/CJMOD module archive format. It does not generate HTML, CSS, or
//! JS text — that is the job of an external [`Emitter`] walking the
//! post-transform AST.

pub mod archive;
pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod import;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod source;
pub mod symbol;
pub mod token;
pub mod transform;
mod version;

pub use version::VERSION;

use ast::{Ast, NodeId};
use config::Configuration;
use diagnostics::DiagnosticBag;
use parser::{Parser, ParserMode};
use symbol::SymbolTable;

/// The parsed, import-resolved, fully transformed result of compiling one
/// source file. `ast` is ready for an [`Emitter`] to walk; `diagnostics`
/// carries everything the scanner, parser, and transform passes reported.
pub struct CompiledUnit {
    pub ast: Ast,
    pub diagnostics: DiagnosticBag,
    pub configuration: Configuration,
}

impl CompiledUnit {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Parses `source` and runs the full semantic transform pipeline over it.
/// `symbols` is shared across every file in a compilation run so templates,
/// customs, and namespaces declared in one file are visible while compiling
/// another (the caller is responsible for resolving imports and invoking
/// this function once per file, in dependency order).
pub fn compile_source(
    source: &str,
    file_id: u32,
    symbols: &mut SymbolTable,
    max_errors: Option<usize>,
) -> CompiledUnit {
    let (mut ast, mut diags) = Parser::parse(source, file_id, ParserMode::Recovering, max_errors, symbols);
    let mut configuration = Configuration::default();
    configuration.apply_ast(&ast);
    if !diags.halted() {
        transform::run(&mut ast, symbols, &configuration, &mut diags);
    }
    CompiledUnit { ast, diagnostics: diags, configuration }
}

/// The boundary this crate hands off to. Downstream HTML/CSS/JS code
/// generators are external collaborators (see the crate's Non-goals): they
/// implement this trait to walk a [`CompiledUnit`]'s AST from `root` and
/// produce whatever text format they target, consulting `symbols` and
/// `config` read-only for template/custom lookups and emit-affecting
/// configuration keys. No implementation of it lives here.
pub trait Emitter {
    type Output;
    type Error;

    fn emit(
        &mut self,
        ast: &Ast,
        root: NodeId,
        symbols: &SymbolTable,
        config: &Configuration,
    ) -> Result<Self::Output, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_small_document_with_no_errors() {
        let mut symbols = SymbolTable::new();
        let src = r#"
            [Template] @Style Base { color: "red"; }
            div {
                class: card;
                style { Base(); & { border: "1px"; } }
                text { "hello" }
            }
        "#;
        let unit = compile_source(src, 0, &mut symbols, Some(50));
        assert!(!unit.has_errors(), "{:?}", unit.diagnostics.messages());
    }
}
