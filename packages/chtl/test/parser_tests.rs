//! Black-box parser coverage: the minimal-element scenario from the
//! testable-properties list, template/custom declarations registering
//! themselves in the Symbol Map, and recovering-mode error synchronization.

use chtl::ast::NodeKind;
use chtl::parser::{Parser, ParserMode};
use chtl::symbol::{SymbolKind, SymbolTable};

fn parse(src: &str) -> (chtl::ast::Ast, chtl::diagnostics::DiagnosticBag) {
    let mut symbols = SymbolTable::new();
    Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols)
}

#[test]
fn minimal_element_has_expected_shape() {
    let (ast, diags) = parse(r#"div { id: main; text { "Hi" } }"#);
    assert!(!diags.has_errors());
    let NodeKind::Program { children } = ast.kind(ast.root) else { panic!("root is not Program") };
    assert_eq!(children.len(), 1);
    let NodeKind::Element { tag, attrs, children, .. } = ast.kind(children[0]) else { panic!("expected Element") };
    assert_eq!(tag, "div");
    assert_eq!(attrs.iter().find(|a| a.name == "id").map(|a| a.value.as_str()), Some("main"));
    assert_eq!(children.len(), 1);
    assert!(matches!(ast.kind(children[0]), NodeKind::TextBlock { content } if content == "Hi"));
}

#[test]
fn template_declaration_registers_in_symbol_table() {
    let mut symbols = SymbolTable::new();
    let (_, diags) = Parser::parse(
        "[Template] @Style Base { color: red; font-size: 14px }",
        0,
        ParserMode::Recovering,
        None,
        &mut symbols,
    );
    assert!(!diags.has_errors());
    assert!(symbols.find_symbol(SymbolKind::template(chtl::ast::TemplateKind::Style, false), "Base", &[], true).is_some());
}

#[test]
fn recovering_mode_synchronizes_past_an_unexpected_top_level_token() {
    let (ast, diags) = parse("] div { id: ok; }");
    assert!(diags.has_errors());
    let NodeKind::Program { children } = ast.kind(ast.root) else { panic!("root is not Program") };
    assert!(!children.is_empty(), "parser should still have produced a node after recovering past ']'");
}

#[test]
fn strict_mode_halts_on_first_error() {
    let mut symbols = SymbolTable::new();
    let (_, diags) = Parser::parse("] div { id: ok; }", 0, ParserMode::Strict, None, &mut symbols);
    assert!(diags.has_errors());
}
