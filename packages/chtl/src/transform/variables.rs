//! Step 1: variable-template expansion. Every `StyleValue` the parser
//! tagged `Variable` wraps a single `VariableReference` child; this pass
//! resolves it against a `[Template] @Var` / `[Custom] @Var` group and
//! rewrites the `StyleValue` to a plain `Literal` in place.

use crate::ast::{Ast, NodeKind, StyleValueKind};
use crate::diagnostics::{DiagnosticBag, Phase};
use crate::symbol::{SymbolKind, SymbolTable};

pub fn expand(ast: &mut Ast, symbols: &SymbolTable, diags: &mut DiagnosticBag) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        if let NodeKind::StyleValue { kind: StyleValueKind::Variable, args, .. } = ast.kind(i).clone() {
            let span = ast.get(i).span;
            let resolved = args
                .first()
                .and_then(|&arg| match ast.kind(arg).clone() {
                    NodeKind::VariableReference { group, name, spec } => {
                        Some(resolve(ast, symbols, i, &group, &name, spec.as_deref(), diags))
                    }
                    _ => None,
                })
                .flatten()
                .unwrap_or_default();
            *ast.get_mut(i) = crate::ast::NodeData {
                kind: NodeKind::StyleValue { kind: StyleValueKind::Literal, value: resolved, args: Vec::new() },
                span,
            };
        }
        i += 1;
    }
}

fn resolve(
    ast: &Ast,
    symbols: &SymbolTable,
    use_site: crate::ast::NodeId,
    group: &str,
    name: &str,
    spec: Option<&str>,
    diags: &mut DiagnosticBag,
) -> Option<String> {
    if let Some(spec) = spec {
        return Some(spec.to_string());
    }
    let ns = super::namespace_path_of(ast, use_site);
    let entry = symbols
        .find_symbol(SymbolKind::TemplateVar, group, &ns, true)
        .or_else(|| symbols.find_symbol(SymbolKind::CustomVar, group, &ns, true));
    let Some(entry) = entry else {
        diags.error(
            ast.get(use_site).span.start,
            format!("undefined variable group '{group}'"),
            Phase::TransformVariableExpansion,
        );
        return None;
    };
    let body = match ast.kind(entry.node_id) {
        NodeKind::TemplateDecl { body, .. } | NodeKind::CustomDecl { body, .. } => body,
        _ => return None,
    };
    for &member in body {
        if let NodeKind::StyleProperty { name: prop_name, values, .. } = ast.kind(member) {
            if prop_name == name {
                return values.first().and_then(|&v| match ast.kind(v) {
                    NodeKind::StyleValue { value, .. } => Some(value.clone()),
                    _ => None,
                });
            }
        }
    }
    diags.error(
        ast.get(use_site).span.start,
        format!("'{group}' has no member '{name}'"),
        Phase::TransformVariableExpansion,
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};

    #[test]
    fn resolves_variable_reference_to_literal() {
        let mut symbols = SymbolTable::new();
        let src = r#"
            [Template] @Var ThemeColor { tableColor: "rgb(255,0,0)"; }
            div { style { color: ThemeColor(tableColor); } }
        "#;
        let (mut ast, mut diags) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        expand(&mut ast, &symbols, &mut diags);
        let found = (0..ast.len() as u32).find_map(|id| match ast.kind(id) {
            NodeKind::StyleValue { kind: StyleValueKind::Literal, value, .. } if !value.is_empty() => {
                Some(value.clone())
            }
            _ => None,
        });
        assert_eq!(found.as_deref(), Some("rgb(255,0,0)"));
    }
}
