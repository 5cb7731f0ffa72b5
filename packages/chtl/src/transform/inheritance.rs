//! Step 4: inheritance expansion. An `inherit @Style Base;` (or `@Element`)
//! statement is replaced in place by a clone of `Base`'s body, positioned
//! exactly where the `inherit` statement stood so later, later-written
//! members of the surrounding body still shadow it (last write wins).

use crate::ast::{Ast, NodeId, NodeKind};
use crate::diagnostics::{DiagnosticBag, Phase};
use crate::symbol::{SymbolKind, SymbolTable};

pub fn expand(ast: &mut Ast, symbols: &SymbolTable, diags: &mut DiagnosticBag) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        let Some((target_kind, target, namespace)) = (match ast.kind(i) {
            NodeKind::Inherit { target_kind, target, namespace } => {
                Some((*target_kind, target.clone(), namespace.clone()))
            }
            _ => None,
        }) else {
            i += 1;
            continue;
        };
        let Some(parent) = ast.parent_of(i) else {
            i += 1;
            continue;
        };
        let span = ast.get(i).span;
        let ns = namespace.map(|n| vec![n]).unwrap_or_else(|| super::namespace_path_of(ast, i));
        let entry = symbols
            .find_symbol(SymbolKind::template(target_kind, true), &target, &ns, true)
            .or_else(|| symbols.find_symbol(SymbolKind::template(target_kind, false), &target, &ns, true));
        let Some(entry) = entry else {
            diags.error(span.start, format!("undefined inheritance target '{}'", target), Phase::TransformInheritance);
            super::splice_replace(ast, parent, i, Vec::new());
            i += 1;
            continue;
        };
        let body: Vec<NodeId> = match ast.kind(entry.node_id) {
            NodeKind::TemplateDecl { body, .. } | NodeKind::CustomDecl { body, .. } => body.clone(),
            _ => Vec::new(),
        };
        let cloned: Vec<NodeId> = body.iter().map(|&b| super::clone_subtree(ast, b, parent)).collect();
        super::splice_replace(ast, parent, i, cloned);
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};

    #[test]
    fn inherited_body_is_spliced_at_inherit_site() {
        let mut symbols = SymbolTable::new();
        let src = r#"
            [Template] @Style Base { color: "red"; }
            [Template] @Style Derived { inherit @Style Base; border: "1px"; }
        "#;
        let (mut ast, mut diags) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        expand(&mut ast, &symbols, &mut diags);
        let no_inherit_left = (0..ast.len() as u32).all(|id| !matches!(ast.kind(id), NodeKind::Inherit { .. }));
        assert!(no_inherit_left);
        let derived = (0..ast.len() as u32)
            .find(|&id| matches!(ast.kind(id), NodeKind::TemplateDecl { name, .. } if name == "Derived"))
            .unwrap();
        let NodeKind::TemplateDecl { body, .. } = ast.kind(derived) else { unreachable!() };
        assert_eq!(body.len(), 2);
    }
}
