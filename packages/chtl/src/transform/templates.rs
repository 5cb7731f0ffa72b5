//! Steps 2 and 3: template/custom use expansion and specialization.
//!
//! A `TemplateUse` is replaced in place by a fresh clone of the declaration
//! body it names. When the use carries a specialization block, the clone
//! is mutated first — deletions removed, overrides applied, inserted
//! content spliced at its requested position — before it is spliced into
//! the use site's parent.

use crate::ast::{
    Ast, DeleteKind, DeleteTarget, InsertPosition, NodeId, NodeKind, PropertyOverride, TemplateKind,
};
use crate::diagnostics::{DiagnosticBag, Phase};
use crate::symbol::{SymbolKind, SymbolTable};

pub fn expand(ast: &mut Ast, symbols: &SymbolTable, diags: &mut DiagnosticBag) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        let Some((kind, name, is_custom, specialization)) = (match ast.kind(i) {
            NodeKind::TemplateUse { kind, name, is_custom, specialization, .. } => {
                Some((*kind, name.clone(), *is_custom, *specialization))
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
        let ns = super::namespace_path_of(ast, i);
        let primary = SymbolKind::template(kind, is_custom);
        let fallback = SymbolKind::template(kind, !is_custom);
        let entry = symbols
            .find_symbol(primary, &name, &ns, true)
            .or_else(|| symbols.find_symbol(fallback, &name, &ns, true));
        let Some(entry) = entry else {
            diags.error(span.start, format!("undefined {} '{}'", symbol_label(kind), name), Phase::TransformTemplateExpansion);
            super::splice_replace(ast, parent, i, Vec::new());
            i += 1;
            continue;
        };
        let body = match ast.kind(entry.node_id) {
            NodeKind::TemplateDecl { body, .. } | NodeKind::CustomDecl { body, .. } => body.clone(),
            _ => Vec::new(),
        };
        let mut cloned: Vec<NodeId> = body.iter().map(|&b| super::clone_subtree(ast, b, parent)).collect();
        if let Some(spec_id) = specialization {
            apply_specialization(ast, parent, &mut cloned, spec_id, diags);
        }
        super::splice_replace(ast, parent, i, cloned);
        i += 1;
    }
}

fn symbol_label(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Style => "style template/custom",
        TemplateKind::Element => "element template/custom",
        TemplateKind::Var => "variable group",
    }
}

fn apply_specialization(
    ast: &mut Ast,
    parent: NodeId,
    cloned: &mut Vec<NodeId>,
    spec_id: NodeId,
    diags: &mut DiagnosticBag,
) {
    let (children, overrides, deletions) = match ast.kind(spec_id) {
        NodeKind::Specialization { children, overrides, deletions } => {
            (children.clone(), overrides.clone(), deletions.clone())
        }
        _ => return,
    };

    for target in &deletions {
        apply_deletion(ast, cloned, target, diags);
    }
    for PropertyOverride { name, value } in overrides {
        apply_override(ast, parent, cloned, &name, value);
    }
    for child in children {
        place_child(ast, parent, cloned, child);
    }
}

fn apply_deletion(ast: &Ast, cloned: &mut Vec<NodeId>, target: &DeleteTarget, diags: &mut DiagnosticBag) {
    let mut occurrence = 0usize;
    let before = cloned.len();
    cloned.retain(|&id| {
        let matches = match (target.kind, ast.kind(id)) {
            (DeleteKind::Property, NodeKind::StyleProperty { name, .. }) => name == &target.name,
            (DeleteKind::Element, NodeKind::Element { tag, .. }) => tag == &target.name,
            (DeleteKind::Inheritance, NodeKind::Inherit { target: inherited, target_kind, .. }) => {
                inherited == &target.name && target.template_kind.map(|k| k == *target_kind).unwrap_or(true)
            }
            _ => false,
        };
        if !matches {
            return true;
        }
        let keep = match target.index {
            Some(wanted) => {
                let keep = occurrence != wanted;
                occurrence += 1;
                keep
            }
            None => false,
        };
        keep
    });
    if cloned.len() == before {
        diags.warning(
            crate::source::SourcePos::start(0),
            format!("nothing matched delete target '{}'", target.name),
            Phase::TransformSpecialization,
        );
    }
}

fn apply_override(ast: &mut Ast, parent: NodeId, cloned: &mut Vec<NodeId>, name: &str, value: NodeId) {
    for &id in cloned.iter() {
        if let NodeKind::StyleProperty { name: prop_name, .. } = ast.kind(id) {
            if prop_name == name {
                ast.set_parent(value, Some(id));
                if let NodeKind::StyleProperty { values, .. } = &mut ast.get_mut(id).kind {
                    // An override replaces only the first StyleValue; a
                    // multi-token value (e.g. a function call followed by
                    // further space-separated tokens) keeps its trailing
                    // entries.
                    values.truncate(1);
                    if values.is_empty() {
                        values.push(value);
                    } else {
                        values[0] = value;
                    }
                }
                return;
            }
        }
    }
    // No existing property of this name in the cloned body: the override
    // introduces it fresh, appended at the end.
    let span = ast.get(value).span;
    let new_prop = ast.insert(
        NodeKind::StyleProperty { name: name.to_string(), values: vec![value], important: false },
        span,
        parent,
    );
    ast.set_parent(value, Some(new_prop));
    cloned.push(new_prop);
}

/// Splices a specialization's `insert`/bare-child content into `cloned` at
/// the position it requests; bare (non-`insert`) additions append at the
/// bottom, matching a Custom body's implicit "new content goes last" rule.
fn place_child(ast: &mut Ast, parent: NodeId, cloned: &mut Vec<NodeId>, child: NodeId) {
    let insert_data = match ast.kind(child) {
        NodeKind::Insert { position, target, target_index, content } => {
            Some((*position, target.clone(), *target_index, content.clone()))
        }
        _ => None,
    };
    match insert_data {
        None => {
            ast.set_parent(child, Some(parent));
            cloned.push(child);
        }
        Some((position, target, target_index, content)) => {
            for &c in &content {
                ast.set_parent(c, Some(parent));
            }
            match position {
                InsertPosition::AtTop => {
                    cloned.splice(0..0, content);
                }
                InsertPosition::AtBottom => {
                    cloned.extend(content);
                }
                InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
                    let idx = target.as_deref().and_then(|t| find_tag_occurrence(ast, cloned, t, target_index));
                    match idx {
                        Some(idx) => match position {
                            InsertPosition::Before => { cloned.splice(idx..idx, content); }
                            InsertPosition::After => { cloned.splice(idx + 1..idx + 1, content); }
                            InsertPosition::Replace => { cloned.splice(idx..idx + 1, content); }
                            InsertPosition::AtTop | InsertPosition::AtBottom => unreachable!(),
                        },
                        None => { cloned.extend(content); }
                    }
                }
            }
        }
    }
}

fn find_tag_occurrence(ast: &Ast, cloned: &[NodeId], tag: &str, wanted_index: Option<usize>) -> Option<usize> {
    let wanted = wanted_index.unwrap_or(0);
    let mut occurrence = 0usize;
    for (pos, &id) in cloned.iter().enumerate() {
        if let NodeKind::Element { tag: t, .. } = ast.kind(id) {
            if t == tag {
                if occurrence == wanted {
                    return Some(pos);
                }
                occurrence += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};

    #[test]
    fn template_use_is_replaced_by_cloned_body() {
        let mut symbols = SymbolTable::new();
        let src = r#"
            [Template] @Style Base { color: "red"; }
            div { style { Base(); } }
        "#;
        let (mut ast, mut diags) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        expand(&mut ast, &symbols, &mut diags);
        let still_has_use = (0..ast.len() as u32).any(|id| matches!(ast.kind(id), NodeKind::TemplateUse { .. }));
        assert!(!still_has_use);
        let has_property = (0..ast.len() as u32)
            .any(|id| matches!(ast.kind(id), NodeKind::StyleProperty { name, .. } if name == "color"));
        assert!(has_property);
    }

    #[test]
    fn specialization_deletes_inherited_property() {
        let mut symbols = SymbolTable::new();
        let src = r#"
            [Custom] @Style Base { color: "red"; border: "1px"; }
            div { style { Base() { delete border; } } }
        "#;
        let (mut ast, mut diags) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        expand(&mut ast, &symbols, &mut diags);
        let border_gone = (0..ast.len() as u32)
            .all(|id| !matches!(ast.kind(id), NodeKind::StyleProperty { name, .. } if name == "border"));
        assert!(border_gone);
    }
}
