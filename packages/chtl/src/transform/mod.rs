//! Semantic transforms: the fixed-order passes that turn a parsed,
//! import-resolved AST into the tree an emitter can walk directly, with no
//! more template/custom indirection, inheritance, or unresolved selectors.

mod comments;
mod inheritance;
mod references;
mod selectors;
mod templates;
mod variables;

use crate::ast::{Ast, NodeData, NodeId, NodeKind};
use crate::config::Configuration;
use crate::diagnostics::DiagnosticBag;
use crate::symbol::SymbolTable;

/// Runs all seven transform passes in the order the pipeline requires:
/// variable expansion must see every `TemplateUse`'s raw specs before step
/// 2 clones bodies, inheritance must resolve after specialization so
/// `insert`/`delete` see the final local body, and reference/comment
/// lowering read the fully-expanded style/script text last.
pub fn run(ast: &mut Ast, symbols: &SymbolTable, config: &Configuration, diags: &mut DiagnosticBag) {
    variables::expand(ast, symbols, diags);
    templates::expand(ast, symbols, diags);
    inheritance::expand(ast, symbols, diags);
    selectors::automate(ast, config);
    references::resolve(ast);
    comments::lower(ast);
}

/// Walks `id`'s Namespace ancestors (innermost first) to build the
/// namespace path used for scoped symbol lookup.
pub(crate) fn namespace_path_of(ast: &Ast, id: NodeId) -> Vec<String> {
    let mut path = Vec::new();
    let mut cur = ast.parent_of(id);
    while let Some(p) = cur {
        if let NodeKind::Namespace { name, .. } = ast.kind(p) {
            path.push(name.clone());
        }
        cur = ast.parent_of(p);
    }
    path.reverse();
    path
}

/// Deep-clones the subtree rooted at `id` into fresh arena slots parented
/// under `new_parent`, remapping every embedded [`NodeId`] along the way.
/// Template/custom bodies are cloned rather than shared because each
/// specialization mutates its own copy independently.
pub(crate) fn clone_subtree(ast: &mut Ast, id: NodeId, new_parent: NodeId) -> NodeId {
    let NodeData { kind, span } = ast.get(id).clone();
    match kind {
        NodeKind::Program { children } => {
            let new_id = ast.insert(NodeKind::Program { children: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = children.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::Program { children } = &mut ast.get_mut(new_id).kind {
                *children = cloned;
            }
            new_id
        }
        NodeKind::Element { tag, index, attrs, children } => {
            let new_id =
                ast.insert(NodeKind::Element { tag, index, attrs, children: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = children.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::Element { children, .. } = &mut ast.get_mut(new_id).kind {
                *children = cloned;
            }
            new_id
        }
        NodeKind::TextBlock { content } => ast.insert(NodeKind::TextBlock { content }, span, new_parent),
        NodeKind::StyleBlock { is_local, children } => {
            let new_id = ast.insert(NodeKind::StyleBlock { is_local, children: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = children.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::StyleBlock { children, .. } = &mut ast.get_mut(new_id).kind {
                *children = cloned;
            }
            new_id
        }
        NodeKind::StyleRule { selector, properties } => {
            let new_id =
                ast.insert(NodeKind::StyleRule { selector: 0, properties: Vec::new() }, span, new_parent);
            let new_selector = clone_subtree(ast, selector, new_id);
            let cloned_props: Vec<NodeId> = properties.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::StyleRule { selector, properties } = &mut ast.get_mut(new_id).kind {
                *selector = new_selector;
                *properties = cloned_props;
            }
            new_id
        }
        NodeKind::StyleSelector { kind: sel_kind, value, combinator, left, right } => {
            let new_id = ast.insert(
                NodeKind::StyleSelector { kind: sel_kind, value, combinator, left: None, right: None },
                span,
                new_parent,
            );
            let new_left = left.map(|l| clone_subtree(ast, l, new_id));
            let new_right = right.map(|r| clone_subtree(ast, r, new_id));
            if let NodeKind::StyleSelector { left, right, .. } = &mut ast.get_mut(new_id).kind {
                *left = new_left;
                *right = new_right;
            }
            new_id
        }
        NodeKind::StyleProperty { name, values, important } => {
            let new_id =
                ast.insert(NodeKind::StyleProperty { name, values: Vec::new(), important }, span, new_parent);
            let cloned: Vec<NodeId> = values.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::StyleProperty { values, .. } = &mut ast.get_mut(new_id).kind {
                *values = cloned;
            }
            new_id
        }
        NodeKind::StyleValue { kind: value_kind, value, args } => {
            let new_id =
                ast.insert(NodeKind::StyleValue { kind: value_kind, value, args: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = args.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::StyleValue { args, .. } = &mut ast.get_mut(new_id).kind {
                *args = cloned;
            }
            new_id
        }
        NodeKind::ScriptBlock { is_local, content } => {
            ast.insert(NodeKind::ScriptBlock { is_local, content }, span, new_parent)
        }
        NodeKind::TemplateDecl { kind, name, body } => {
            let new_id = ast.insert(NodeKind::TemplateDecl { kind, name, body: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = body.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::TemplateDecl { body, .. } = &mut ast.get_mut(new_id).kind {
                *body = cloned;
            }
            new_id
        }
        NodeKind::CustomDecl { kind, name, body } => {
            let new_id = ast.insert(NodeKind::CustomDecl { kind, name, body: Vec::new() }, span, new_parent);
            let cloned: Vec<NodeId> = body.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::CustomDecl { body, .. } = &mut ast.get_mut(new_id).kind {
                *body = cloned;
            }
            new_id
        }
        NodeKind::TemplateUse { kind, name, is_custom, namespace, overrides, specialization } => {
            let new_id = ast.insert(
                NodeKind::TemplateUse { kind, name, is_custom, namespace, overrides: Vec::new(), specialization: None },
                span,
                new_parent,
            );
            let cloned_overrides: Vec<_> = overrides
                .into_iter()
                .map(|o| crate::ast::PropertyOverride { name: o.name, value: clone_subtree(ast, o.value, new_id) })
                .collect();
            let new_spec = specialization.map(|s| clone_subtree(ast, s, new_id));
            if let NodeKind::TemplateUse { overrides, specialization, .. } = &mut ast.get_mut(new_id).kind {
                *overrides = cloned_overrides;
                *specialization = new_spec;
            }
            new_id
        }
        NodeKind::Inherit { target_kind, target, namespace } => {
            ast.insert(NodeKind::Inherit { target_kind, target, namespace }, span, new_parent)
        }
        NodeKind::Specialization { children, overrides, deletions } => {
            let new_id = ast.insert(
                NodeKind::Specialization { children: Vec::new(), overrides: Vec::new(), deletions },
                span,
                new_parent,
            );
            let cloned_children: Vec<NodeId> = children.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            let cloned_overrides: Vec<_> = overrides
                .into_iter()
                .map(|o| crate::ast::PropertyOverride { name: o.name, value: clone_subtree(ast, o.value, new_id) })
                .collect();
            if let NodeKind::Specialization { children, overrides, .. } = &mut ast.get_mut(new_id).kind {
                *children = cloned_children;
                *overrides = cloned_overrides;
            }
            new_id
        }
        NodeKind::Delete { targets } => ast.insert(NodeKind::Delete { targets }, span, new_parent),
        NodeKind::Insert { position, target, target_index, content } => {
            let new_id = ast.insert(
                NodeKind::Insert { position, target, target_index, content: Vec::new() },
                span,
                new_parent,
            );
            let cloned: Vec<NodeId> = content.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::Insert { content, .. } = &mut ast.get_mut(new_id).kind {
                *content = cloned;
            }
            new_id
        }
        NodeKind::Except { mode, targets } => ast.insert(NodeKind::Except { mode, targets }, span, new_parent),
        NodeKind::Origin { origin_kind, name, content } => {
            ast.insert(NodeKind::Origin { origin_kind, name, content }, span, new_parent)
        }
        NodeKind::Import { kind, target, from_path, as_name, import_list, official_prefix } => ast.insert(
            NodeKind::Import { kind, target, from_path, as_name, import_list, official_prefix },
            span,
            new_parent,
        ),
        NodeKind::Namespace { name, constraints, children } => {
            let new_id =
                ast.insert(NodeKind::Namespace { name, constraints: Vec::new(), children: Vec::new() }, span, new_parent);
            let cloned_constraints: Vec<NodeId> = constraints.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            let cloned_children: Vec<NodeId> = children.iter().map(|c| clone_subtree(ast, *c, new_id)).collect();
            if let NodeKind::Namespace { constraints, children, .. } = &mut ast.get_mut(new_id).kind {
                *constraints = cloned_constraints;
                *children = cloned_children;
            }
            new_id
        }
        NodeKind::Configuration { name, entries } => {
            ast.insert(NodeKind::Configuration { name, entries }, span, new_parent)
        }
        NodeKind::Identifier { name } => ast.insert(NodeKind::Identifier { name }, span, new_parent),
        NodeKind::StringLiteral { value } => ast.insert(NodeKind::StringLiteral { value }, span, new_parent),
        NodeKind::VariableGroup { name, is_custom, entries, is_valueless } => {
            ast.insert(NodeKind::VariableGroup { name, is_custom, entries, is_valueless }, span, new_parent)
        }
        NodeKind::VariableReference { group, name, spec } => {
            ast.insert(NodeKind::VariableReference { group, name, spec }, span, new_parent)
        }
        NodeKind::IndexAccess { element_name, index } => {
            ast.insert(NodeKind::IndexAccess { element_name, index }, span, new_parent)
        }
        NodeKind::FromStatement { symbol, namespace } => {
            ast.insert(NodeKind::FromStatement { symbol, namespace }, span, new_parent)
        }
        NodeKind::Comment { kind: comment_kind, text } => {
            ast.insert(NodeKind::Comment { kind: comment_kind, text }, span, new_parent)
        }
    }
}

/// Returns the owned child-id list a node variant exposes, for variants
/// that can host a spliced-in replacement (template/custom expansion,
/// insert/delete). `StyleRule` exposes its `properties` list here since
/// that is the slot a `TemplateUse(Style)` occupies within a rule body.
pub(crate) fn children_vec_mut(ast: &mut Ast, id: NodeId) -> Option<&mut Vec<NodeId>> {
    match &mut ast.get_mut(id).kind {
        NodeKind::Program { children } => Some(children),
        NodeKind::Element { children, .. } => Some(children),
        NodeKind::StyleBlock { children, .. } => Some(children),
        NodeKind::StyleRule { properties, .. } => Some(properties),
        NodeKind::TemplateDecl { body, .. } => Some(body),
        NodeKind::CustomDecl { body, .. } => Some(body),
        NodeKind::Specialization { children, .. } => Some(children),
        NodeKind::Insert { content, .. } => Some(content),
        NodeKind::Namespace { children, .. } => Some(children),
        _ => None,
    }
}

/// Replaces a single occurrence of `old` in `parent`'s child list with
/// zero or more `replacement` nodes, preserving position.
pub(crate) fn splice_replace(ast: &mut Ast, parent: NodeId, old: NodeId, replacement: Vec<NodeId>) {
    let Some(list) = children_vec_mut(ast, parent) else { return };
    if let Some(pos) = list.iter().position(|&c| c == old) {
        list.splice(pos..=pos, replacement);
    }
}
