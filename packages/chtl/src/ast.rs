//! The CHTL abstract syntax tree: an arena of nodes with parent back-pointers.
//!
//! Nodes live in a single per-file [`Ast`] arena rather than behind
//! `Rc`/`RefCell`: parent -> child edges are the only owning edges (`Vec<NodeId>`
//! children lists), and the reverse edge is a plain `NodeId` computed once at
//! insertion time, non-owning by construction. This keeps the tree a closed
//! tagged union that every pass can `match` over exhaustively, and it frees
//! in one shot when the `Ast` is dropped.

use crate::source::SourceSpan;
use serde::{Deserialize, Serialize};

pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    Style,
    Element,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorKind {
    Class,
    Id,
    Element,
    Universal,
    Attribute,
    PseudoClass,
    PseudoElement,
    Combinator,
    Ampersand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleValueKind {
    Literal,
    Function,
    Variable,
    Calc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteKind {
    Property,
    Element,
    Inheritance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    After,
    Before,
    Replace,
    AtTop,
    AtBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptMode {
    Precise,
    Type,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginKind {
    Html,
    Style,
    JavaScript,
    /// Any other `[Origin] @Name` — per the open question, the core accepts
    /// any `@Identifier` following `[Origin]`.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    Html,
    Style,
    JavaScript,
    Chtl,
    CJmod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    SingleLine,
    MultiLine,
    Generator,
    Dash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// `:` (`false`, colon style) vs `=` (`true`, CE-equality style).
    pub uses_ce_equality: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    pub value: Option<String>,
}

/// One `(key, value)` override carried by a `TemplateUse`'s specialization
/// block, or a bare property override by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyOverride {
    pub name: String,
    pub value: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTarget {
    pub kind: DeleteKind,
    /// Property name, element tag, or inherited template/custom name.
    pub name: String,
    /// `inherit @Style X` carries a kind; plain element deletes don't.
    pub template_kind: Option<TemplateKind>,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Program {
        children: Vec<NodeId>,
    },
    Element {
        tag: String,
        index: Option<usize>,
        attrs: Vec<Attribute>,
        children: Vec<NodeId>,
    },
    TextBlock {
        content: String,
    },
    StyleBlock {
        is_local: bool,
        children: Vec<NodeId>,
    },
    StyleRule {
        selector: NodeId,
        properties: Vec<NodeId>,
    },
    StyleSelector {
        kind: SelectorKind,
        value: String,
        combinator: Option<Combinator>,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    StyleProperty {
        name: String,
        values: Vec<NodeId>,
        important: bool,
    },
    StyleValue {
        kind: StyleValueKind,
        value: String,
        args: Vec<NodeId>,
    },
    ScriptBlock {
        is_local: bool,
        content: String,
    },
    TemplateDecl {
        kind: TemplateKind,
        name: String,
        body: Vec<NodeId>,
    },
    CustomDecl {
        kind: TemplateKind,
        name: String,
        body: Vec<NodeId>,
    },
    TemplateUse {
        kind: TemplateKind,
        name: String,
        is_custom: bool,
        namespace: Option<String>,
        overrides: Vec<PropertyOverride>,
        specialization: Option<NodeId>,
    },
    Inherit {
        target_kind: TemplateKind,
        target: String,
        namespace: Option<String>,
    },
    Specialization {
        children: Vec<NodeId>,
        overrides: Vec<PropertyOverride>,
        deletions: Vec<DeleteTarget>,
    },
    Delete {
        targets: Vec<DeleteTarget>,
    },
    Insert {
        position: InsertPosition,
        target: Option<String>,
        target_index: Option<usize>,
        content: Vec<NodeId>,
    },
    Except {
        mode: ExceptMode,
        targets: Vec<String>,
    },
    Origin {
        origin_kind: OriginKind,
        name: Option<String>,
        content: String,
    },
    Import {
        kind: ImportKind,
        target: Option<String>,
        from_path: String,
        as_name: Option<String>,
        import_list: Option<Vec<String>>,
        official_prefix: bool,
    },
    Namespace {
        name: String,
        constraints: Vec<NodeId>,
        children: Vec<NodeId>,
    },
    Configuration {
        name: Option<String>,
        entries: Vec<(String, String)>,
    },
    Identifier {
        name: String,
    },
    StringLiteral {
        value: String,
    },
    VariableGroup {
        name: String,
        is_custom: bool,
        entries: Vec<VariableEntry>,
        is_valueless: bool,
    },
    VariableReference {
        group: String,
        name: String,
        spec: Option<String>,
    },
    IndexAccess {
        element_name: String,
        index: usize,
    },
    FromStatement {
        symbol: String,
        namespace: String,
    },
    Comment {
        kind: CommentKind,
        text: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    pub span: SourceSpan,
}

/// A single-file AST arena. `root` is always a `Program` node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<NodeData>,
    parent: Vec<Option<NodeId>>,
    pub root: NodeId,
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Ast { nodes: Vec::new(), parent: Vec::new(), root: 0 };
        let span = SourceSpan::new(
            crate::source::SourcePos::start(0),
            crate::source::SourcePos::start(0),
        );
        ast.root = ast.push_root(NodeKind::Program { children: Vec::new() }, span);
        ast
    }

    fn push_root(&mut self, kind: NodeKind, span: SourceSpan) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeData { kind, span });
        self.parent.push(None);
        id
    }

    /// Insert a node as a child of `parent_id`. The caller is still
    /// responsible for pushing `id` into the parent's own children list;
    /// this only records the non-owning back-reference.
    pub fn insert(&mut self, kind: NodeKind, span: SourceSpan, parent_id: NodeId) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeData { kind, span });
        self.parent.push(Some(parent_id));
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id as usize].kind
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent[id as usize]
    }

    pub fn set_parent(&mut self, id: NodeId, parent_id: Option<NodeId>) {
        self.parent[id as usize] = parent_id;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk up from `id` until an `Element` node is found (used by `&`
    /// resolution and selector automation).
    pub fn nearest_ancestor_element(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.parent_of(id);
        while let Some(p) = cur {
            if matches!(self.kind(p), NodeKind::Element { .. }) {
                return Some(p);
            }
            cur = self.parent_of(p);
        }
        None
    }

    /// Pre-order traversal starting at `id`, visiting the structural
    /// children lists every node variant exposes.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Program { children } => children.clone(),
            NodeKind::Element { children, .. } => children.clone(),
            NodeKind::StyleBlock { children, .. } => children.clone(),
            NodeKind::StyleRule { selector, properties } => {
                let mut v = vec![*selector];
                v.extend(properties.iter().copied());
                v
            }
            NodeKind::StyleProperty { values, .. } => values.clone(),
            NodeKind::TemplateDecl { body, .. } => body.clone(),
            NodeKind::CustomDecl { body, .. } => body.clone(),
            NodeKind::Specialization { children, .. } => children.clone(),
            NodeKind::Insert { content, .. } => content.clone(),
            NodeKind::Namespace { children, constraints, .. } => {
                let mut v = constraints.clone();
                v.extend(children.iter().copied());
                v
            }
            NodeKind::TemplateUse { specialization, .. } => {
                specialization.map(|s| vec![s]).unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourcePos;

    fn span() -> SourceSpan {
        SourceSpan::new(SourcePos::start(0), SourcePos::start(0))
    }

    #[test]
    fn root_is_program() {
        let ast = Ast::new();
        assert!(matches!(ast.kind(ast.root), NodeKind::Program { .. }));
        assert_eq!(ast.parent_of(ast.root), None);
    }

    #[test]
    fn nearest_ancestor_element_skips_non_elements() {
        let mut ast = Ast::new();
        let el = ast.insert(
            NodeKind::Element { tag: "div".into(), index: None, attrs: vec![], children: vec![] },
            span(),
            ast.root,
        );
        let style = ast.insert(NodeKind::StyleBlock { is_local: true, children: vec![] }, span(), el);
        let sel = ast.insert(
            NodeKind::StyleSelector {
                kind: SelectorKind::Ampersand,
                value: "&".into(),
                combinator: None,
                left: None,
                right: None,
            },
            span(),
            style,
        );
        assert_eq!(ast.nearest_ancestor_element(sel), Some(el));
    }
}
