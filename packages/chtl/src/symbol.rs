//! Symbol & namespace map: a multi-scope trie keyed by namespace
//! path. Populated during parsing, queried during semantic transforms and
//! (read-only, across files) by import resolution.

use crate::ast::TemplateKind;
use crate::source::SourcePos;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SymbolKind {
    TemplateStyle,
    TemplateElement,
    TemplateVar,
    CustomStyle,
    CustomElement,
    CustomVar,
    Origin,
    Configuration,
    Namespace,
}

impl SymbolKind {
    pub fn template(kind: TemplateKind, is_custom: bool) -> SymbolKind {
        match (kind, is_custom) {
            (TemplateKind::Style, false) => SymbolKind::TemplateStyle,
            (TemplateKind::Element, false) => SymbolKind::TemplateElement,
            (TemplateKind::Var, false) => SymbolKind::TemplateVar,
            (TemplateKind::Style, true) => SymbolKind::CustomStyle,
            (TemplateKind::Element, true) => SymbolKind::CustomElement,
            (TemplateKind::Var, true) => SymbolKind::CustomVar,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::TemplateStyle => "[Template] @Style",
            SymbolKind::TemplateElement => "[Template] @Element",
            SymbolKind::TemplateVar => "[Template] @Var",
            SymbolKind::CustomStyle => "[Custom] @Style",
            SymbolKind::CustomElement => "[Custom] @Element",
            SymbolKind::CustomVar => "[Custom] @Var",
            SymbolKind::Origin => "[Origin]",
            SymbolKind::Configuration => "[Configuration]",
            SymbolKind::Namespace => "[Namespace]",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub kind: SymbolKind,
    pub name: String,
    pub position: SourcePos,
    pub owning_file: u32,
    /// The AST node the declaration lives under, in the owning file's arena.
    pub node_id: crate::ast::NodeId,
}

/// Strategy applied when two declarations collide on `(name, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    #[default]
    KeepExisting,
    KeepIncoming,
}

#[derive(Debug, Default)]
struct Scope {
    /// Keyed by `(kind, name)` — distinct kinds with the same name coexist.
    entries: IndexMap<(SymbolKind, String), SymbolEntry>,
    children: IndexMap<String, Scope>,
}

#[derive(Debug)]
pub struct SymbolConflict {
    pub kind: SymbolKind,
    pub name: String,
    pub namespace: Vec<String>,
    pub existing: SourcePos,
    pub incoming: SourcePos,
}

/// Global, process-lifetime symbol map. Constructed once per compilation
/// run and passed by mutable reference to the owning file's parse phase;
/// read-only with respect to other files during transforms.
#[derive(Debug, Default)]
pub struct SymbolTable {
    root: Scope,
    conflict_strategy: ConflictStrategy,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { root: Scope::default(), conflict_strategy: ConflictStrategy::KeepExisting }
    }

    pub fn with_conflict_strategy(strategy: ConflictStrategy) -> Self {
        SymbolTable { root: Scope::default(), conflict_strategy: strategy }
    }

    fn scope_mut(&mut self, path: &[String], create: bool) -> Option<&mut Scope> {
        let mut cur = &mut self.root;
        for segment in path {
            if !cur.children.contains_key(segment) {
                if !create {
                    return None;
                }
                cur.children.insert(segment.clone(), Scope::default());
            }
            cur = cur.children.get_mut(segment).unwrap();
        }
        Some(cur)
    }

    fn scope(&self, path: &[String]) -> Option<&Scope> {
        let mut cur = &self.root;
        for segment in path {
            cur = cur.children.get(segment)?;
        }
        Some(cur)
    }

    pub fn add_namespace(&mut self, parent: &[String], name: &str) {
        let scope = self.scope_mut(parent, true).unwrap();
        scope.children.entry(name.to_string()).or_default();
    }

    /// Register a symbol, returning a conflict descriptor when `(kind,
    /// name)` was already present in this exact namespace scope.
    pub fn add_symbol(&mut self, path: &[String], entry: SymbolEntry) -> Option<SymbolConflict> {
        let key = (entry.kind, entry.name.clone());
        let strategy = self.conflict_strategy;
        let scope = self.scope_mut(path, true).unwrap();
        if let Some(existing) = scope.entries.get(&key) {
            let conflict = SymbolConflict {
                kind: entry.kind,
                name: entry.name.clone(),
                namespace: path.to_vec(),
                existing: existing.position,
                incoming: entry.position,
            };
            match strategy {
                ConflictStrategy::KeepExisting => {}
                ConflictStrategy::KeepIncoming => {
                    scope.entries.insert(key, entry);
                }
            }
            return Some(conflict);
        }
        scope.entries.insert(key, entry);
        None
    }

    /// Scoped lookup: the given namespace first, then its ancestors up to
    /// the root, then `chtl::` (the official namespace) if `official` is
    /// set — matching the `chtl::Name` opt-in prefix.
    pub fn find_symbol(&self, kind: SymbolKind, name: &str, namespace_path: &[String], official: bool) -> Option<&SymbolEntry> {
        let key = (kind, name.to_string());
        for depth in (0..=namespace_path.len()).rev() {
            if let Some(scope) = self.scope(&namespace_path[..depth]) {
                if let Some(entry) = scope.entries.get(&key) {
                    return Some(entry);
                }
            }
        }
        if official {
            if let Some(scope) = self.scope(&["chtl".to_string()]) {
                if let Some(entry) = scope.entries.get(&key) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Merge every declaration of `name` at `parent` into a single scope
    /// entry-by-entry (by `(name, kind)`), returning the conflicts found.
    /// Because a namespace is a single scope keyed by name under its
    /// parent, repeated `[Namespace] name { ... }` blocks already write
    /// into the same scope as they're parsed; this call exists to let a
    /// caller re-validate a namespace after multiple files contribute to
    /// it (e.g. after import resolution) and collect the conflict list.
    pub fn merge_namespace(&mut self, parent: &[String], name: &str) -> Vec<SymbolConflict> {
        let Some(scope) = self.scope_mut(parent, false) else { return Vec::new() };
        if !scope.children.contains_key(name) {
            return Vec::new();
        }
        // Entries are already unified because `add_symbol` writes into the
        // same namespace scope regardless of which declaration introduced
        // it; surface any latent duplicate as a conflict list by rescanning.
        let sub = scope.children.get(name).unwrap();
        let mut seen: std::collections::HashMap<(SymbolKind, String), SourcePos> = std::collections::HashMap::new();
        let mut conflicts = Vec::new();
        for (key, entry) in &sub.entries {
            if let Some(prev) = seen.get(key) {
                conflicts.push(SymbolConflict {
                    kind: key.0,
                    name: key.1.clone(),
                    namespace: parent.iter().cloned().chain(std::iter::once(name.to_string())).collect(),
                    existing: *prev,
                    incoming: entry.position,
                });
            } else {
                seen.insert(key.clone(), entry.position);
            }
        }
        conflicts
    }

    pub fn namespace_exists(&self, path: &[String]) -> bool {
        self.scope(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos { file_id: 0, offset: 0, line: 1, column: 1 }
    }

    #[test]
    fn lookup_walks_ancestors_to_root() {
        let mut table = SymbolTable::new();
        table.add_symbol(
            &[],
            SymbolEntry { kind: SymbolKind::TemplateStyle, name: "Base".into(), position: pos(), owning_file: 0, node_id: 0 },
        );
        let found = table.find_symbol(SymbolKind::TemplateStyle, "Base", &["UI".to_string()], false);
        assert!(found.is_some());
    }

    #[test]
    fn same_name_different_kind_coexists() {
        let mut table = SymbolTable::new();
        let c1 = table.add_symbol(
            &[],
            SymbolEntry { kind: SymbolKind::TemplateStyle, name: "Card".into(), position: pos(), owning_file: 0, node_id: 0 },
        );
        let c2 = table.add_symbol(
            &[],
            SymbolEntry { kind: SymbolKind::TemplateElement, name: "Card".into(), position: pos(), owning_file: 0, node_id: 1 },
        );
        assert!(c1.is_none());
        assert!(c2.is_none());
    }

    #[test]
    fn duplicate_kind_and_name_conflicts_and_keeps_existing_by_default() {
        let mut table = SymbolTable::new();
        table.add_symbol(
            &[],
            SymbolEntry { kind: SymbolKind::TemplateStyle, name: "Base".into(), position: pos(), owning_file: 0, node_id: 0 },
        );
        let conflict = table.add_symbol(
            &[],
            SymbolEntry { kind: SymbolKind::TemplateStyle, name: "Base".into(), position: pos(), owning_file: 0, node_id: 7 },
        );
        assert!(conflict.is_some());
        let found = table.find_symbol(SymbolKind::TemplateStyle, "Base", &[], false).unwrap();
        assert_eq!(found.node_id, 0);
    }

    #[test]
    fn official_prefix_only_searched_when_requested() {
        let mut table = SymbolTable::new();
        table.add_symbol(
            &["chtl".to_string()],
            SymbolEntry { kind: SymbolKind::TemplateElement, name: "Card".into(), position: pos(), owning_file: 0, node_id: 0 },
        );
        assert!(table.find_symbol(SymbolKind::TemplateElement, "Card", &[], false).is_none());
        assert!(table.find_symbol(SymbolKind::TemplateElement, "Card", &[], true).is_some());
    }
}
