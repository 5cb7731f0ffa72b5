//! Import resolution: classifies a `from "..."` path, searches the
//! filesystem in the order the import kind dictates, expands wildcards,
//! and tracks a duplicate/cycle-detection cache across an entire compile.

use crate::ast::ImportKind;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Syntactic shape of a `from "..."` argument, decided before any
/// filesystem access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    /// A bare name with no separator or extension (`"Chtholly"`).
    NameOnly(String),
    /// Ends in a recognized extension and contains no wildcard (`"a/b.chtl"`).
    SpecificFile(String),
    /// Contains a path separator but no extension or wildcard.
    SpecificPath(String),
    /// Ends in `/` (or resolves to an existing directory).
    DirectoryPath(String),
    /// `dir/*` — every file directly inside `dir`.
    WildcardAll(String),
    /// `dir/*.ext` — every file with a given extension directly inside `dir`.
    WildcardTyped(String, String),
    /// `Mod.*` — every submodule of `Mod`.
    SubmoduleAll(String),
    /// `Mod.Sub` — one named submodule.
    SubmoduleSpecific(String, String),
}

const FILE_EXTENSIONS: &[&str] = &["chtl", "cmod", "cjmod", "html", "css", "js"];

pub fn classify_path(raw: &str) -> PathClass {
    if raw.ends_with("/*") {
        return PathClass::WildcardAll(raw.trim_end_matches("/*").to_string());
    }
    if let Some(stripped) = raw.strip_prefix("*.") {
        return PathClass::WildcardTyped(String::new(), stripped.to_string());
    }
    if let Some(idx) = raw.rfind("/*.") {
        let dir = &raw[..idx];
        let ext = &raw[idx + 3..];
        return PathClass::WildcardTyped(dir.to_string(), ext.to_string());
    }
    if raw.ends_with('/') {
        return PathClass::DirectoryPath(raw.trim_end_matches('/').to_string());
    }
    if !raw.contains('/') && !raw.contains('\\') {
        if let Some(dot) = raw.find('.') {
            let head = &raw[..dot];
            let tail = &raw[dot + 1..];
            let looks_like_file_ext = FILE_EXTENSIONS.contains(&tail) && !tail.contains('.');
            if !looks_like_file_ext {
                return if tail == "*" {
                    PathClass::SubmoduleAll(head.to_string())
                } else {
                    PathClass::SubmoduleSpecific(head.to_string(), tail.to_string())
                };
            }
            return PathClass::SpecificFile(raw.to_string());
        }
        return PathClass::NameOnly(raw.to_string());
    }
    if FILE_EXTENSIONS.iter().any(|ext| raw.ends_with(&format!(".{ext}"))) {
        return PathClass::SpecificFile(raw.to_string());
    }
    PathClass::SpecificPath(raw.to_string())
}

/// Normalizes `.`, `..`, backslashes, and repeated slashes so two spellings
/// of the same path compare equal in the duplicate-import cache.
pub fn normalize_path(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Whether a directory contains the classified `CMOD/`/`CJMOD/` shape
/// rather than a flat, mixed layout.
pub fn is_classified_module_dir(dir: &Path) -> bool {
    dir.join("CMOD").is_dir() || dir.join("CJMOD").is_dir()
}

/// Search roots in priority order for `@Chtl`/`@CJmod` imports: the
/// official module directory, then `./module/`, then the current
/// directory. `@Html`/`@Style`/`@JavaScript` search only the current
/// directory (callers pass a single-element list for those kinds).
pub fn search_roots(kind: ImportKind, current_dir: &Path, official_module_path: &Path) -> Vec<PathBuf> {
    match kind {
        ImportKind::Html | ImportKind::Style | ImportKind::JavaScript => vec![current_dir.to_path_buf()],
        ImportKind::Chtl | ImportKind::CJmod => {
            vec![official_module_path.to_path_buf(), current_dir.join("module"), current_dir.to_path_buf()]
        }
    }
}

fn candidate_extensions(kind: ImportKind) -> &'static [&'static str] {
    match kind {
        ImportKind::Html => &["html"],
        ImportKind::Style => &["css"],
        ImportKind::JavaScript => &["js"],
        ImportKind::Chtl => &["cmod", "chtl"],
        ImportKind::CJmod => &["cjmod"],
    }
}

/// Resolve a `NameOnly`/`SpecificFile`/`SpecificPath` import to a concrete
/// file, trying each search root in order and, within a root, the kind's
/// extension preference (cmod before chtl).
pub fn resolve_file(
    kind: ImportKind,
    name_or_path: &str,
    roots: &[PathBuf],
) -> Option<PathBuf> {
    for root in roots {
        let base = root.join(name_or_path);
        if base.is_file() {
            return Some(base);
        }
        for ext in candidate_extensions(kind) {
            let candidate = base.with_extension(ext);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Expands a wildcard import (`dir/*` or `dir/*.ext`) to the sorted set of
/// matching files directly inside `dir` (non-recursive).
pub fn expand_wildcard(dir: &Path, ext_filter: Option<&str>) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = ext_filter {
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
        }
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

/// File stem used as the default per-file namespace, unless
/// `DISABLE_DEFAULT_NAMESPACE` is set.
pub fn default_namespace_for(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
}

/// Tracks, across a whole compile, which normalized paths have already been
/// imported (duplicate suppression) and the edges of the import graph so a
/// cycle can be refused before it's added.
#[derive(Debug, Default)]
pub struct ImportGraph {
    imported: HashSet<String>,
    edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Fresh,
    Duplicate,
    Cycle,
}

impl ImportGraph {
    pub fn new() -> Self {
        ImportGraph::default()
    }

    /// Records an edge `from -> to` unless `to` is already imported
    /// (duplicate) or adding the edge would close a cycle back to `from`.
    pub fn try_add_edge(&mut self, from: &str, to: &str) -> ImportOutcome {
        let from = normalize_path(from);
        let to = normalize_path(to);
        if self.imported.contains(&to) {
            return ImportOutcome::Duplicate;
        }
        if self.would_cycle(&from, &to) {
            return ImportOutcome::Cycle;
        }
        self.edges.push((from, to.clone()));
        self.imported.insert(to);
        ImportOutcome::Fresh
    }

    /// DFS from `to` looking for a path back to `from`; finding one means
    /// the new edge `from -> to` would close a cycle.
    fn would_cycle(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![to.to_string()];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == *from {
                return true;
            }
            if !seen.insert(node.clone()) {
                continue;
            }
            for (src, dst) in &self.edges {
                if *src == node {
                    stack.push(dst.clone());
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_wildcard_all() {
        assert_eq!(classify_path("icons/*"), PathClass::WildcardAll("icons".into()));
    }

    #[test]
    fn classifies_wildcard_typed() {
        assert_eq!(classify_path("icons/*.chtl"), PathClass::WildcardTyped("icons".into(), "chtl".into()));
    }

    #[test]
    fn classifies_submodule_forms() {
        assert_eq!(classify_path("Chtholly.*"), PathClass::SubmoduleAll("Chtholly".into()));
        assert_eq!(classify_path("Chtholly.Card"), PathClass::SubmoduleSpecific("Chtholly".into(), "Card".into()));
    }

    #[test]
    fn classifies_specific_file_and_name_only() {
        assert_eq!(classify_path("Chtholly"), PathClass::NameOnly("Chtholly".into()));
        assert_eq!(classify_path("a/b.chtl"), PathClass::SpecificFile("a/b.chtl".into()));
    }

    #[test]
    fn normalizes_dot_segments_and_backslashes() {
        assert_eq!(normalize_path("a/./b/../c"), "a/c");
        assert_eq!(normalize_path("a\\b\\c"), "a/b/c");
    }

    #[test]
    fn duplicate_import_is_suppressed() {
        let mut graph = ImportGraph::new();
        assert_eq!(graph.try_add_edge("main.chtl", "a.chtl"), ImportOutcome::Fresh);
        assert_eq!(graph.try_add_edge("other.chtl", "a.chtl"), ImportOutcome::Duplicate);
    }

    #[test]
    fn cycle_is_refused() {
        let mut graph = ImportGraph::new();
        assert_eq!(graph.try_add_edge("a.chtl", "b.chtl"), ImportOutcome::Fresh);
        assert_eq!(graph.try_add_edge("b.chtl", "c.chtl"), ImportOutcome::Fresh);
        assert_eq!(graph.try_add_edge("c.chtl", "a.chtl"), ImportOutcome::Cycle);
    }
}
