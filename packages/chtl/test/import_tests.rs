//! Black-box coverage of import path classification and filesystem
//! resolution, exercised against real files on disk rather than the pure
//! string-only cases already covered inline in the `import` module.

use chtl::ast::ImportKind;
use chtl::import::{self, ImportOutcome, PathClass};
use std::fs;
use std::path::PathBuf;

fn tmp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chtl-import-integration-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn directory_path_without_trailing_slash_is_still_classified_as_directory_when_it_exists_on_disk() {
    // classify_path is a pure, pre-filesystem-access classifier: a bare
    // "components" with no extension and no wildcard is ambiguous between
    // NameOnly and DirectoryPath until the filesystem is actually checked,
    // which `resolve_one_import` (the pipeline caller) does separately.
    assert_eq!(import::classify_path("components/"), PathClass::DirectoryPath("components".into()));
    assert_eq!(import::classify_path("components"), PathClass::NameOnly("components".into()));
}

#[test]
fn resolve_file_prefers_cmod_over_chtl_within_the_same_root() {
    let dir = tmp_dir("ext-pref");
    fs::write(dir.join("Widget.chtl"), b"div {}").unwrap();
    fs::write(dir.join("Widget.cmod"), b"PK\x03\x04").unwrap();

    let found = import::resolve_file(ImportKind::Chtl, "Widget", &[dir.clone()]).unwrap();
    assert_eq!(found.extension().unwrap(), "cmod");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn resolve_file_falls_through_search_roots_in_priority_order() {
    let official = tmp_dir("roots-official");
    let module = tmp_dir("roots-module");
    let cwd = tmp_dir("roots-cwd");
    fs::write(cwd.join("Widget.chtl"), b"div {}").unwrap();

    let found = import::resolve_file(ImportKind::Chtl, "Widget", &[official.clone(), module.clone(), cwd.clone()]);
    assert_eq!(found, Some(cwd.join("Widget.chtl")));

    fs::write(module.join("Widget.chtl"), b"div {}").unwrap();
    let found = import::resolve_file(ImportKind::Chtl, "Widget", &[official.clone(), module.clone(), cwd.clone()]);
    assert_eq!(found, Some(module.join("Widget.chtl")));

    fs::remove_dir_all(&official).ok();
    fs::remove_dir_all(&module).ok();
    fs::remove_dir_all(&cwd).ok();
}

#[test]
fn resolve_file_returns_none_when_no_root_has_a_match() {
    let dir = tmp_dir("no-match");
    let found = import::resolve_file(ImportKind::Style, "missing", &[dir.clone()]);
    assert_eq!(found, None);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn expand_wildcard_is_sorted_non_recursive_and_respects_extension_filter() {
    let dir = tmp_dir("wildcard");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.chtl"), b"").unwrap();
    fs::write(dir.join("a.chtl"), b"").unwrap();
    fs::write(dir.join("a.css"), b"").unwrap();
    fs::write(dir.join("nested").join("c.chtl"), b"").unwrap();

    let all = import::expand_wildcard(&dir, None).unwrap();
    assert_eq!(all.len(), 3, "{all:?}");

    let chtl_only = import::expand_wildcard(&dir, Some("chtl")).unwrap();
    assert_eq!(chtl_only, vec![dir.join("a.chtl"), dir.join("b.chtl")]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn search_roots_for_local_only_kinds_is_a_single_entry() {
    let cwd = PathBuf::from("/project");
    let official = PathBuf::from("/official");
    assert_eq!(import::search_roots(ImportKind::Style, &cwd, &official), vec![cwd.clone()]);
    assert_eq!(
        import::search_roots(ImportKind::Chtl, &cwd, &official),
        vec![official, cwd.join("module"), cwd]
    );
}

#[test]
fn three_way_diamond_import_is_a_duplicate_not_a_cycle() {
    // main imports both a and b; a and b both import shared. shared should
    // resolve once (Fresh) and be suppressed (Duplicate) the second time,
    // without being mistaken for a cycle back to main.
    let mut graph = import::ImportGraph::new();
    assert_eq!(graph.try_add_edge("main.chtl", "a.chtl"), ImportOutcome::Fresh);
    assert_eq!(graph.try_add_edge("main.chtl", "b.chtl"), ImportOutcome::Fresh);
    assert_eq!(graph.try_add_edge("a.chtl", "shared.chtl"), ImportOutcome::Fresh);
    assert_eq!(graph.try_add_edge("b.chtl", "shared.chtl"), ImportOutcome::Duplicate);
}

#[test]
fn self_import_is_refused_as_a_cycle() {
    let mut graph = import::ImportGraph::new();
    assert_eq!(graph.try_add_edge("a.chtl", "a.chtl"), ImportOutcome::Cycle);
}

#[test]
fn normalized_spellings_of_the_same_path_collapse_in_the_duplicate_cache() {
    let mut graph = import::ImportGraph::new();
    assert_eq!(graph.try_add_edge("main.chtl", "components/widget.chtl"), ImportOutcome::Fresh);
    assert_eq!(
        graph.try_add_edge("other.chtl", "components/../components/widget.chtl"),
        ImportOutcome::Duplicate
    );
}
