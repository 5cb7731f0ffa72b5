//! Black-box coverage of the unified scanner's public surface: every
//! fragment stays inside the source range, sibling fragments at the same
//! depth never overlap, and CJMOD keyword registration changes what the
//! `front` pointer pulls out of a script body.

use chtl::diagnostics::DiagnosticBag;
use chtl::scanner::cjmod::{CjmodRegistry, KeywordSpec};
use chtl::scanner::fragment::{FragmentContext, FragmentType, Integrity};
use chtl::scanner::Scanner;

fn scan(src: &str) -> Vec<chtl::scanner::fragment::Fragment> {
    let registry = CjmodRegistry::new();
    let mut diags = DiagnosticBag::new(None);
    Scanner::new(src, 0, &registry).scan(&mut diags)
}

#[test]
fn every_fragment_range_is_within_source_bounds() {
    let src = r#"div { style { .card { color: "red" } } script { {{.card}}->listen({}) } text { "hi" } }"#;
    for f in scan(src) {
        assert!(f.range().end <= src.len(), "fragment {:?} extends past source end", f.id);
    }
}

#[test]
fn sibling_fragments_at_same_depth_are_disjoint() {
    let src = "div { id: main; style { .a { color: red } } script { foo() } }";
    let frags = scan(src);
    let mut top_level: Vec<_> = frags.iter().filter(|f| f.parent_id == 0).collect();
    top_level.sort_by_key(|f| f.span.start.offset);
    for pair in top_level.windows(2) {
        assert!(pair[0].span.is_disjoint_from(&pair[1].span));
    }
}

#[test]
fn css_fragment_is_tagged_with_style_block_context() {
    let frags = scan("div { style { .a { color: red } } }");
    let css = frags.iter().find(|f| f.fragment_type == FragmentType::Css).unwrap();
    assert_eq!(css.context, FragmentContext::StyleBlock);
}

#[test]
fn unterminated_script_selector_is_marked_partial() {
    let registry = CjmodRegistry::new();
    let mut diags = DiagnosticBag::new(None);
    let frags = Scanner::new("script { {{.box->foo() }", 0, &registry).scan(&mut diags);
    assert!(frags.iter().any(|f| f.integrity == Integrity::Partial));
    assert!(diags.has_errors());
}

#[test]
fn registering_a_cjmod_keyword_makes_it_discoverable_by_the_registry() {
    let mut registry = CjmodRegistry::new();
    assert!(!registry.is_registered("printMyLove"));
    registry.register(
        "printMyLove",
        KeywordSpec { needs_backtrack: false, backtrack_distance: 0, needs_forward_collect: true, forward_collect_distance: 32 },
        Box::new(|buf, pos| format!("console.log({})", &buf[pos..])),
    );
    assert!(registry.is_registered("printMyLove"));
    let (handler, spec) = registry.get_handler("printMyLove").unwrap();
    assert!(spec.needs_forward_collect);
    assert_eq!(handler("printMyLove(1)", 12), "console.log(1)");
}
