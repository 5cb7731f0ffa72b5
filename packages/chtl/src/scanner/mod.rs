//! The unified scanner: slices a heterogeneous CHTL source into typed
//! fragments using a two-pointer sliding window plus front-extraction for
//! CHTL-JS syntax embedded inside `script { ... }` bodies, then builds a
//! fragment dependency index.

pub mod cjmod;
pub mod fragment;

use crate::diagnostics::{DiagnosticBag, Phase, Severity};
use crate::source::{PositionTracker, SourcePos, SourceSpan};
use cjmod::CjmodRegistry;
use fragment::{Fragment, FragmentContext, FragmentId, FragmentType, Integrity};
use regex::Regex;
use std::collections::HashMap;

/// Prefix window swept before the main pass so a cut-point keyword near the
/// very start of the source cannot be missed by the `front` pointer.
pub const INITIAL_SCAN_WINDOW: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Global,
    Element,
    Style,
    Script,
}

struct Scope {
    kind: ScopeKind,
    fragment_id: FragmentId,
}

pub struct Scanner<'a> {
    src: &'a str,
    file_id: u32,
    registry: &'a CjmodRegistry,
    fragments: Vec<Fragment>,
    next_id: FragmentId,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str, file_id: u32, registry: &'a CjmodRegistry) -> Self {
        Scanner { src, file_id, registry, fragments: Vec::new(), next_id: 1 }
    }

    fn alloc_id(&mut self) -> FragmentId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn pos_at(&self, byte_offset: usize) -> SourcePos {
        let mut tracker = PositionTracker::new(self.file_id);
        tracker.advance_str(&self.src[..byte_offset]);
        tracker.pos()
    }

    /// Sweep the first [`INITIAL_SCAN_WINDOW`] bytes for any registered
    /// CJMOD keyword so a handler near the source start is never missed by
    /// the forward-only `front` pointer.
    fn initial_scan_hits(&self) -> Vec<(usize, String)> {
        let window = self.src.len().min(INITIAL_SCAN_WINDOW);
        let mut hits = Vec::new();
        for keyword in self.registry.registered_keywords() {
            if let Some(idx) = self.src[..window].find(keyword) {
                hits.push((idx, keyword.to_string()));
            }
        }
        hits.sort_by_key(|(idx, _)| *idx);
        hits
    }

    pub fn scan(mut self, diags: &mut DiagnosticBag) -> Vec<Fragment> {
        let _ = self.initial_scan_hits();
        let mut scopes = vec![Scope { kind: ScopeKind::Global, fragment_id: 0 }];
        let mut back = 0usize;
        let mut front = 0usize;
        let bytes = self.src.as_bytes();

        while front < bytes.len() {
            if self.src[front..].starts_with("style") && self.at_block_keyword_boundary(front, "style") {
                self.flush_chtl(&mut back, front, &scopes);
                let (content_start, content_end, next_front) = match self.slice_block(front + "style".len()) {
                    Some(v) => v,
                    None => {
                        diags.error(self.pos_at(front), "unterminated style block", Phase::Scanning);
                        front += 1;
                        continue;
                    }
                };
                let is_local = matches!(scopes.last().unwrap().kind, ScopeKind::Element);
                let ctx = if is_local { FragmentContext::StyleBlock } else { FragmentContext::Global };
                let id = self.emit(
                    FragmentType::Css,
                    content_start,
                    content_end,
                    ctx,
                    Integrity::Complete,
                    Some("style".into()),
                    scopes.last().unwrap().fragment_id,
                );
                back = next_front;
                front = next_front;
                let _ = id;
                continue;
            }

            if self.src[front..].starts_with("script") && self.at_block_keyword_boundary(front, "script") {
                self.flush_chtl(&mut back, front, &scopes);
                let (content_start, content_end, next_front) = match self.slice_block(front + "script".len()) {
                    Some(v) => v,
                    None => {
                        diags.error(self.pos_at(front), "unterminated script block", Phase::Scanning);
                        front += 1;
                        continue;
                    }
                };
                let is_local = matches!(scopes.last().unwrap().kind, ScopeKind::Element);
                let ctx = if is_local { FragmentContext::ScriptBlock } else { FragmentContext::Global };
                let parent = scopes.last().unwrap().fragment_id;
                self.scan_script_body(content_start, content_end, ctx, parent, diags);
                back = next_front;
                front = next_front;
                continue;
            }

            if bytes[front] == b'{' {
                // Entering an element body; record scope so nested
                // style/script blocks are correctly marked local.
                scopes.push(Scope { kind: ScopeKind::Element, fragment_id: scopes.last().unwrap().fragment_id });
                front += 1;
                continue;
            }
            if bytes[front] == b'}' {
                if scopes.len() > 1 {
                    scopes.pop();
                }
                front += 1;
                continue;
            }

            front += 1;
        }

        self.flush_chtl(&mut back, self.src.len(), &scopes);
        self.build_dependency_index();
        self.fragments
    }

    /// True when `front..front+keyword.len()` is `keyword` immediately
    /// followed by optional whitespace and `{`, and not itself part of a
    /// longer identifier (so `style-guide` doesn't cut).
    fn at_block_keyword_boundary(&self, front: usize, keyword: &str) -> bool {
        let after = front + keyword.len();
        if self.src[after..].chars().next().map(|c| c.is_alphanumeric() || c == '_').unwrap_or(false) {
            return false;
        }
        if front > 0 {
            let before = self.src[..front].chars().next_back();
            if before.map(|c| c.is_alphanumeric() || c == '_').unwrap_or(false) {
                return false;
            }
        }
        self.src[after..].trim_start().starts_with('{')
    }

    /// Given the position right after a `style`/`script` keyword, locates
    /// the block's opening and matching closing brace, returning
    /// `(content_start, content_end, position_after_closing_brace)`.
    fn slice_block(&self, after_keyword: usize) -> Option<(usize, usize, usize)> {
        let rel_open = self.src[after_keyword..].find('{')?;
        let open = after_keyword + rel_open;
        let close = find_matching_brace(self.src, open)?;
        Some((open + 1, close, close + 1))
    }

    fn flush_chtl(&mut self, back: &mut usize, front: usize, scopes: &[Scope]) {
        if *back >= front {
            *back = front;
            return;
        }
        let ctx = match scopes.last().unwrap().kind {
            ScopeKind::Global => FragmentContext::Global,
            ScopeKind::Element => FragmentContext::HtmlElement,
            ScopeKind::Style => FragmentContext::StyleBlock,
            ScopeKind::Script => FragmentContext::ScriptBlock,
        };
        self.emit(FragmentType::Chtl, *back, front, ctx, Integrity::Complete, None, scopes.last().unwrap().fragment_id);
        *back = front;
    }

    fn emit(
        &mut self,
        fragment_type: FragmentType,
        start: usize,
        end: usize,
        context: FragmentContext,
        integrity: Integrity,
        trigger_keyword: Option<String>,
        parent_id: FragmentId,
    ) -> FragmentId {
        if start >= end {
            return 0;
        }
        let id = self.alloc_id();
        let content = self.src[start..end].to_string();
        let contained_keywords = contained_keywords(&content);
        self.fragments.push(Fragment {
            id,
            fragment_type,
            content,
            span: SourceSpan::new(self.pos_at(start), self.pos_at(end)),
            context,
            integrity,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            parent_id,
            children: Vec::new(),
            merge_order: id,
            trigger_keyword,
            contained_keywords,
            is_minimal_unit: matches!(fragment_type, FragmentType::ChtlJs),
        });
        id
    }

    /// Front-extraction: within a script body, slice out CHTL-JS cut points
    /// (`{{ ... }}`, `->`, registered CJMOD keywords) as their own
    /// fragments, leaving the residue as plain JS fragments.
    fn scan_script_body(
        &mut self,
        start: usize,
        end: usize,
        ctx: FragmentContext,
        parent_id: FragmentId,
        diags: &mut DiagnosticBag,
    ) {
        let body = &self.src[start..end];
        let mut back = 0usize;
        let mut front = 0usize;
        let bytes = body.as_bytes();

        while front < bytes.len() {
            if body[front..].starts_with("{{") {
                if back < front {
                    self.emit(FragmentType::Js, start + back, start + front, ctx, Integrity::Complete, None, parent_id);
                }
                match body[front..].find("}}") {
                    Some(rel_close) => {
                        let close = front + rel_close + 2;
                        let id = self.emit(
                            FragmentType::ChtlJs,
                            start + front,
                            start + close,
                            ctx,
                            Integrity::Complete,
                            Some("{{".into()),
                            parent_id,
                        );
                        let _ = id;
                        back = close;
                        front = close;
                        continue;
                    }
                    None => {
                        self.emit(FragmentType::ChtlJs, start + front, end, ctx, Integrity::Partial, Some("{{".into()), parent_id);
                        diags.error(self.pos_at(start + front), "unterminated {{ }} enhanced selector", Phase::Scanning);
                        back = bytes.len();
                        front = bytes.len();
                        break;
                    }
                }
            }

            if body[front..].starts_with("->") {
                if back < front {
                    self.emit(FragmentType::Js, start + back, start + front, ctx, Integrity::Complete, None, parent_id);
                }
                self.emit(
                    FragmentType::ChtlJs,
                    start + front,
                    start + front + 2,
                    ctx,
                    Integrity::Complete,
                    Some("->".into()),
                    parent_id,
                );
                back = front + 2;
                front = back;
                continue;
            }

            let mut matched_keyword = None;
            for keyword in self.registry.registered_keywords() {
                if body[front..].starts_with(keyword) {
                    matched_keyword = Some(keyword.to_string());
                    break;
                }
            }
            if let Some(keyword) = matched_keyword {
                if back < front {
                    self.emit(FragmentType::Js, start + back, start + front, ctx, Integrity::Complete, None, parent_id);
                }
                let (handler, spec) = self.registry.get_handler(&keyword).unwrap();
                let from = if spec.needs_backtrack { front.saturating_sub(spec.backtrack_distance) } else { front };
                let to = if spec.needs_forward_collect {
                    (front + keyword.len() + spec.forward_collect_distance).min(body.len())
                } else {
                    front + keyword.len()
                };
                let replacement = handler(&body[from..to], front - from);
                let id = self.alloc_id();
                self.fragments.push(Fragment {
                    id,
                    fragment_type: FragmentType::ChtlJs,
                    content: replacement,
                    span: SourceSpan::new(self.pos_at(start + from), self.pos_at(start + to)),
                    context: ctx,
                    integrity: Integrity::Complete,
                    dependencies: Vec::new(),
                    dependents: Vec::new(),
                    parent_id,
                    children: Vec::new(),
                    merge_order: id,
                    trigger_keyword: Some(keyword),
                    contained_keywords: Vec::new(),
                    is_minimal_unit: true,
                });
                back = to;
                front = to;
                continue;
            }

            front += 1;
        }

        if back < bytes.len() {
            self.emit(FragmentType::Js, start + back, end, ctx, Integrity::Complete, None, parent_id);
        }
    }

    /// Second pass: a script fragment referencing `.foo`/`#foo` depends on
    /// any sibling style fragment defining that selector; every fragment
    /// with a `parent_id` depends on its parent. `merge_order` is a
    /// topological sort of the resulting DAG, ties broken by lexical span
    /// start.
    fn build_dependency_index(&mut self) {
        let selector_ref = Regex::new(r"[.#][A-Za-z_][\w-]*").unwrap();
        let mut defines: HashMap<String, Vec<FragmentId>> = HashMap::new();
        for f in &self.fragments {
            if f.fragment_type == FragmentType::Css {
                for cap in selector_ref.find_iter(&f.content) {
                    defines.entry(cap.as_str().to_string()).or_default().push(f.id);
                }
            }
        }

        let mut extra_deps: Vec<(FragmentId, FragmentId)> = Vec::new();
        for f in &self.fragments {
            if matches!(f.fragment_type, FragmentType::Js | FragmentType::ChtlJs) {
                for cap in selector_ref.find_iter(&f.content) {
                    if let Some(defs) = defines.get(cap.as_str()) {
                        for &dep in defs {
                            if dep != f.id {
                                extra_deps.push((f.id, dep));
                            }
                        }
                    }
                }
            }
            if f.parent_id != 0 {
                extra_deps.push((f.id, f.parent_id));
            }
        }

        let mut by_id: HashMap<FragmentId, usize> = HashMap::new();
        for (i, f) in self.fragments.iter().enumerate() {
            by_id.insert(f.id, i);
        }
        for (from, to) in extra_deps {
            if let Some(&idx) = by_id.get(&from) {
                if !self.fragments[idx].dependencies.contains(&to) {
                    self.fragments[idx].dependencies.push(to);
                }
            }
            if let Some(&idx) = by_id.get(&to) {
                if !self.fragments[idx].dependents.contains(&from) {
                    self.fragments[idx].dependents.push(from);
                }
            }
        }

        // Topological sort (Kahn's algorithm), ties broken by lexical
        // position (fragment id order, since ids are assigned in source
        // order).
        let ids: Vec<FragmentId> = self.fragments.iter().map(|f| f.id).collect();
        let mut indegree: HashMap<FragmentId, usize> = ids.iter().map(|&id| (id, 0)).collect();
        for f in &self.fragments {
            for _dep in &f.dependencies {
                *indegree.get_mut(&f.id).unwrap() += 1;
            }
        }
        let mut ready: std::collections::BTreeSet<FragmentId> =
            ids.iter().copied().filter(|id| indegree[id] == 0).collect();
        let mut order = Vec::new();
        let dependents_of: HashMap<FragmentId, Vec<FragmentId>> =
            self.fragments.iter().map(|f| (f.id, f.dependents.clone())).collect();
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(next);
            for &dep in dependents_of.get(&next).unwrap_or(&Vec::new()) {
                if let Some(d) = indegree.get_mut(&dep) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(dep);
                    }
                }
            }
        }
        for (rank, id) in order.iter().enumerate() {
            if let Some(&idx) = by_id.get(id) {
                self.fragments[idx].merge_order = rank as u32;
            }
        }
    }
}

/// Count braces/parens while skipping quoted strings; returns the offset of
/// the matching `}` for the `{` at `open`.
pub fn find_matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0i32;
    let mut i = open;
    let mut in_string: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => in_string = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn contained_keywords(content: &str) -> Vec<String> {
    const KEYWORDS: &[&str] = &["style", "script", "inherit", "delete", "insert", "except", "text"];
    KEYWORDS.iter().filter(|k| content.contains(*k)).map(|s| s.to_string()).collect()
}

/// Query helpers over a finished fragment set.
pub struct FragmentIndex<'a> {
    fragments: &'a [Fragment],
}

impl<'a> FragmentIndex<'a> {
    pub fn new(fragments: &'a [Fragment]) -> Self {
        FragmentIndex { fragments }
    }

    pub fn by_type(&self, t: FragmentType) -> Vec<&'a Fragment> {
        self.fragments.iter().filter(|f| f.fragment_type == t).collect()
    }

    pub fn by_context(&self, ctx: FragmentContext) -> Vec<&'a Fragment> {
        self.fragments.iter().filter(|f| f.context == ctx).collect()
    }

    pub fn containing_keyword(&self, keyword: &str) -> Vec<&'a Fragment> {
        self.fragments.iter().filter(|f| f.contained_keywords.iter().any(|k| k == keyword)).collect()
    }

    pub fn dependencies_of(&self, id: FragmentId) -> Vec<&'a Fragment> {
        let Some(f) = self.fragments.iter().find(|f| f.id == id) else { return Vec::new() };
        f.dependencies.iter().filter_map(|dep| self.fragments.iter().find(|g| g.id == *dep)).collect()
    }

    pub fn incomplete(&self) -> Vec<&'a Fragment> {
        self.fragments.iter().filter(|f| !matches!(f.integrity, Integrity::Complete)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticBag;

    fn scan(src: &str) -> Vec<Fragment> {
        let registry = CjmodRegistry::new();
        let mut diags = DiagnosticBag::new(None);
        Scanner::new(src, 0, &registry).scan(&mut diags)
    }

    #[test]
    fn splits_style_block_into_css_fragment() {
        let frags = scan("div { style { .a { color: red } } }");
        let css = frags.iter().find(|f| f.fragment_type == FragmentType::Css).unwrap();
        assert!(css.content.contains("color: red"));
        assert_eq!(css.context, FragmentContext::StyleBlock);
    }

    #[test]
    fn script_block_splits_enhanced_selector_into_chtl_js() {
        let frags = scan("div { script { {{.box}}->listen({click:()=>{}}) } }");
        let js = frags.iter().filter(|f| f.fragment_type == FragmentType::ChtlJs).count();
        assert!(js >= 2, "expected at least the {{}} selector and -> to be split out");
    }

    #[test]
    fn unterminated_enhanced_selector_is_partial_and_diagnosed() {
        let registry = CjmodRegistry::new();
        let mut diags = DiagnosticBag::new(None);
        let frags = Scanner::new("script { {{.box->foo() }", 0, &registry).scan(&mut diags);
        assert!(frags.iter().any(|f| f.integrity == Integrity::Partial));
        assert!(diags.has_errors());
    }

    #[test]
    fn ranges_cover_entire_source_and_are_disjoint_at_same_depth() {
        let src = "div { id: main; style { .a { color: red } } script { foo() } }";
        let frags = scan(src);
        let mut top_level: Vec<_> = frags.iter().filter(|f| f.parent_id == 0).collect();
        top_level.sort_by_key(|f| f.span.start.offset);
        for w in top_level.windows(2) {
            assert!(w[0].span.is_disjoint_from(&w[1].span));
        }
    }

    #[test]
    fn dependency_index_links_script_to_defining_style() {
        let src = "div { style { .card { color: red } } script { {{.card}}->listen({}) } }";
        let frags = scan(src);
        let css = frags.iter().find(|f| f.fragment_type == FragmentType::Css).unwrap();
        let chtljs = frags.iter().find(|f| f.fragment_type == FragmentType::ChtlJs && f.content.contains(".card")).unwrap();
        assert!(chtljs.dependencies.contains(&css.id));
    }

    #[test]
    fn find_matching_brace_skips_braces_in_strings() {
        let src = r#"{ "a}b" }"#;
        assert_eq!(find_matching_brace(src, 0), Some(src.len() - 1));
    }
}
