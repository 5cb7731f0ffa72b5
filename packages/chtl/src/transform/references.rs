//! Step 6: `&` / `{{&}}` reference resolution. A bare `&` selector in a
//! local style block, or a bare `&` / `{{&}}` token in a script block,
//! stands for "the nearest ancestor element's own selector" — picked by
//! priority (style: class > id > tag; script: id > class > tag) from
//! whatever attribute selector automation already settled on.

use crate::ast::{Ast, NodeKind, SelectorKind};
use once_cell::sync::Lazy;
use regex::Regex;

static AMPERSAND_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*&\s*\}\}").unwrap());

pub fn resolve(ast: &mut Ast) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        match ast.kind(i) {
            NodeKind::StyleSelector { kind: SelectorKind::Ampersand, .. } => {
                if let Some(element) = ast.nearest_ancestor_element(i) {
                    if let Some((kind, value)) = own_selector(ast, element, Priority::Style) {
                        let span = ast.get(i).span;
                        *ast.get_mut(i) = crate::ast::NodeData {
                            kind: NodeKind::StyleSelector { kind, value, combinator: None, left: None, right: None },
                            span,
                        };
                    }
                }
            }
            NodeKind::ScriptBlock { content, .. } if content.contains('&') => {
                if let Some(element) = ast.nearest_ancestor_element(i) {
                    if let Some((kind, value)) = own_selector(ast, element, Priority::Script) {
                        // `{{&}}` is an already-braced reference; collapse the
                        // whole token to `{{selector}}` first. Any `&` left
                        // over afterward is a bare reference and gets wrapped
                        // in braces the same way (textual — see the design
                        // note about script bodies not being tokenized here).
                        let replacement = format!("{{{{{}}}}}", selector_literal(kind, &value));
                        let span = ast.get(i).span;
                        let NodeKind::ScriptBlock { is_local, content } = ast.kind(i).clone() else { unreachable!() };
                        let braced = AMPERSAND_TOKEN.replace_all(&content, replacement.as_str()).into_owned();
                        let new_content = braced.replace('&', &replacement);
                        *ast.get_mut(i) = crate::ast::NodeData {
                            kind: NodeKind::ScriptBlock { is_local, content: new_content },
                            span,
                        };
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
}

enum Priority {
    Style,
    Script,
}

fn selector_literal(kind: SelectorKind, value: &str) -> String {
    match kind {
        SelectorKind::Class => format!(".{value}"),
        SelectorKind::Id => format!("#{value}"),
        _ => value.to_string(),
    }
}

/// The ancestor element's own class/id/tag selector (bare name, matching
/// how `StyleSelector::value` is stored elsewhere), in the priority order
/// the calling context (style vs. script) requires.
fn own_selector(ast: &Ast, element: u32, priority: Priority) -> Option<(SelectorKind, String)> {
    let NodeKind::Element { tag, attrs, .. } = ast.kind(element) else { return None };
    let class = attrs
        .iter()
        .find(|a| a.name == "class")
        .and_then(|a| a.value.split_whitespace().next())
        .map(|c| c.to_string());
    let id = attrs.iter().find(|a| a.name == "id").map(|a| a.value.clone()).filter(|v| !v.is_empty());
    match priority {
        Priority::Style => class
            .map(|c| (SelectorKind::Class, c))
            .or_else(|| id.map(|i| (SelectorKind::Id, i)))
            .or_else(|| Some((SelectorKind::Element, tag.clone()))),
        Priority::Script => id
            .map(|i| (SelectorKind::Id, i))
            .or_else(|| class.map(|c| (SelectorKind::Class, c)))
            .or_else(|| Some((SelectorKind::Element, tag.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};
    use crate::symbol::SymbolTable;

    #[test]
    fn ampersand_resolves_to_class_when_present() {
        let mut symbols = SymbolTable::new();
        let src = r#"div { style { .box { color: "red"; } & { border: "1px"; } } }"#;
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        crate::transform::selectors::automate(&mut ast, &crate::config::Configuration::default());
        resolve(&mut ast);
        let resolved = (0..ast.len() as u32).find_map(|id| match ast.kind(id) {
            NodeKind::StyleSelector { kind: SelectorKind::Class, value, .. } if value == "box" => Some(true),
            _ => None,
        });
        assert!(resolved.is_some());
    }

    #[test]
    fn bare_ampersand_in_script_resolves_to_id_with_braces() {
        let mut symbols = SymbolTable::new();
        let src = r#"div { class: w; id: s; script { &.hide() } }"#;
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        crate::transform::selectors::automate(&mut ast, &crate::config::Configuration::default());
        resolve(&mut ast);
        let content = (0..ast.len() as u32).find_map(|id| match ast.kind(id) {
            NodeKind::ScriptBlock { content, .. } => Some(content.clone()),
            _ => None,
        });
        assert_eq!(content.as_deref(), Some("{{#s}}.hide()"));
    }
}
