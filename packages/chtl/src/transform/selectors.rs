//! Step 5: selector automation. A local style block's class/id selector,
//! or a script block's `{{.name}}` / `{{#name}}` enhanced selector, gets
//! its target attribute added to the nearest ancestor element when that
//! attribute isn't already present — style runs first; script only rescues
//! a class/id style didn't already add, and only when its (inverted) flag
//! enables it.

use crate::ast::{Ast, Attribute, NodeKind, SelectorKind};
use crate::config::Configuration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CLASS_SELECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*\.([A-Za-z_][\w-]*)").unwrap());
static ID_SELECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*#([A-Za-z_][\w-]*)").unwrap());

pub fn automate(ast: &mut Ast, config: &Configuration) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        if matches!(ast.kind(i), NodeKind::Element { .. }) {
            automate_for_element(ast, config, i);
        }
        i += 1;
    }
}

fn automate_for_element(ast: &mut Ast, config: &Configuration, element: u32) {
    let NodeKind::Element { children, .. } = ast.kind(element).clone() else { return };
    let mut added_class = HashSet::new();
    let mut added_id = HashSet::new();

    if !config.disable_style_auto_add_class || !config.disable_style_auto_add_id {
        for &child in &children {
            if let NodeKind::StyleBlock { is_local, .. } = ast.kind(child) {
                if !is_local {
                    continue;
                }
                for selector in style_selectors(ast, child) {
                    match ast.kind(selector) {
                        NodeKind::StyleSelector { kind: SelectorKind::Class, value, .. } if !config.disable_style_auto_add_class => {
                            added_class.insert(value.clone());
                        }
                        NodeKind::StyleSelector { kind: SelectorKind::Id, value, .. } if !config.disable_style_auto_add_id => {
                            added_id.insert(value.clone());
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    if config.script_class_rescue_enabled() || config.script_id_rescue_enabled() {
        for &child in &children {
            if let NodeKind::ScriptBlock { content, .. } = ast.kind(child) {
                if config.script_class_rescue_enabled() {
                    for cap in CLASS_SELECTOR.captures_iter(content) {
                        added_class.insert(cap[1].to_string());
                    }
                }
                if config.script_id_rescue_enabled() {
                    for cap in ID_SELECTOR.captures_iter(content) {
                        added_id.insert(cap[1].to_string());
                    }
                }
            }
        }
    }

    if added_class.is_empty() && added_id.is_empty() {
        return;
    }
    let NodeKind::Element { attrs, .. } = &mut ast.get_mut(element).kind else { return };
    merge_attr(attrs, "class", added_class);
    merge_attr(attrs, "id", added_id);
}

fn merge_attr(attrs: &mut Vec<Attribute>, key: &str, names: HashSet<String>) {
    if names.is_empty() {
        return;
    }
    if let Some(existing) = attrs.iter_mut().find(|a| a.name == key) {
        let mut present: HashSet<&str> = existing.value.split_whitespace().collect();
        let mut extra = Vec::new();
        for name in &names {
            if present.insert(name) {
                extra.push(name.clone());
            }
        }
        for name in extra {
            if !existing.value.is_empty() {
                existing.value.push(' ');
            }
            existing.value.push_str(&name);
        }
    } else {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        attrs.push(Attribute { name: key.to_string(), value: names.join(" "), uses_ce_equality: false });
    }
}

/// Every simple selector reachable from a style block's rules, unpacking
/// combinator chains into their left/right parts.
fn style_selectors(ast: &Ast, style_block: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let NodeKind::StyleBlock { children, .. } = ast.kind(style_block) else { return out };
    for &child in children {
        if let NodeKind::StyleRule { selector, .. } = ast.kind(child) {
            collect_simple_selectors(ast, *selector, &mut out);
        }
    }
    out
}

fn collect_simple_selectors(ast: &Ast, selector: u32, out: &mut Vec<u32>) {
    match ast.kind(selector) {
        NodeKind::StyleSelector { kind: SelectorKind::Combinator, left, right, .. } => {
            if let Some(l) = left {
                collect_simple_selectors(ast, *l, out);
            }
            if let Some(r) = right {
                collect_simple_selectors(ast, *r, out);
            }
        }
        NodeKind::StyleSelector { .. } => out.push(selector),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};
    use crate::symbol::SymbolTable;

    #[test]
    fn class_selector_adds_class_attribute() {
        let mut symbols = SymbolTable::new();
        let src = r#"div { style { .box { color: "red"; } } }"#;
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        automate(&mut ast, &Configuration::default());
        let el = (0..ast.len() as u32).find(|&id| matches!(ast.kind(id), NodeKind::Element { .. })).unwrap();
        let NodeKind::Element { attrs, .. } = ast.kind(el) else { unreachable!() };
        assert!(attrs.iter().any(|a| a.name == "class" && a.value == "box"));
    }

    #[test]
    fn disabled_flag_suppresses_auto_add() {
        let mut symbols = SymbolTable::new();
        let src = r#"div { style { #box { color: "red"; } } }"#;
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        let mut config = Configuration::default();
        config.disable_style_auto_add_id = true;
        automate(&mut ast, &config);
        let el = (0..ast.len() as u32).find(|&id| matches!(ast.kind(id), NodeKind::Element { .. })).unwrap();
        let NodeKind::Element { attrs, .. } = ast.kind(el) else { unreachable!() };
        assert!(attrs.iter().all(|a| a.name != "id"));
    }
}
