//! Black-box coverage of the fixed 7-step semantic transform pipeline,
//! exercising the end-to-end scenarios from the testable-properties list.

use chtl::ast::NodeKind;
use chtl::config::Configuration;
use chtl::parser::{Parser, ParserMode};
use chtl::symbol::SymbolTable;
use chtl::transform;

fn compile(src: &str) -> (chtl::ast::Ast, chtl::diagnostics::DiagnosticBag, Configuration) {
    let mut symbols = SymbolTable::new();
    let (mut ast, mut diags) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
    let mut config = Configuration::default();
    config.apply_ast(&ast);
    transform::run(&mut ast, &symbols, &config, &mut diags);
    (ast, diags, config)
}

fn style_properties<'a>(ast: &'a chtl::ast::Ast, style_block: chtl::ast::NodeId) -> Vec<(&'a str, &'a str)> {
    let NodeKind::StyleBlock { children, .. } = ast.kind(style_block) else { panic!("not a StyleBlock") };
    children
        .iter()
        .filter_map(|&rule_id| match ast.kind(rule_id) {
            NodeKind::StyleProperty { name, values, .. } => {
                let NodeKind::StyleValue { value, .. } = ast.kind(values[0]) else { return None };
                Some((name.as_str(), value.as_str()))
            }
            _ => None,
        })
        .collect()
}

fn find_element<'a>(ast: &'a chtl::ast::Ast, id: chtl::ast::NodeId) -> Option<chtl::ast::NodeId> {
    match ast.kind(id) {
        NodeKind::Element { .. } => Some(id),
        NodeKind::Program { children } | NodeKind::StyleBlock { children, .. } => {
            children.iter().find_map(|&c| find_element(ast, c))
        }
        _ => None,
    }
}

#[test]
fn template_style_with_inheritance_last_write_wins() {
    let src = r#"
        [Template] @Style Base { color: "red"; font-size: "14px" }
        [Template] @Style Big inherit @Style Base { font-size: "24px" }
        div { style { Big() } }
    "#;
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let div = find_element(&ast, ast.root).expect("div element");
    let NodeKind::Element { children, .. } = ast.kind(div) else { unreachable!() };
    let style_block = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::StyleBlock { .. })).unwrap();
    let props = style_properties(&ast, style_block);
    assert_eq!(props.iter().find(|(n, _)| *n == "color"), Some(&("color", "red")));
    assert_eq!(props.iter().find(|(n, _)| *n == "font-size"), Some(&("font-size", "24px")));
}

#[test]
fn selector_auto_add_inserts_class_and_id() {
    let src = r#"section { style { .card { padding: "20px" } #main { color: "blue" } } }"#;
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let section = find_element(&ast, ast.root).expect("section element");
    let NodeKind::Element { attrs, .. } = ast.kind(section) else { unreachable!() };
    assert_eq!(attrs.iter().find(|a| a.name == "class").map(|a| a.value.as_str()), Some("card"));
    assert_eq!(attrs.iter().find(|a| a.name == "id").map(|a| a.value.as_str()), Some("main"));
}

#[test]
fn ampersand_reference_prefers_class_in_style_and_id_in_script() {
    let src = r#"
        div {
            class: w;
            id: s;
            style { & { border: "1px" } }
            script { &.hide() }
        }
    "#;
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let div = find_element(&ast, ast.root).expect("div element");
    let NodeKind::Element { children, .. } = ast.kind(div) else { unreachable!() };

    let style_block = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::StyleBlock { .. })).unwrap();
    let NodeKind::StyleBlock { children: rules, .. } = ast.kind(style_block) else { unreachable!() };
    let rule = rules[0];
    let NodeKind::StyleRule { selector, .. } = ast.kind(rule) else { panic!("expected StyleRule") };
    let NodeKind::StyleSelector { kind, value, .. } = ast.kind(*selector) else { panic!("expected StyleSelector") };
    assert_eq!(format!("{kind:?}"), "Class");
    assert_eq!(value, "w");

    let script_block = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::ScriptBlock { .. })).unwrap();
    let NodeKind::ScriptBlock { content, .. } = ast.kind(script_block) else { unreachable!() };
    assert!(content.contains("{{#s}}"), "script was: {content}");
}

#[test]
fn dash_comment_lowers_by_surrounding_context() {
    let src = "-- top level note\ndiv { style {\n-- a css note\ncolor: \"red\";\n} }";
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let NodeKind::Program { children } = ast.kind(ast.root) else { unreachable!() };
    let top_comment = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::Comment { .. })).unwrap();
    let NodeKind::Comment { kind, .. } = ast.kind(top_comment) else { unreachable!() };
    assert_eq!(format!("{kind:?}"), "Generator");
}

#[test]
fn specialization_deletes_an_inherited_property() {
    let src = r#"
        [Custom] @Style Base { color: "red"; font-size: "14px" }
        div { style { Base() { delete color; } } }
    "#;
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let div = find_element(&ast, ast.root).expect("div element");
    let NodeKind::Element { children, .. } = ast.kind(div) else { unreachable!() };
    let style_block = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::StyleBlock { .. })).unwrap();
    let props = style_properties(&ast, style_block);
    assert!(props.iter().all(|(n, _)| *n != "color"));
    assert!(props.iter().any(|(n, _)| *n == "font-size"));
}

#[test]
fn specialization_override_replaces_only_the_first_style_value() {
    let src = r#"
        [Custom] @Style Base { background: linear-gradient(red, blue) translate(1, 2); }
        div { style { Base() { background: "none"; } } }
    "#;
    let (ast, diags, _) = compile(src);
    assert!(!diags.has_errors(), "{:?}", diags.messages());

    let div = find_element(&ast, ast.root).expect("div element");
    let NodeKind::Element { children, .. } = ast.kind(div) else { unreachable!() };
    let style_block = children.iter().copied().find(|&c| matches!(ast.kind(c), NodeKind::StyleBlock { .. })).unwrap();
    let NodeKind::StyleBlock { children: rules, .. } = ast.kind(style_block) else { unreachable!() };
    let background = rules
        .iter()
        .copied()
        .find_map(|id| match ast.kind(id) {
            NodeKind::StyleProperty { name, values, .. } if name == "background" => Some(values.clone()),
            _ => None,
        })
        .expect("background property");

    assert_eq!(background.len(), 2, "the trailing space-separated value must survive the override");
    let NodeKind::StyleValue { value: first, .. } = ast.kind(background[0]) else { unreachable!() };
    assert_eq!(first, "none");
    let NodeKind::StyleValue { kind: second_kind, value: second, .. } = ast.kind(background[1]) else { unreachable!() };
    assert_eq!(*second_kind, chtl::ast::StyleValueKind::Function);
    assert_eq!(second, "translate");
}
