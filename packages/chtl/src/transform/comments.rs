//! Step 7: `--` comment lowering. A `CommentKind::Dash` node's true
//! surface syntax depends on where it lives: inside a style block it
//! becomes a CSS block comment, inside a script block a line comment,
//! anywhere else an HTML-visible generator comment.

use crate::ast::{Ast, CommentKind, NodeKind};

pub fn lower(ast: &mut Ast) {
    let mut i = 0u32;
    while (i as usize) < ast.len() {
        if let NodeKind::Comment { kind: CommentKind::Dash, .. } = ast.kind(i) {
            let lowered = lowered_kind(ast, i);
            if let NodeKind::Comment { kind, .. } = &mut ast.get_mut(i).kind {
                *kind = lowered;
            }
        }
        i += 1;
    }
}

fn lowered_kind(ast: &Ast, id: u32) -> CommentKind {
    let mut cur = ast.parent_of(id);
    while let Some(p) = cur {
        match ast.kind(p) {
            NodeKind::StyleBlock { .. } | NodeKind::StyleRule { .. } => return CommentKind::MultiLine,
            NodeKind::ScriptBlock { .. } => return CommentKind::SingleLine,
            NodeKind::Element { .. } => break,
            _ => {}
        }
        cur = ast.parent_of(p);
    }
    CommentKind::Generator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};
    use crate::symbol::SymbolTable;

    #[test]
    fn dash_comment_in_style_block_becomes_css_comment() {
        let mut symbols = SymbolTable::new();
        let src = "div { style {\n-- a note\ncolor: \"red\";\n} }";
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        lower(&mut ast);
        let found = (0..ast.len() as u32)
            .find_map(|id| match ast.kind(id) {
                NodeKind::Comment { kind, .. } => Some(*kind),
                _ => None,
            })
            .unwrap();
        assert_eq!(found, CommentKind::MultiLine);
    }

    #[test]
    fn dash_comment_at_top_level_becomes_generator_comment() {
        let mut symbols = SymbolTable::new();
        let src = "-- a note\ndiv {}";
        let (mut ast, _) = Parser::parse(src, 0, ParserMode::Recovering, None, &mut symbols);
        lower(&mut ast);
        let found = (0..ast.len() as u32)
            .find_map(|id| match ast.kind(id) {
                NodeKind::Comment { kind, .. } => Some(*kind),
                _ => None,
            })
            .unwrap();
        assert_eq!(found, CommentKind::Generator);
    }
}
