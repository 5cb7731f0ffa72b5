//! Compile-time configuration: the flags a `[Configuration]` block (or a
//! host-supplied default) may set, consulted by the transform passes.

use crate::ast::{Ast, NodeKind};
use std::path::PathBuf;

/// Resolved configuration for a single compile. Starts from defaults, then
/// has every parsed `[Configuration]` block's entries folded in, last one
/// wins per key (matching the Symbol Map's own `KEEP_EXISTING` default does
/// *not* apply here — configuration is plain key assignment, not a
/// namespaced declaration).
#[derive(Debug, Clone)]
pub struct Configuration {
    pub disable_style_auto_add_class: bool,
    pub disable_style_auto_add_id: bool,
    /// Inverted per the transform spec: `true` *enables* the script-side
    /// class rescue path rather than disabling it.
    pub disable_script_auto_add_class: bool,
    pub disable_script_auto_add_id: bool,
    pub disable_default_namespace: bool,
    pub official_module_path: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            disable_style_auto_add_class: false,
            disable_style_auto_add_id: false,
            disable_script_auto_add_class: false,
            disable_script_auto_add_id: false,
            disable_default_namespace: false,
            official_module_path: None,
        }
    }
}

impl Configuration {
    /// True when an enhanced selector in a script block is allowed to
    /// trigger a rescue auto-add of `class`, per the inverted flag name.
    pub fn script_class_rescue_enabled(&self) -> bool {
        self.disable_script_auto_add_class
    }

    pub fn script_id_rescue_enabled(&self) -> bool {
        self.disable_script_auto_add_id
    }

    fn apply_entry(&mut self, key: &str, value: &str) {
        let truthy = matches!(value.trim(), "true" | "1" | "yes" | "on");
        match key {
            "DISABLE_STYLE_AUTO_ADD_CLASS" => self.disable_style_auto_add_class = truthy,
            "DISABLE_STYLE_AUTO_ADD_ID" => self.disable_style_auto_add_id = truthy,
            "DISABLE_SCRIPT_AUTO_ADD_CLASS" => self.disable_script_auto_add_class = truthy,
            "DISABLE_SCRIPT_AUTO_ADD_ID" => self.disable_script_auto_add_id = truthy,
            "DISABLE_DEFAULT_NAMESPACE" => self.disable_default_namespace = truthy,
            "OFFICIAL_MODULE_PATH" => self.official_module_path = Some(PathBuf::from(value.trim_matches('"'))),
            _ => {}
        }
    }

    /// Fold every `[Configuration]` block found anywhere in the AST into
    /// this configuration, in document order.
    pub fn apply_ast(&mut self, ast: &Ast) {
        for node_id in 0..ast.len() as u32 {
            if let NodeKind::Configuration { entries, .. } = ast.kind(node_id) {
                for (key, value) in entries {
                    self.apply_entry(key, value);
                }
            }
        }
    }

    pub fn official_module_path(&self) -> PathBuf {
        self.official_module_path.clone().unwrap_or_else(|| PathBuf::from("module"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserMode};
    use crate::symbol::SymbolTable;

    #[test]
    fn named_configuration_block_sets_flags() {
        let mut symbols = SymbolTable::new();
        let (ast, _) = Parser::parse(
            "[Configuration] MyConfig { DISABLE_STYLE_AUTO_ADD_CLASS: true; OFFICIAL_MODULE_PATH: \"vendor\" }",
            0,
            ParserMode::Recovering,
            None,
            &mut symbols,
        );
        let mut config = Configuration::default();
        config.apply_ast(&ast);
        assert!(config.disable_style_auto_add_class);
        assert_eq!(config.official_module_path(), PathBuf::from("vendor"));
    }

    #[test]
    fn script_rescue_flags_read_as_inverted_enable(){
        let mut config = Configuration::default();
        assert!(!config.script_class_rescue_enabled());
        config.disable_script_auto_add_class = true;
        assert!(config.script_class_rescue_enabled());
    }
}
