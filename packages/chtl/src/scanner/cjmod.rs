//! The CJMOD keyword registry. Third-party native extensions register
//! keywords and virtual-object key sets at host initialization; during a
//! compilation run the registry is read-only, consulted only by the
//! scanner's `front` pointer and by the virtual-object checker.

use std::collections::{HashMap, HashSet};

/// A registered keyword's backtrack/forward-collect behavior, requested by
/// the handler so the scanner knows how much surrounding buffer to hand it.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSpec {
    pub needs_backtrack: bool,
    pub backtrack_distance: usize,
    pub needs_forward_collect: bool,
    pub forward_collect_distance: usize,
}

/// A handler transforms the surrounding buffer (and the match position) into
/// replacement JS text, which the scanner re-emits as a `CHTL_JS` fragment.
pub type KeywordHandler = Box<dyn Fn(&str, usize) -> String + Send + Sync>;

#[derive(Default)]
pub struct CjmodRegistry {
    handlers: HashMap<String, (KeywordHandler, KeywordSpec)>,
    /// Per virtual-object function name, the set of keys that syntax is
    /// permitted to access (`vir name = func({ key: value })`).
    virtual_object_keys: HashMap<String, HashSet<String>>,
}

impl CjmodRegistry {
    pub fn new() -> Self {
        CjmodRegistry::default()
    }

    pub fn register(&mut self, keyword: impl Into<String>, spec: KeywordSpec, handler: KeywordHandler) {
        self.handlers.insert(keyword.into(), (handler, spec));
    }

    pub fn is_registered(&self, keyword: &str) -> bool {
        self.handlers.contains_key(keyword)
    }

    pub fn get_handler(&self, keyword: &str) -> Option<(&KeywordHandler, KeywordSpec)> {
        self.handlers.get(keyword).map(|(h, s)| (h, *s))
    }

    pub fn registered_keywords(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn register_virtual_object_keys(&mut self, function_name: impl Into<String>, keys: impl IntoIterator<Item = String>) {
        self.virtual_object_keys.entry(function_name.into()).or_default().extend(keys);
    }

    /// Refuses source that uses a virtual-object key path not declared by
    /// `function_name`'s registration.
    pub fn check_virtual_object_key(&self, function_name: &str, key: &str) -> bool {
        self.virtual_object_keys
            .get(function_name)
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_keyword_is_reported_as_such() {
        let reg = CjmodRegistry::new();
        assert!(!reg.is_registered("listen"));
    }

    #[test]
    fn registered_handler_runs() {
        let mut reg = CjmodRegistry::new();
        reg.register(
            "listen",
            KeywordSpec { needs_backtrack: false, backtrack_distance: 0, needs_forward_collect: true, forward_collect_distance: 64 },
            Box::new(|buf, pos| format!("/*handled@{}*/{}", pos, &buf[pos..])),
        );
        assert!(reg.is_registered("listen"));
        let (handler, spec) = reg.get_handler("listen").unwrap();
        assert!(spec.needs_forward_collect);
        assert_eq!(handler("abcdef", 2), "/*handled@2*/cdef");
    }

    #[test]
    fn virtual_object_key_checker_refuses_unknown_keys() {
        let mut reg = CjmodRegistry::new();
        reg.register_virtual_object_keys("myFunc", ["value".to_string(), "onClick".to_string()]);
        assert!(reg.check_virtual_object_key("myFunc", "value"));
        assert!(!reg.check_virtual_object_key("myFunc", "unknownKey"));
    }
}
