//! Parses an `info/<Name>.chtl` file's `[Info]` block into a [`ModuleInfo`].
//! This is a narrow, purpose-built reader rather than a full CHTL parse:
//! the info file is a flat `key: "value";` list inside one block.

use super::ArchiveError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: String,
    pub extra: BTreeMap<String, String>,
}

const REQUIRED_KEYS: &[&str] = &["name", "version", "description", "author", "license"];

pub fn parse_info_block(text: &str) -> Result<ModuleInfo, ArchiveError> {
    let open = text.find('{').ok_or(ArchiveError::Malformed("no '[Info] {' block found"))?;
    let close = text.rfind('}').ok_or(ArchiveError::Malformed("unterminated [Info] block"))?;
    if close <= open {
        return Err(ArchiveError::Malformed("unterminated [Info] block"));
    }
    let body = &text[open + 1..close];

    let mut fields = BTreeMap::new();
    for stmt in body.split(';') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        let Some((key, value)) = stmt.split_once(':') else { continue };
        let key = key.trim().to_string();
        let value = value.trim().trim_matches('"').to_string();
        fields.insert(key, value);
    }

    for key in REQUIRED_KEYS {
        if !fields.contains_key(*key) {
            return Err(ArchiveError::MissingInfoKey((*key).to_string()));
        }
    }

    let mut extra = fields.clone();
    let name = extra.remove("name").unwrap();
    let version = extra.remove("version").unwrap();
    let description = extra.remove("description").unwrap();
    let author = extra.remove("author").unwrap();
    let license = extra.remove("license").unwrap();

    Ok(ModuleInfo { name, version, description, author, license, extra })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_extra_keys() {
        let text = r#"[Info] {
            name: "Chtholly";
            version: "1.0.0";
            description: "a theme";
            author: "someone";
            license: "MIT";
            homepage: "https://example.com";
        }"#;
        let info = parse_info_block(text).unwrap();
        assert_eq!(info.name, "Chtholly");
        assert_eq!(info.extra.get("homepage").map(String::as_str), Some("https://example.com"));
    }

    #[test]
    fn missing_key_is_rejected() {
        let text = r#"[Info] { name: "X"; version: "1.0.0"; }"#;
        assert!(matches!(parse_info_block(text), Err(ArchiveError::MissingInfoKey(_))));
    }
}
