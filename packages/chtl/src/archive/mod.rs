//! Module archive: packs and unpacks CMOD/CJMOD directory trees into a
//! ZIP-family container, store-mode only (method 0, no compression) with a
//! CRC-32 per entry, written and read by hand against the local-file-header
//! / central-directory / end-of-central-directory layout.

mod info;
mod zip;

pub use info::ModuleInfo;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("module directory missing required 'src/' subdirectory")]
    MissingSrcDir,
    #[error("module directory missing 'info/{0}.chtl'")]
    MissingInfoFile(String),
    #[error("[Info] block missing required key '{0}'")]
    MissingInfoKey(String),
    #[error("not a valid archive: {0}")]
    Malformed(&'static str),
    #[error("CRC-32 mismatch for entry '{0}'")]
    CrcMismatch(String),
}

/// Validates the module directory shape from spec §4.I: a `src/`
/// subdirectory plus `info/<Name>.chtl` carrying a complete `[Info]`
/// block. `module_name` is the directory's own name, used to locate the
/// info file.
pub fn validate_module_dir(dir: &Path, module_name: &str) -> Result<ModuleInfo, ArchiveError> {
    if !dir.join("src").is_dir() {
        return Err(ArchiveError::MissingSrcDir);
    }
    let info_path = dir.join("info").join(format!("{module_name}.chtl"));
    if !info_path.is_file() {
        return Err(ArchiveError::MissingInfoFile(module_name.to_string()));
    }
    let text = fs::read_to_string(&info_path)?;
    info::parse_info_block(&text)
}

/// Packs `src_dir` (a validated module directory) into a store-mode ZIP
/// container at `out_path`.
pub fn pack(src_dir: &Path, out_path: &Path, module_name: &str) -> Result<(), ArchiveError> {
    validate_module_dir(src_dir, module_name)?;
    let mut entries = Vec::new();
    collect_files(src_dir, src_dir, &mut entries)?;
    let mut buf = Vec::new();
    zip::write_store_archive(&mut buf, &entries)?;
    fs::write(out_path, buf)?;
    Ok(())
}

/// Unpacks `archive_path` into `out_dir`, rehydrating every entry and
/// verifying its CRC-32.
pub fn unpack(archive_path: &Path, out_dir: &Path) -> Result<(), ArchiveError> {
    let bytes = fs::read(archive_path)?;
    let entries = zip::read_store_archive(&bytes)?;
    for entry in entries {
        let dest = out_dir.join(&entry.name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let computed = crc32fast::hash(&entry.data);
        if computed != entry.crc32 {
            return Err(ArchiveError::CrcMismatch(entry.name));
        }
        fs::write(dest, entry.data)?;
    }
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) -> Result<(), ArchiveError> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    children.sort();
    for path in children {
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");
            out.push((rel, fs::read(&path)?));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_module(dir: &Path, name: &str) {
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::create_dir_all(dir.join("info")).unwrap();
        fs::write(dir.join("src").join("main.chtl"), b"div {}").unwrap();
        let mut info = fs::File::create(dir.join("info").join(format!("{name}.chtl"))).unwrap();
        writeln!(
            info,
            "[Info] {{ name: \"{name}\"; version: \"1.0.0\"; description: \"test\"; author: \"me\"; license: \"MIT\"; }}"
        )
        .unwrap();
    }

    #[test]
    fn pack_then_unpack_round_trips_bytes_and_crc() {
        let tmp = std::env::temp_dir().join(format!("chtl-archive-test-{}", std::process::id()));
        let src = tmp.join("Widget");
        write_module(&src, "Widget");
        let archive_path = tmp.join("Widget.cmod");
        pack(&src, &archive_path, "Widget").unwrap();

        let out = tmp.join("out");
        unpack(&archive_path, &out).unwrap();
        let restored = fs::read(out.join("src").join("main.chtl")).unwrap();
        assert_eq!(restored, b"div {}");

        fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn missing_src_dir_is_rejected() {
        let tmp = std::env::temp_dir().join(format!("chtl-archive-missing-{}", std::process::id()));
        fs::create_dir_all(tmp.join("info")).unwrap();
        fs::write(tmp.join("info").join("X.chtl"), b"[Info] { name: \"X\"; }").unwrap();
        let result = validate_module_dir(&tmp, "X");
        assert!(matches!(result, Err(ArchiveError::MissingSrcDir)));
        fs::remove_dir_all(&tmp).ok();
    }
}
