//! Black-box coverage of the CMOD/CJMOD module archive format: packing and
//! unpacking round-trips bytes and directory structure, and every
//! validation failure the format's error taxonomy names is actually
//! refused.

use chtl::archive::{self, ArchiveError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn tmp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chtl-archive-integration-{tag}-{}", std::process::id()))
}

fn write_module(dir: &Path, name: &str) {
    fs::create_dir_all(dir.join("src").join("nested")).unwrap();
    fs::create_dir_all(dir.join("info")).unwrap();
    fs::write(dir.join("src").join("main.chtl"), b"div { id: main; }").unwrap();
    fs::write(dir.join("src").join("nested").join("widget.chtl"), b"div { class: widget; }").unwrap();
    let mut info = fs::File::create(dir.join("info").join(format!("{name}.chtl"))).unwrap();
    writeln!(
        info,
        "[Info] {{ name: \"{name}\"; version: \"1.0.0\"; description: \"test module\"; author: \"me\"; license: \"MIT\"; }}"
    )
    .unwrap();
}

#[test]
fn pack_then_unpack_preserves_directory_structure_and_bytes() {
    let tmp = tmp_dir("roundtrip");
    let src = tmp.join("Widget");
    write_module(&src, "Widget");

    let archive_path = tmp.join("Widget.cmod");
    archive::pack(&src, &archive_path, "Widget").unwrap();

    let out = tmp.join("out");
    archive::unpack(&archive_path, &out).unwrap();

    assert_eq!(fs::read(out.join("src").join("main.chtl")).unwrap(), b"div { id: main; }");
    assert_eq!(fs::read(out.join("src").join("nested").join("widget.chtl")).unwrap(), b"div { class: widget; }");
    assert!(out.join("info").join("Widget.chtl").is_file());

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn info_block_resolves_both_required_and_extra_fields() {
    let tmp = tmp_dir("info");
    let src = tmp.join("Widget");
    write_module(&src, "Widget");

    let info = archive::validate_module_dir(&src, "Widget").unwrap();
    assert_eq!(info.name, "Widget");
    assert_eq!(info.version, "1.0.0");
    assert_eq!(info.license, "MIT");

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn pack_rejects_a_module_missing_src() {
    let tmp = tmp_dir("no-src");
    fs::create_dir_all(tmp.join("info")).unwrap();
    fs::write(tmp.join("info").join("Widget.chtl"), b"[Info] { name: \"Widget\"; version: \"1.0.0\"; description: \"x\"; author: \"x\"; license: \"MIT\"; }").unwrap();

    let result = archive::pack(&tmp, &tmp.join("out.cmod"), "Widget");
    assert!(matches!(result, Err(ArchiveError::MissingSrcDir)));

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn pack_rejects_a_module_missing_info_file() {
    let tmp = tmp_dir("no-info");
    fs::create_dir_all(tmp.join("src")).unwrap();

    let result = archive::pack(&tmp, &tmp.join("out.cmod"), "Widget");
    assert!(matches!(result, Err(ArchiveError::MissingInfoFile(name)) if name == "Widget"));

    fs::remove_dir_all(&tmp).ok();
}

#[test]
fn unpack_detects_a_corrupted_entry_via_crc_mismatch() {
    let tmp = tmp_dir("crc");
    let src = tmp.join("Widget");
    write_module(&src, "Widget");
    let archive_path = tmp.join("Widget.cmod");
    archive::pack(&src, &archive_path, "Widget").unwrap();

    let mut bytes = fs::read(&archive_path).unwrap();
    // Flip a byte inside the first entry's data (past the fixed-size local
    // file header and its file name) to corrupt its content without
    // touching the archive's structural framing.
    let corrupt_at = bytes.len() / 2;
    bytes[corrupt_at] ^= 0xFF;
    fs::write(&archive_path, &bytes).unwrap();

    let result = archive::unpack(&archive_path, &tmp.join("out"));
    assert!(result.is_err());

    fs::remove_dir_all(&tmp).ok();
}
