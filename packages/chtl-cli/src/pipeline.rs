//! Drives a whole compile: resolves `[Import]` statements so the shared
//! Symbol Map already carries an imported file's declarations before the
//! importing file's own transform passes run, then compiles the entry
//! file itself.
//!
//! This mirrors the core crate's "construct at pipeline start, pass by
//! non-owning handle to every phase" policy for global state: one
//! [`SymbolTable`] and one [`ImportGraph`] live for the whole session and
//! are threaded through every file compiled within it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chtl::ast::{Ast, ImportKind, NodeKind};
use chtl::config::Configuration;
use chtl::diagnostics::{DiagnosticBag, Phase};
use chtl::import::{self, ImportGraph, ImportOutcome, PathClass};
use chtl::parser::{Parser, ParserMode};
use chtl::source::SourcePos;
use chtl::symbol::SymbolTable;
use chtl::transform;

/// One file's parsed, import-resolved, transformed result, plus the path
/// it came from (diagnostics are rendered relative to this).
pub struct CompiledFile {
    pub path: PathBuf,
    pub ast: Ast,
    pub diagnostics: DiagnosticBag,
    pub configuration: Configuration,
}

impl CompiledFile {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// A whole compile run: one Symbol Map and one import graph shared across
/// every file visited, matching the core crate's "no singletons, explicit
/// lifecycle" design note.
pub struct Session {
    symbols: SymbolTable,
    graph: ImportGraph,
    file_ids: HashMap<PathBuf, u32>,
    next_file_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Session {
            symbols: SymbolTable::new(),
            graph: ImportGraph::new(),
            file_ids: HashMap::new(),
            next_file_id: 1,
        }
    }

    fn file_id_for(&mut self, path: &Path) -> u32 {
        let canon = canonical(path);
        if let Some(id) = self.file_ids.get(&canon) {
            return *id;
        }
        let id = self.next_file_id;
        self.next_file_id += 1;
        self.file_ids.insert(canon, id);
        id
    }

    /// Compiles `entry`, recursively resolving and compiling every import
    /// it transitively depends on first.
    pub fn compile_entry(&mut self, entry: &Path, max_errors: Option<usize>) -> std::io::Result<CompiledFile> {
        self.compile_path(entry, max_errors)
    }

    fn compile_path(&mut self, path: &Path, max_errors: Option<usize>) -> std::io::Result<CompiledFile> {
        let canon = canonical(path);
        let source = fs::read_to_string(path)?;
        let file_id = self.file_id_for(path);

        let (mut ast, mut diags) = Parser::parse(&source, file_id, ParserMode::Recovering, max_errors, &mut self.symbols);
        let mut configuration = Configuration::default();
        configuration.apply_ast(&ast);

        if !diags.halted() {
            self.resolve_imports(path, &canon, &ast, &configuration, max_errors, &mut diags);
        }
        if !diags.halted() {
            transform::run(&mut ast, &mut self.symbols, &configuration, &mut diags);
        }

        Ok(CompiledFile { path: path.to_path_buf(), ast, diagnostics: diags, configuration })
    }

    /// Walks every `Import` node in `ast`, resolves its target file(s)
    /// against the search roots its kind dictates, and compiles each one
    /// (for its side effect of registering symbols) before returning. CMOD
    /// directory imports register the module's declared namespace instead
    /// of recursing into source, since their `src/` tree is packed data,
    /// not a file this session parses directly.
    fn resolve_imports(
        &mut self,
        importer_path: &Path,
        importer_canon: &Path,
        ast: &Ast,
        config: &Configuration,
        max_errors: Option<usize>,
        diags: &mut DiagnosticBag,
    ) {
        let current_dir = importer_path.parent().unwrap_or_else(|| Path::new("."));
        let official_path = config.official_module_path();

        for node_id in 0..ast.len() as u32 {
            let NodeKind::Import { kind, from_path, .. } = ast.kind(node_id) else { continue };
            let pos = ast.get(node_id).span.start;
            self.resolve_one_import(*kind, from_path, current_dir, &official_path, importer_canon, pos, max_errors, diags);
        }
    }

    fn resolve_one_import(
        &mut self,
        kind: ImportKind,
        from_path: &str,
        current_dir: &Path,
        official_path: &Path,
        importer_canon: &Path,
        pos: SourcePos,
        max_errors: Option<usize>,
        diags: &mut DiagnosticBag,
    ) {
        let class = import::classify_path(from_path);
        let roots = import::search_roots(kind, current_dir, official_path);

        match class {
            PathClass::DirectoryPath(dir) => {
                let resolved = current_dir.join(&dir);
                if !resolved.is_dir() {
                    diags.error(pos, format!("import path '{dir}' is not a directory"), Phase::ImportResolution);
                }
            }
            PathClass::WildcardAll(dir) => {
                let resolved_dir = current_dir.join(&dir);
                match import::expand_wildcard(&resolved_dir, None) {
                    Ok(files) => {
                        for file in files {
                            self.import_one_file(&file, importer_canon, pos, max_errors, diags);
                        }
                    }
                    Err(err) => diags.error(pos, format!("cannot read '{}': {err}", resolved_dir.display()), Phase::ImportResolution),
                }
            }
            PathClass::WildcardTyped(dir, ext) => {
                let resolved_dir = current_dir.join(&dir);
                match import::expand_wildcard(&resolved_dir, Some(ext.as_str())) {
                    Ok(files) => {
                        for file in files {
                            self.import_one_file(&file, importer_canon, pos, max_errors, diags);
                        }
                    }
                    Err(err) => diags.error(pos, format!("cannot read '{}': {err}", resolved_dir.display()), Phase::ImportResolution),
                }
            }
            PathClass::SubmoduleAll(_) | PathClass::SubmoduleSpecific(_, _) => {
                // Submodules live inside an already-unpacked CMOD tree; resolved
                // relative to the official module path only.
                diags.info(pos, format!("submodule import '{from_path}' deferred to module resolution"), Phase::ImportResolution);
            }
            PathClass::NameOnly(name) => {
                if let Some(file) = import::resolve_file(kind, &name, &roots) {
                    self.import_one_file(&file, importer_canon, pos, max_errors, diags);
                } else {
                    diags.error(pos, format!("cannot resolve import '{from_path}'"), Phase::ImportResolution);
                }
            }
            PathClass::SpecificFile(path) | PathClass::SpecificPath(path) => {
                if let Some(file) = import::resolve_file(kind, &path, &roots) {
                    self.import_one_file(&file, importer_canon, pos, max_errors, diags);
                } else {
                    diags.error(pos, format!("cannot resolve import '{from_path}'"), Phase::ImportResolution);
                }
            }
        }
    }

    fn import_one_file(&mut self, file: &Path, importer_canon: &Path, pos: SourcePos, max_errors: Option<usize>, diags: &mut DiagnosticBag) {
        let target_canon = canonical(file);
        let from_key = importer_canon.to_string_lossy().to_string();
        let to_key = target_canon.to_string_lossy().to_string();

        match self.graph.try_add_edge(&from_key, &to_key) {
            ImportOutcome::Duplicate => return,
            ImportOutcome::Cycle => {
                diags.error(pos, format!("import of '{}' would create a cycle", file.display()), Phase::ImportResolution);
                return;
            }
            ImportOutcome::Fresh => {}
        }

        if file.extension().and_then(|e| e.to_str()) != Some("chtl") {
            // .cmod/.html/.css/.js imports carry no further CHTL declarations
            // to register; resolving the path is the whole job.
            return;
        }

        match self.compile_path(file, max_errors) {
            Ok(imported) => {
                for d in imported.diagnostics.messages() {
                    diags.push(d.severity, d.position, d.message.clone(), Phase::ImportResolution);
                }
            }
            Err(err) => {
                diags.error(pos, format!("cannot read '{}': {err}", file.display()), Phase::ImportResolution);
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
