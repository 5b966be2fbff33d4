use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::constants::{
    JS_EXTENSIONS_FIRST, JS_INDEXES_FIRST, TS_EXTENSIONS_FIRST, TS_INDEXES_FIRST,
};
use crate::remap::RemapTable;

/// Which family of extensions is probed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionOrder {
    #[default]
    TypedFirst,
    ScriptFirst,
}

impl ExtensionOrder {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ExtensionOrder::TypedFirst => TS_EXTENSIONS_FIRST,
            ExtensionOrder::ScriptFirst => JS_EXTENSIONS_FIRST,
        }
    }

    pub fn indexes(self) -> &'static [&'static str] {
        match self {
            ExtensionOrder::TypedFirst => TS_INDEXES_FIRST,
            ExtensionOrder::ScriptFirst => JS_INDEXES_FIRST,
        }
    }
}

/// One specifier to turn into a file.
///
/// The base directory is `file_dir`, or the parent of `file_path` when only the
/// importing file is known.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub specifier: &'a str,
    pub file_dir: Option<&'a Path>,
    pub file_path: Option<&'a Path>,
    pub order: ExtensionOrder,
    pub remap: Option<&'a RemapTable>,
    /// Lets package manifests enter through their `browser` field
    pub browser: bool,
}

impl<'a> ResolutionRequest<'a> {
    pub fn from_dir(specifier: &'a str, dir: &'a Path) -> Self {
        Self {
            specifier,
            file_dir: Some(dir),
            file_path: None,
            order: ExtensionOrder::default(),
            remap: None,
            browser: false,
        }
    }

    pub fn from_file(specifier: &'a str, file: &'a Path) -> Self {
        Self {
            specifier,
            file_dir: None,
            file_path: Some(file),
            order: ExtensionOrder::default(),
            remap: None,
            browser: false,
        }
    }

    pub fn with_order(mut self, order: ExtensionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_remap(mut self, remap: &'a RemapTable) -> Self {
        self.remap = Some(remap);
        self
    }

    pub fn with_browser(mut self, browser: bool) -> Self {
        self.browser = browser;
        self
    }

    pub fn base_dir(&self) -> Option<&'a Path> {
        match (self.file_path, self.file_dir) {
            (Some(file), _) => Some(file.parent().unwrap_or(file)),
            (None, Some(dir)) => Some(dir),
            (None, None) => None,
        }
    }
}

/// A tsconfig found next to a first-party package during directory resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfigRef {
    pub directory: PathBuf,
    pub compiler_options: Map<String, Value>,
    pub config_file_path: PathBuf,
}

/// Outcome of a lookup. `exists == false` is a normal, non-error answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub absolute_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub exists: bool,
    pub is_directory_index: bool,
    /// Needs rewriting downstream (package entries, json fallbacks)
    pub is_custom_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monorepo_modules_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_config_at_path: Option<ProjectConfigRef>,
}

impl ResolutionResult {
    pub(crate) fn found(path: PathBuf) -> Self {
        let extension = extension_of(&path);
        Self { absolute_path: path, extension, exists: true, ..Default::default() }
    }

    pub(crate) fn not_found(path: PathBuf) -> Self {
        Self { absolute_path: path, ..Default::default() }
    }
}

/// Extension with its leading dot, e.g. `.ts`.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| format!(".{}", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImportKind {
    #[serde(rename = "ES6")]
    Es6,
    #[serde(rename = "REQUIRE")]
    Require,
    #[serde(rename = "DYNAMIC")]
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportRecord {
    pub kind: ImportKind,
    /// The literal module string, exactly as written
    pub statement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkerKind {
    Worker,
    SharedWorker,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerRecord {
    pub path: String,
    pub kind: WorkerKind,
}

/// A runtime global used freely by a module, and the module that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserEssential {
    pub module_name: String,
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_as: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxFlags {
    pub es6_syntax: bool,
    pub dynamic_imports: bool,
    #[serde(rename = "containsJSX")]
    pub contains_jsx: bool,
    pub references_file_name: bool,
    pub references_dir_name: bool,
    /// `None` when no watched global is free anywhere in the module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_essentials: Option<Vec<BrowserEssential>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub imports: Vec<ImportRecord>,
    pub workers: Vec<WorkerRecord>,
    pub flags: SyntaxFlags,
}

impl DependencyReport {
    /// Every specifier the module depends on, imports first, then workers.
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .map(|i| i.statement.as_str())
            .chain(self.workers.iter().map(|w| w.path.as_str()))
    }
}
