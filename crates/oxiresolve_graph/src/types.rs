use oxiresolve_core::{BrowserEssential, ImportKind, SyntaxFlags, WorkerKind};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    Import(ImportKind),
    Worker(WorkerKind),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEdge {
    pub specifier: String,
    pub kind: EdgeKind,
    /// `None` for runtime builtins and unresolved specifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub path: PathBuf,
    pub edges: Vec<ModuleEdge>,
    pub flags: SyntaxFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unresolved {
    pub from: PathBuf,
    pub specifier: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCounts {
    pub es6: usize,
    pub require: usize,
    pub dynamic: usize,
    pub worker: usize,
}

/// Every module reachable from the entries, keyed by absolute path.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleGraph {
    pub root: PathBuf,
    pub entries: Vec<PathBuf>,
    pub modules: BTreeMap<PathBuf, ModuleNode>,
    pub unresolved: Vec<Unresolved>,
    pub builtins: BTreeSet<String>,
    /// Runtime shims the bundle has to provide, in first-use order
    pub shims: Vec<BrowserEssential>,
    pub uses_file_name: bool,
    pub uses_dir_name: bool,
    /// `node_modules` trees of first-party packages found while resolving
    pub monorepo_modules: BTreeSet<PathBuf>,
    pub edge_counts: EdgeCounts,
    pub files_analyzed: usize,
}

impl ModuleGraph {
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}
