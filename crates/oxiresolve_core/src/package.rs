//! Package manifest entry points.
//!
//! First-party packages (anything outside a `node_modules` tree) may declare a
//! `local:main` field that wins over `main`/`module`. Such packages can also
//! carry their own `node_modules` and `tsconfig.json`, which are surfaced to
//! the caller so a monorepo subpackage builds with its own vendor tree and
//! compiler options.

use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{
    DEFAULT_PACKAGE_ENTRY, LOCAL_MAIN_FIELD, PACKAGE_MANIFEST, TSCONFIG_FILE, VENDOR_DIR,
};
use crate::error::{Error, Result};
use crate::tsconfig::TsConfig;
use crate::types::ProjectConfigRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Honour the string form of the manifest `browser` field
    pub browser: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageEntry {
    pub entry_file: PathBuf,
    pub monorepo_modules_path: Option<PathBuf>,
    pub project_config_at_path: Option<ProjectConfigRef>,
}

/// Whether `path` lies inside a vendored dependency tree.
pub fn is_vendored(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == VENDOR_DIR)
}

fn non_empty_str<'a>(manifest: &'a Value, field: &str) -> Option<&'a str> {
    manifest.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Picks the entry named by a manifest, falling back to `index.js`.
pub fn folder_entry_point(manifest: &Value, use_local_field: bool, browser: bool) -> &str {
    if use_local_field && let Some(local) = non_empty_str(manifest, LOCAL_MAIN_FIELD) {
        return local;
    }
    if browser && let Some(entry) = non_empty_str(manifest, "browser") {
        return entry;
    }
    non_empty_str(manifest, "module")
        .or_else(|| non_empty_str(manifest, "main"))
        .unwrap_or(DEFAULT_PACKAGE_ENTRY)
}

pub fn resolve_entry(directory: &Path, options: EntryOptions) -> Result<PackageEntry> {
    let manifest_path = directory.join(PACKAGE_MANIFEST);
    trace!("Reading package manifest: {}", manifest_path.display());
    let text = fs::read_to_string(&manifest_path).map_err(|e| Error::io(&manifest_path, e))?;
    let manifest: Value = serde_json::from_str(&text)
        .map_err(|e| Error::Json { path: manifest_path.clone(), source: e })?;

    let use_local_main = !is_vendored(&manifest_path);
    let entry = folder_entry_point(&manifest, use_local_main, options.browser);
    let entry_file = clean(directory.join(entry));
    debug!("Package {} enters at {}", directory.display(), entry_file.display());

    let mut resolved =
        PackageEntry { entry_file, monorepo_modules_path: None, project_config_at_path: None };

    if use_local_main && non_empty_str(&manifest, LOCAL_MAIN_FIELD).is_some() {
        let modules = directory.join(VENDOR_DIR);
        if modules.exists() {
            trace!("Found monorepo modules at {}", modules.display());
            resolved.monorepo_modules_path = Some(modules);
        }

        let tsconfig_path = directory.join(TSCONFIG_FILE);
        if tsconfig_path.exists() {
            match TsConfig::load(&tsconfig_path) {
                Ok(config) => {
                    resolved.project_config_at_path = Some(config.as_project_config_ref())
                }
                Err(e) => debug!("Ignoring package tsconfig {}: {}", tsconfig_path.display(), e),
            }
        }
    }

    Ok(resolved)
}
