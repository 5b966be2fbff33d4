//! Specifier → file probing.
//!
//! Steps run in a fixed priority order and stop at the first hit:
//!
//! 1. the specifier already has an extension: check it directly
//! 2. append each candidate extension (typed-first or script-first)
//! 3. the path is a directory: package manifest entry, else index files
//! 4. append `.json`, unless the path is a directory
//!
//! Every file check goes through the remap table first, so references into a
//! referenced project's output tree land on that project's sources.

use log::{debug, trace, warn};
use path_clean::clean;
use std::path::{Path, PathBuf};

use crate::constants::{JSON_EXTENSION, PACKAGE_MANIFEST};
use crate::error::{Error, Result};
use crate::package::{EntryOptions, resolve_entry};
use crate::remap::{RemapTable, find_mapped_file};
use crate::types::{ResolutionRequest, ResolutionResult, extension_of};

pub fn lookup(request: &ResolutionRequest) -> Result<ResolutionResult> {
    let base = request
        .base_dir()
        .ok_or_else(|| Error::MissingLookupContext { specifier: request.specifier.to_string() })?;
    let resolved = clean(base.join(request.specifier));
    let remap = request.remap;
    trace!("Looking up '{}' as {}", request.specifier, resolved.display());

    // a remapped hit still reports the extension that was asked for
    if resolved.extension().is_some()
        && let Some(direct) = find_mapped_file(&resolved, remap)
    {
        trace!("Direct match: {}", direct.display());
        let extension = extension_of(&resolved);
        return Ok(ResolutionResult { extension, ..ResolutionResult::found(direct) });
    }

    if let Some(file) = try_extensions(&resolved, request.order.extensions(), remap) {
        trace!("Matched by extension: {}", file.display());
        return Ok(ResolutionResult::found(file));
    }

    let is_directory = resolved.is_dir();
    if is_directory {
        if resolved.join(PACKAGE_MANIFEST).is_file() {
            match resolve_package_directory(&resolved, request) {
                Some(result) => return Ok(result),
                None => debug!("Falling back to index files in {}", resolved.display()),
            }
        }

        if let Some(index) = try_indexes(&resolved, request.order.indexes(), remap) {
            trace!("Matched directory index: {}", index.display());
            let found = ResolutionResult::found(index);
            return Ok(ResolutionResult { is_directory_index: true, ..found });
        }
    }

    // rarely what a specifier means, so it goes last
    if !is_directory && let Some(json) = try_extensions(&resolved, &[JSON_EXTENSION], remap) {
        trace!("Matched json fallback: {}", json.display());
        return Ok(ResolutionResult { is_custom_index: true, ..ResolutionResult::found(json) });
    }

    debug!("Could not resolve '{}' from {}", request.specifier, base.display());
    Ok(ResolutionResult::not_found(resolved))
}

fn try_extensions(
    target: &Path,
    extensions: &[&str],
    remap: Option<&RemapTable>,
) -> Option<PathBuf> {
    extensions.iter().find_map(|ext| {
        let mut candidate = target.as_os_str().to_os_string();
        candidate.push(ext);
        find_mapped_file(Path::new(&candidate), remap)
    })
}

fn try_indexes(dir: &Path, indexes: &[&str], remap: Option<&RemapTable>) -> Option<PathBuf> {
    indexes.iter().find_map(|index| find_mapped_file(&dir.join(index), remap))
}

/// Enters a directory through its manifest. `None` when the manifest is unreadable.
fn resolve_package_directory(dir: &Path, request: &ResolutionRequest) -> Option<ResolutionResult> {
    let entry = match resolve_entry(dir, EntryOptions { browser: request.browser }) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Ignoring package manifest in {}: {}", dir.display(), e);
            return None;
        }
    };

    let (absolute_path, exists) = match probe_entry(&entry.entry_file, request) {
        Some(found) => (found, true),
        None => (entry.entry_file, false),
    };

    Some(ResolutionResult {
        extension: extension_of(&absolute_path),
        absolute_path,
        exists,
        is_directory_index: true,
        is_custom_index: true,
        monorepo_modules_path: entry.monorepo_modules_path,
        project_config_at_path: entry.project_config_at_path,
    })
}

/// Entries such as `"main": "lib/index"` still need extension or index inference.
/// An unbuilt `"main": "dist/index.js"` lands on its source through the remap table.
fn probe_entry(entry: &Path, request: &ResolutionRequest) -> Option<PathBuf> {
    let (order, remap) = (request.order, request.remap);
    find_mapped_file(entry, remap)
        .or_else(|| try_extensions(entry, order.extensions(), remap))
        .or_else(|| try_indexes(entry, order.indexes(), remap))
}
