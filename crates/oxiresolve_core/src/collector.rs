//! Entry discovery for graph builds that are not handed explicit entries.

use ignore::{
    WalkBuilder,
    overrides::{Override, OverrideBuilder},
};
use log::{debug, trace};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::constants::{JS_TS_EXTENSIONS, VENDOR_DIR};
use crate::error::{Error, Result};

/// Entries default to source files below any `src/` directory.
pub const DEFAULT_ENTRY_GLOB: &str = "**/src/**";

pub struct CollectorConfig {
    pub root: PathBuf,
    /// Gitignore-style glob, relative to `root`, that entry files must match
    pub entry_glob: Option<String>,
}

fn entry_matcher(cfg: &CollectorConfig) -> Result<Override> {
    let walk_err = |e| Error::Walk { path: cfg.root.clone(), source: e };
    let glob = cfg.entry_glob.as_deref().unwrap_or(DEFAULT_ENTRY_GLOB);
    let mut builder = OverrideBuilder::new(&cfg.root);
    builder.add(glob).map_err(walk_err)?;
    builder.build().map_err(walk_err)
}

/// Tests, specs and declaration files are never entries.
fn is_entry_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.contains(".test.") || name.contains(".spec.") || name.contains(".d.") {
        return false;
    }
    if path.components().any(|c| c.as_os_str() == OsStr::new(VENDOR_DIR)) {
        return false;
    }
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext))
}

pub fn collect_entries(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    let root = &cfg.root;
    let matcher = entry_matcher(cfg)?;
    debug!("Collecting entry files under {}", root.display());

    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();
    let mut files = Vec::new();
    for res in walker {
        let dent = res.map_err(|e| Error::Walk { path: root.clone(), source: e })?;
        let p = dent.path();
        if !p.is_file() || !is_entry_candidate(p) {
            continue;
        }
        if matcher.matched(p, false).is_whitelist() {
            trace!("Entry file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    files.sort();
    debug!("Collected {} entry files", files.len());
    Ok(files)
}
