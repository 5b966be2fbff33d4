use ignore::{
    WalkBuilder,
    overrides::{Override, OverrideBuilder},
};
use log::{debug, trace};
use oxiresolve_core::{DEFAULT_TSCONFIG_EXCLUDES, Error, Result, TsConfig};
use std::{
    collections::BTreeSet,
    path::{Component, Path, PathBuf},
};

const TS_SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];
const JS_SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Filesystem access needed to expand project references.
pub trait ConfigHost {
    fn is_file(&self, path: &Path) -> bool;

    fn load_config(&self, path: &Path) -> Result<TsConfig>;

    /// Source files the config compiles: `files` plus `include` minus `exclude`.
    fn source_files(&self, config: &TsConfig) -> Result<Vec<PathBuf>>;
}

/// Reads configs and source trees straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsHost;

impl ConfigHost for FsHost {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load_config(&self, path: &Path) -> Result<TsConfig> {
        TsConfig::load(path)
    }

    fn source_files(&self, config: &TsConfig) -> Result<Vec<PathBuf>> {
        let dir = config.dir();
        let extensions: Vec<&str> = if config.allow_js() {
            TS_SOURCE_EXTENSIONS.iter().chain(JS_SOURCE_EXTENSIONS).copied().collect()
        } else {
            TS_SOURCE_EXTENSIONS.to_vec()
        };
        let excluded = exclude_matcher(config)?;

        let mut files = BTreeSet::new();
        for file in config.files.iter().flatten() {
            let path = PathBuf::from(file);
            if path.is_file() {
                files.insert(path);
            } else {
                debug!("Listed file {} does not exist", path.display());
            }
        }

        let includes = match (&config.include, &config.files) {
            (Some(include), _) => include.clone(),
            (None, None) => vec![dir.join("**/*").to_string_lossy().to_string()],
            (None, Some(_)) => Vec::new(),
        };
        for pattern in &includes {
            walk_include(pattern, &extensions, &excluded, &mut files)?;
        }

        debug!("{} compiles {} source files", config.path.display(), files.len());
        Ok(files.into_iter().collect())
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| extensions.contains(&ext))
}

fn is_glob(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Splits an absolute include pattern into the directory to walk and the glob below it.
fn split_glob(pattern: &str) -> (PathBuf, Option<String>) {
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();
    for component in Path::new(pattern).components() {
        let segment = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !is_glob(&segment) {
            base.push(component);
        } else if !matches!(component, Component::RootDir) {
            rest.push(segment.to_string());
        }
    }
    if rest.is_empty() { (base, None) } else { (base, Some(rest.join("/"))) }
}

/// Matches excluded paths as whitelist hits of an override rooted at the config dir.
fn exclude_matcher(config: &TsConfig) -> Result<Override> {
    let dir = config.dir();
    let walk_err = |e| Error::Walk { path: config.path.clone(), source: e };
    let mut builder = OverrideBuilder::new(dir);

    let anchored = |absolute: &Path| {
        absolute.strip_prefix(dir).ok().map(|rel| format!("/{}", rel.to_string_lossy()))
    };

    match &config.exclude {
        Some(exclude) => {
            for pattern in exclude {
                match anchored(Path::new(pattern)) {
                    Some(rel) => {
                        builder.add(&rel).map_err(walk_err)?;
                        builder.add(&format!("{}/**", rel)).map_err(walk_err)?;
                    }
                    None => trace!("Ignoring exclude outside {}: {}", dir.display(), pattern),
                }
            }
        }
        None => {
            for name in DEFAULT_TSCONFIG_EXCLUDES {
                builder.add(name).map_err(walk_err)?;
            }
        }
    }

    // emitted files never feed back in as sources
    if let Some(out_dir) = config.out_dir()
        && let Some(rel) = anchored(&out_dir)
        && rel != "/"
    {
        builder.add(&rel).map_err(walk_err)?;
        builder.add(&format!("{}/**", rel)).map_err(walk_err)?;
    }

    builder.build().map_err(walk_err)
}

fn walk_include(
    pattern: &str,
    extensions: &[&str],
    excluded: &Override,
    files: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    let (base, glob) = split_glob(pattern);
    let glob = match glob {
        Some(glob) => glob,
        None if base.is_file() => {
            if has_extension(&base, extensions) {
                files.insert(base);
            }
            return Ok(());
        }
        None => "**/*".to_string(),
    };
    if !base.is_dir() {
        trace!("Include base {} does not exist", base.display());
        return Ok(());
    }

    trace!("Walking {} for '{}'", base.display(), glob);
    let walk_err = |e| Error::Walk { path: base.clone(), source: e };
    let mut builder = OverrideBuilder::new(&base);
    builder.add(&glob).map_err(walk_err)?;
    let include = builder.build().map_err(walk_err)?;

    let excluded = excluded.clone();
    let walker = WalkBuilder::new(&base)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .parents(false)
        .overrides(include)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !excluded.matched(entry.path(), is_dir).is_whitelist()
        })
        .build();

    for res in walker {
        let dent = res.map_err(walk_err)?;
        let path = dent.path();
        if dent.file_type().is_some_and(|t| t.is_file()) && has_extension(path, extensions) {
            files.insert(path.to_path_buf());
        }
    }
    Ok(())
}
