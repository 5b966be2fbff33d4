use log::trace;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Emitted-file → source-file table built from project references.
///
/// Built once per build and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    entries: HashMap<PathBuf, PathBuf>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Path> {
        self.entries.get(path).map(PathBuf::as_path)
    }

    /// Records `from → to`, returning the previous target if there was one.
    pub fn insert(&mut self, from: PathBuf, to: PathBuf) -> Option<PathBuf> {
        self.entries.insert(from, to)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_path(), v.as_path()))
    }
}

impl FromIterator<(PathBuf, PathBuf)> for RemapTable {
    fn from_iter<I: IntoIterator<Item = (PathBuf, PathBuf)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Follows the table once, then requires the terminal path to be a file.
///
/// The mapped value is never looked up again, so `a → b → a` cannot ping-pong.
pub(crate) fn find_mapped_file(path: &Path, remap: Option<&RemapTable>) -> Option<PathBuf> {
    if let Some(mapped) = remap.and_then(|table| table.get(path))
        && mapped != path
    {
        trace!("Remapped {} -> {}", path.display(), mapped.display());
        return find_mapped_file(mapped, None);
    }
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(path.to_path_buf()),
        _ => None,
    }
}
