use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A lookup was requested without a base directory or importing file.
    #[error("Failed to lookup '{specifier}'. Provide either a file directory or a file path")]
    MissingLookupContext { specifier: String },

    /// `import(expr)` where `expr` is not a string literal.
    #[error("Dynamic import argument must be a string literal, found `{expression}` at offset {offset}")]
    NonLiteralDynamicImport { expression: String, offset: u32 },

    /// Two different project inputs claim the same emitted file.
    #[error(
        "Multiple input files map to same output file (1. \"{}\", 2. \"{}\") => (\"{}\")",
        existing.display(),
        incoming.display(),
        output.display()
    )]
    OutputConflict { output: PathBuf, existing: PathBuf, incoming: PathBuf },

    /// A project input lies outside the project's `rootDir`.
    #[error(
        "Source file \"{}\" is outside the root directory \"{}\"; its output location is undefined",
        file.display(),
        root_dir.display()
    )]
    OutsideRootDir { file: PathBuf, root_dir: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    /// Whether the failure must halt the whole build rather than a single file.
    pub fn is_build_fatal(&self) -> bool {
        matches!(
            self,
            Error::NonLiteralDynamicImport { .. }
                | Error::OutputConflict { .. }
                | Error::OutsideRootDir { .. }
        )
    }
}
