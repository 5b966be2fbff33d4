//! Module resolution and dependency discovery for JavaScript/TypeScript projects.
//!
//! This crate provides:
//! - Turning a specifier plus a directory or importing file into a file on disk
//!   (extension inference, directory indexes, package entries, remapping)
//! - Package manifest entry points, including monorepo `local:main` overrides
//! - A fast two-pass scanner reporting imports, workers and free runtime globals
//! - tsconfig loading with `extends`, `paths` and `references`
//! - A caching resolver layered on top for aliases, `baseUrl` and `node_modules`
//!
//! # Examples
//!
//! ```no_run
//! use oxiresolve_core::{ResolutionRequest, lookup, scan, ScanOptions};
//! use std::path::Path;
//!
//! # fn main() -> oxiresolve_core::Result<()> {
//! let result = lookup(&ResolutionRequest::from_dir("./utils", Path::new("/project/src")))?;
//! if result.exists {
//!     let report = oxiresolve_core::scan_file(&result.absolute_path)?;
//!     for specifier in report.specifiers() {
//!         println!("{}", specifier);
//!     }
//! }
//! let report = scan("import a from './a';", &ScanOptions::default())?;
//! assert_eq!(report.imports.len(), 1);
//! # Ok(())
//! # }
//! ```

mod collector;
mod constants;
mod error;
mod lookup;
mod package;
mod remap;
mod resolver;
mod scanner;
mod scope;
mod tsconfig;
mod types;

// Re-export public API
pub use collector::{CollectorConfig, DEFAULT_ENTRY_GLOB, collect_entries};
pub use constants::{
    DECLARATION_SUFFIXES, DEFAULT_TSCONFIG_EXCLUDES, JS_TS_EXTENSIONS, TS_OUTPUT_EXTENSIONS,
    TSCONFIG_FILE,
};
pub use error::{Error, Result};
pub use lookup::lookup;
pub use oxc_span::SourceType;
pub use package::{EntryOptions, PackageEntry, folder_entry_point, is_vendored, resolve_entry};
pub use remap::RemapTable;
pub use resolver::{ResolveCache, ResolverContext, order_for, resolve};
pub use scanner::{ScanOptions, scan, scan_file};
pub use tsconfig::{PathAlias, TsConfig, TsReference, find_git_root, read_jsonc};
pub use types::{
    BrowserEssential, DependencyReport, ExtensionOrder, ImportKind, ImportRecord,
    ProjectConfigRef, ResolutionRequest, ResolutionResult, SyntaxFlags, WorkerKind, WorkerRecord,
    extension_of,
};
