//! Module graph construction for JavaScript/TypeScript projects.
//!
//! Starting from a set of entry files, the builder alternates between scanning
//! modules for their dependencies and resolving those dependencies to files,
//! one frontier at a time, until no new module turns up. Project references
//! from the root tsconfig are expanded once up front so emitted files resolve
//! back to their sources.
//!
//! # Examples
//!
//! ```no_run
//! use oxiresolve_graph::{GraphConfig, ProjectConfig, build_module_graph};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut project = ProjectConfig {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     ..Default::default()
//! };
//! project.initialize()?;
//!
//! let cfg = GraphConfig { project, entries: Vec::new(), entry_glob: None, json: false };
//! let graph = build_module_graph(&cfg)?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! oxiresolve_graph::print_graph_summary(&mut stdout, &graph)?;
//! if graph.has_unresolved() {
//!     oxiresolve_graph::print_unresolved_tree(&mut stdout, &graph.unresolved)?;
//! }
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod constants;
mod reporter;
mod types;

// Re-export public API
pub use builder::build_module_graph;
pub use config::{GraphConfig, ProjectConfig};
pub use constants::is_builtin;
pub use reporter::{
    print_graph_summary, print_project_refs, print_resolution, print_scan_report,
    print_unresolved_tree,
};
pub use types::{EdgeCounts, EdgeKind, ModuleEdge, ModuleGraph, ModuleNode, Unresolved};
