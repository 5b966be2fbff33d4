//! TypeScript project references as a single emitted-file → source-file table.
//!
//! Each referenced project is loaded once, its sources are mapped through the
//! per-extension output table, and the union becomes the [`RemapTable`] that
//! resolution consults so imports of a sibling project's build output land on
//! its sources.
//!
//! [`RemapTable`]: oxiresolve_core::RemapTable

mod graph;
mod host;
mod outputs;

// Re-export public API
pub use graph::{ProjectNode, ProjectReferenceGraph};
pub use host::{ConfigHost, FsHost};
pub use outputs::output_files;
