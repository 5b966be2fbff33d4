use log::{debug, info, trace};
use oxiresolve_core::{Error, RemapTable, Result, TSCONFIG_FILE, TsConfig};
use path_clean::clean;
use serde::Serialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::host::ConfigHost;
use crate::outputs::output_files;

/// One loaded project: its emitted files and the projects it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    pub config_path: PathBuf,
    /// `(output, input)` pairs in source order
    pub file_mappings: Vec<(PathBuf, PathBuf)>,
    pub references: Vec<PathBuf>,
}

/// Every project reachable from the root references, built in a single pass.
#[derive(Debug, Clone, Default)]
pub struct ProjectReferenceGraph {
    nodes: Vec<ProjectNode>,
    remap: RemapTable,
}

struct Traversal<'h, H: ConfigHost + ?Sized> {
    host: &'h H,
    visited: HashSet<PathBuf>,
    graph: ProjectReferenceGraph,
}

impl ProjectReferenceGraph {
    /// Follows `roots` depth-first. Unloadable references are skipped; output
    /// conflicts and inputs outside `rootDir` abort the build.
    pub fn build<H: ConfigHost + ?Sized>(roots: &[PathBuf], host: &H) -> Result<Self> {
        let mut traversal =
            Traversal { host, visited: HashSet::new(), graph: ProjectReferenceGraph::default() };
        for root in roots {
            traversal.visit(root)?;
        }
        let graph = traversal.graph;
        info!(
            "Loaded {} referenced projects mapping {} emitted files",
            graph.nodes.len(),
            graph.remap.len()
        );
        Ok(graph)
    }

    /// The graph for every reference listed by `config`.
    pub fn from_config<H: ConfigHost + ?Sized>(config: &TsConfig, host: &H) -> Result<Self> {
        Self::build(&config.reference_paths(), host)
    }

    pub fn nodes(&self) -> &[ProjectNode] {
        &self.nodes
    }

    pub fn remap_table(&self) -> &RemapTable {
        &self.remap
    }

    pub fn into_remap_table(self) -> RemapTable {
        self.remap
    }
}

impl<H: ConfigHost + ?Sized> Traversal<'_, H> {
    /// Directory-first: `path/tsconfig.json` wins over `path` itself.
    fn locate(&self, reference: &Path) -> Option<PathBuf> {
        let reference = clean(reference);
        let names_config = reference.file_name().is_some_and(|name| name == TSCONFIG_FILE);
        if !names_config {
            let nested = reference.join(TSCONFIG_FILE);
            if self.host.is_file(&nested) {
                return Some(nested);
            }
        }
        self.host.is_file(&reference).then_some(reference)
    }

    fn visit(&mut self, reference: &Path) -> Result<()> {
        let Some(config_path) = self.locate(reference) else {
            debug!("Skipping reference {}: no config found", reference.display());
            return Ok(());
        };
        if !self.visited.insert(config_path.clone()) {
            trace!("Already visited {}", config_path.display());
            return Ok(());
        }

        let config = match self.host.load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                debug!("Skipping reference {}: {}", config_path.display(), e);
                return Ok(());
            }
        };

        let root_dir = config.root_dir();
        let out_dir = config.out_dir().unwrap_or_else(|| root_dir.clone());
        let mut file_mappings = Vec::new();
        for input in self.host.source_files(&config)? {
            for output in output_files(&input, &root_dir, &out_dir)? {
                self.record(&output, &input)?;
                file_mappings.push((output, input.clone()));
            }
        }
        debug!("Project {} maps {} emitted files", config_path.display(), file_mappings.len());

        let references = config.reference_paths();
        self.graph.nodes.push(ProjectNode {
            config_path,
            file_mappings,
            references: references.clone(),
        });
        for nested in &references {
            self.visit(nested)?;
        }
        Ok(())
    }

    fn record(&mut self, output: &Path, input: &Path) -> Result<()> {
        if let Some(existing) = self.graph.remap.get(output)
            && existing != input
        {
            return Err(Error::OutputConflict {
                output: output.to_path_buf(),
                existing: existing.to_path_buf(),
                incoming: input.to_path_buf(),
            });
        }
        self.graph.remap.insert(output.to_path_buf(), input.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FsHost;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn project(root: &Path, name: &str, references: &[&str]) {
        let refs: Vec<String> =
            references.iter().map(|r| format!(r#"{{ "path": "{}" }}"#, r)).collect();
        create_test_file(
            root,
            &format!("{}/tsconfig.json", name),
            &format!(
                r#"{{ "compilerOptions": {{ "rootDir": "src", "outDir": "dist" }}, "references": [{}] }}"#,
                refs.join(", ")
            ),
        );
    }

    #[test]
    fn test_maps_outputs_to_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        project(root, "lib", &[]);
        let input = create_test_file(root, "lib/src/index.ts", "");

        let graph = ProjectReferenceGraph::build(&[root.join("lib")], &FsHost).unwrap();
        let remap = graph.remap_table();
        assert_eq!(remap.len(), 4);
        assert_eq!(remap.get(&root.join("lib/dist/index.js")), Some(input.as_path()));
        assert_eq!(remap.get(&root.join("lib/dist/index.d.ts.map")), Some(input.as_path()));

        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.nodes()[0].config_path, root.join("lib/tsconfig.json"));
    }

    #[test]
    fn test_nested_references_and_shared_base() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        project(root, "base", &[]);
        project(root, "a", &["../base"]);
        project(root, "b", &["../base/tsconfig.json"]);
        create_test_file(root, "base/src/core.ts", "");
        create_test_file(root, "a/src/a.ts", "");
        create_test_file(root, "b/src/b.ts", "");

        let graph =
            ProjectReferenceGraph::build(&[root.join("a"), root.join("b")], &FsHost).unwrap();
        let configs: Vec<&Path> = graph.nodes().iter().map(|n| n.config_path.as_path()).collect();
        assert_eq!(
            configs,
            vec![
                root.join("a/tsconfig.json").as_path(),
                root.join("base/tsconfig.json").as_path(),
                root.join("b/tsconfig.json").as_path(),
            ]
        );
        assert_eq!(graph.remap_table().len(), 12);
    }

    #[test]
    fn test_cycles_terminate() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        project(root, "a", &["../b"]);
        project(root, "b", &["../a"]);
        create_test_file(root, "a/src/a.ts", "");
        create_test_file(root, "b/src/b.ts", "");

        let graph = ProjectReferenceGraph::build(&[root.join("a")], &FsHost).unwrap();
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_output_conflict_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        project(root, "lib", &[]);
        create_test_file(root, "lib/src/button.ts", "");
        create_test_file(root, "lib/src/button.tsx", "");

        let err = ProjectReferenceGraph::build(&[root.join("lib")], &FsHost).unwrap_err();
        match &err {
            Error::OutputConflict { output, existing, incoming } => {
                assert_eq!(output, &root.join("lib/dist/button.d.ts"));
                assert_eq!(existing, &root.join("lib/src/button.ts"));
                assert_eq!(incoming, &root.join("lib/src/button.tsx"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.is_build_fatal());
        assert!(err.to_string().starts_with("Multiple input files map to same output file"));
    }

    #[test]
    fn test_conflict_across_projects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "a/tsconfig.json",
            r#"{ "compilerOptions": { "rootDir": "src", "outDir": "../dist" } }"#,
        );
        create_test_file(
            root,
            "b/tsconfig.json",
            r#"{ "compilerOptions": { "rootDir": "src", "outDir": "../dist" } }"#,
        );
        create_test_file(root, "a/src/index.ts", "");
        create_test_file(root, "b/src/index.ts", "");

        let result = ProjectReferenceGraph::build(&[root.join("a"), root.join("b")], &FsHost);
        assert!(matches!(result, Err(Error::OutputConflict { .. })));
    }

    #[test]
    fn test_outside_root_dir_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "lib/tsconfig.json",
            r#"{ "compilerOptions": { "rootDir": "src", "outDir": "dist" }, "include": ["src", "scripts"] }"#,
        );
        create_test_file(root, "lib/src/index.ts", "");
        create_test_file(root, "lib/scripts/build.ts", "");

        let result = ProjectReferenceGraph::build(&[root.join("lib")], &FsHost);
        assert!(matches!(result, Err(Error::OutsideRootDir { .. })));
    }

    #[test]
    fn test_broken_and_missing_references_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "broken/tsconfig.json", "{ not json");
        project(root, "ok", &[]);
        create_test_file(root, "ok/src/a.ts", "");

        let roots = [root.join("broken"), root.join("missing"), root.join("ok")];
        let graph = ProjectReferenceGraph::build(&roots, &FsHost).unwrap();
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.remap_table().len(), 4);
    }

    #[test]
    fn test_reference_to_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "lib/tsconfig.build.json", r#"{ "compilerOptions": { "outDir": "out" } }"#);
        let input = create_test_file(root, "lib/index.ts", "");

        let graph =
            ProjectReferenceGraph::build(&[root.join("lib/tsconfig.build.json")], &FsHost).unwrap();
        assert_eq!(graph.remap_table().get(&root.join("lib/out/index.js")), Some(input.as_path()));
    }

    #[test]
    fn test_from_root_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let tsconfig =
            create_test_file(root, "tsconfig.json", r#"{ "references": [{ "path": "./lib" }] }"#);
        project(root, "lib", &[]);
        create_test_file(root, "lib/src/index.ts", "");

        let config = TsConfig::load(&tsconfig).unwrap();
        let graph = ProjectReferenceGraph::from_config(&config, &FsHost).unwrap();
        assert_eq!(graph.into_remap_table().len(), 4);
    }

    #[test]
    fn test_nodes_serialize() {
        let node = ProjectNode {
            config_path: PathBuf::from("/p/tsconfig.json"),
            file_mappings: vec![(PathBuf::from("/p/dist/a.js"), PathBuf::from("/p/src/a.ts"))],
            references: Vec::new(),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["configPath"], "/p/tsconfig.json");
        assert_eq!(json["fileMappings"][0][1], "/p/src/a.ts");
    }
}
