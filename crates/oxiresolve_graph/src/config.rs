use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser};
use log::{debug, info};
use oxiresolve_core::{ExtensionOrder, ResolverContext, TSCONFIG_FILE, TsConfig, find_git_root};
use oxiresolve_project_refs::{FsHost, ProjectNode, ProjectReferenceGraph};
use std::{path::PathBuf, sync::Arc};

/// Where the project lives and how its specifiers resolve.
#[derive(Debug, Clone, Default, Args)]
pub struct ProjectConfig {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// tsconfig.json providing `paths`, `baseUrl` and `references`
    /// (defaults to <root>/tsconfig.json)
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,

    /// Probe .js/.jsx before .ts/.tsx for extensionless specifiers
    #[arg(long)]
    pub script_first: bool,

    /// Enter packages through the `browser` field of their manifest
    #[arg(long)]
    pub browser: bool,

    #[clap(skip)]
    pub resolver: Option<ResolverContext>,

    #[clap(skip)]
    pub project_refs: Vec<ProjectNode>,
}

impl ProjectConfig {
    /// Resolve the root directory, load the root tsconfig and expand its project references
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root().context("Could not find .git directory in any parent folder")?
        };
        info!("Using root directory: {}", root.display());

        let tsconfig_path = match self.tsconfig.take() {
            Some(path) => Some(path.canonicalize().unwrap_or(path)),
            None => Some(root.join(TSCONFIG_FILE)).filter(|p| p.is_file()),
        };

        let mut resolver = match &tsconfig_path {
            Some(path) => {
                debug!("Reading tsconfig: {}", path.display());
                let tsconfig = TsConfig::load(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                let graph = ProjectReferenceGraph::from_config(&tsconfig, &FsHost)
                    .with_context(|| {
                        format!("Failed to expand project references of {}", path.display())
                    })?;
                self.project_refs = graph.nodes().to_vec();
                let remap = graph.into_remap_table();
                debug!(
                    "Loaded {} projects remapping {} emitted files",
                    self.project_refs.len(),
                    remap.len()
                );
                ResolverContext::from_tsconfig(&root, &tsconfig).with_remap(Arc::new(remap))
            }
            None => {
                debug!("No tsconfig found, resolving without aliases");
                ResolverContext::new(&root)
            }
        };
        resolver.order = if self.script_first {
            ExtensionOrder::ScriptFirst
        } else {
            ExtensionOrder::TypedFirst
        };
        resolver.browser = self.browser;
        debug!("Found {} tsconfig path aliases", resolver.aliases.len());

        self.tsconfig = tsconfig_path;
        self.resolver = Some(resolver);
        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    pub fn resolver(&self) -> Result<&ResolverContext> {
        self.resolver
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "graph")]
#[command(about = "Build the module graph reachable from entry files")]
pub struct GraphConfig {
    #[command(flatten)]
    pub project: ProjectConfig,

    /// Entry files (defaults to every source file under a `src/` directory)
    pub entries: Vec<PathBuf>,

    /// Glob, relative to the root, that collected entry files must match
    #[arg(long)]
    pub entry_glob: Option<String>,

    /// Print the graph as JSON
    #[arg(long)]
    pub json: bool,
}
