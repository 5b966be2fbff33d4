use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use oxiresolve_core::{
    CollectorConfig, DependencyReport, ImportKind, JS_TS_EXTENSIONS, ResolveCache,
    ResolverContext, collect_entries, resolve, scan_file,
};
use rayon::prelude::*;
use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use crate::{
    config::GraphConfig,
    constants::is_builtin,
    types::{EdgeCounts, EdgeKind, ModuleEdge, ModuleGraph, ModuleNode, Unresolved},
};

type ScanCache = DashMap<PathBuf, Arc<DependencyReport>>;

/// One analyzed module plus the package `node_modules` trees its resolutions revealed.
struct Analyzed {
    node: ModuleNode,
    monorepo_modules: Vec<PathBuf>,
}

fn is_scannable(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext))
}

pub fn build_module_graph(cfg: &GraphConfig) -> Result<ModuleGraph> {
    info!("Starting module graph build");
    let root = cfg.project.root()?.clone();
    let resolver = cfg.project.resolver()?;

    let entries = if cfg.entries.is_empty() {
        debug!("Collecting entry files with glob: {:?}", cfg.entry_glob);
        let collector = CollectorConfig { root: root.clone(), entry_glob: cfg.entry_glob.clone() };
        collect_entries(&collector)?
    } else {
        cfg.entries
            .iter()
            .map(|e| e.canonicalize().with_context(|| format!("Entry {} not found", e.display())))
            .collect::<Result<Vec<_>>>()?
    };
    if entries.is_empty() {
        warn!("No entry files found under {}", root.display());
        return Err(anyhow!("No entry files found under {}", root.display()));
    }
    info!("Found {} entry files", entries.len());

    let scan_cache: Arc<ScanCache> = Arc::new(DashMap::new());
    let resolve_cache: Arc<ResolveCache> = Arc::new(DashMap::new());

    let mut graph = ModuleGraph { root, entries: entries.clone(), ..Default::default() };
    let mut visited: HashSet<PathBuf> = entries.iter().cloned().collect();
    let mut frontier = entries;
    let mut round = 0;

    while !frontier.is_empty() {
        round += 1;
        debug!("Round {}: analyzing {} modules", round, frontier.len());
        let known_modules: Vec<PathBuf> = graph.monorepo_modules.iter().cloned().collect();

        let analyzed: Vec<Result<Analyzed>> = frontier
            .par_iter()
            .map(|file| {
                let thread_id = thread::current().id();
                trace!("Thread {:?} analyzing: {}", thread_id, file.display());
                analyze(resolver, file, &known_modules, &scan_cache, &resolve_cache)
            })
            .collect();

        let mut next = Vec::new();
        for result in analyzed {
            let Analyzed { node, monorepo_modules } = result?;
            graph.monorepo_modules.extend(monorepo_modules);
            for edge in &node.edges {
                if let Some(target) = &edge.resolved
                    && visited.insert(target.clone())
                {
                    next.push(target.clone());
                }
            }
            graph.modules.insert(node.path.clone(), node);
        }
        next.sort();
        frontier = next;
    }

    summarize(&mut graph);
    graph.files_analyzed = graph.modules.len();
    info!(
        "Module graph complete: {} modules, {} unresolved specifiers",
        graph.modules.len(),
        graph.unresolved.len()
    );
    debug!("Cache statistics: scans={}, resolutions={}", scan_cache.len(), resolve_cache.len());
    Ok(graph)
}

fn scan_cached(file: &Path, cache: &ScanCache) -> Result<Arc<DependencyReport>> {
    if let Some(report) = cache.get(file) {
        trace!("Cache hit for scan: {}", file.display());
        return Ok(Arc::clone(&report));
    }
    let report = match scan_file(file) {
        Ok(report) => report,
        Err(e) if e.is_build_fatal() => {
            return Err(anyhow!(e).context(format!("Failed to scan {}", file.display())));
        }
        Err(e) => {
            warn!("Error scanning {}: {}", file.display(), e);
            DependencyReport::default()
        }
    };
    let report = Arc::new(report);
    cache.insert(file.to_path_buf(), Arc::clone(&report));
    Ok(report)
}

fn analyze(
    resolver: &ResolverContext,
    file: &Path,
    known_modules: &[PathBuf],
    scan_cache: &ScanCache,
    resolve_cache: &ResolveCache,
) -> Result<Analyzed> {
    if !is_scannable(file) {
        trace!("Not a script, no dependencies: {}", file.display());
        let node =
            ModuleNode { path: file.to_path_buf(), edges: Vec::new(), flags: Default::default() };
        return Ok(Analyzed { node, monorepo_modules: Vec::new() });
    }

    let report = scan_cached(file, scan_cache)?;

    // first-party packages resolve bare specifiers through their own node_modules as well
    let package_modules: Vec<PathBuf> = known_modules
        .iter()
        .filter(|modules| modules.parent().is_some_and(|pkg| file.starts_with(pkg)))
        .cloned()
        .collect();
    let scoped;
    let resolver = if package_modules.is_empty() {
        resolver
    } else {
        let mut ctx = resolver.clone();
        ctx.module_roots.extend(package_modules);
        scoped = ctx;
        &scoped
    };

    let specifiers = report
        .imports
        .iter()
        .map(|i| (i.statement.as_str(), EdgeKind::Import(i.kind)))
        .chain(report.workers.iter().map(|w| (w.path.as_str(), EdgeKind::Worker(w.kind))));

    let mut edges = Vec::new();
    let mut monorepo_modules = Vec::new();
    for (specifier, kind) in specifiers {
        let resolved = resolve(resolver, file, specifier, resolve_cache)
            .with_context(|| format!("Failed to resolve '{}' from {}", specifier, file.display()))?;
        let resolved = resolved.map(|r| {
            if let Some(modules) = r.monorepo_modules_path {
                monorepo_modules.push(modules);
            }
            if let Some(config) = &r.project_config_at_path {
                debug!("Package config at {}", config.config_file_path.display());
            }
            r.absolute_path
        });
        edges.push(ModuleEdge { specifier: specifier.to_string(), kind, resolved });
    }
    debug!("Module {} has {} edges", file.display(), edges.len());

    let node = ModuleNode { path: file.to_path_buf(), edges, flags: report.flags.clone() };
    Ok(Analyzed { node, monorepo_modules })
}

/// Aggregates per-module facts into the graph-wide view.
fn summarize(graph: &mut ModuleGraph) {
    let mut unresolved = BTreeSet::new();
    let mut counts = EdgeCounts::default();

    for node in graph.modules.values() {
        graph.uses_file_name |= node.flags.references_file_name;
        graph.uses_dir_name |= node.flags.references_dir_name;
        for essential in node.flags.browser_essentials.iter().flatten() {
            if !graph.shims.contains(essential) {
                graph.shims.push(essential.clone());
            }
        }

        for edge in &node.edges {
            match edge.kind {
                EdgeKind::Import(ImportKind::Es6) => counts.es6 += 1,
                EdgeKind::Import(ImportKind::Require) => counts.require += 1,
                EdgeKind::Import(ImportKind::Dynamic) => counts.dynamic += 1,
                EdgeKind::Worker(_) => counts.worker += 1,
            }
            if edge.resolved.is_some() {
                continue;
            }
            if is_builtin(&edge.specifier) {
                graph.builtins.insert(edge.specifier.clone());
            } else {
                unresolved.insert(Unresolved {
                    from: node.path.clone(),
                    specifier: edge.specifier.clone(),
                });
            }
        }
    }

    graph.unresolved = unresolved.into_iter().collect();
    graph.edge_counts = counts;
}
