use std::{
    collections::BTreeMap,
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};
use oxiresolve_core::{DependencyReport, ResolutionResult};
use oxiresolve_project_refs::ProjectNode;

use crate::types::{ModuleGraph, Unresolved};

/// Path relative to the current working directory, for clickable links
fn display_path(path: &Path) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return path.display().to_string();
        }
    };
    match make_relative(path, &cwd) {
        Some(rel) => rel.to_string_lossy().to_string(),
        None => {
            trace!("Could not relativize '{}', using original", path.display());
            path.display().to_string()
        }
    }
}

/// Relative path from `base` to `target`; `None` when they share no root
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts.iter().zip(&base_parts).take_while(|(t, b)| t == b).count();
    if common == 0 && target_parts.first() != base_parts.first() {
        return None;
    }
    if common == target_parts.len() {
        return Some(PathBuf::from("."));
    }

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for component in &target_parts[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

fn flag(set: bool) -> colored::ColoredString {
    if set { "yes".green() } else { "no".dimmed() }
}

pub fn print_resolution<W: Write>(
    writer: &mut W,
    specifier: &str,
    from: &Path,
    result: Option<&ResolutionResult>,
) -> io::Result<()> {
    match result {
        Some(found) => {
            writeln!(
                writer,
                "{} {} {} {}",
                "✓".green().bold(),
                specifier.bold(),
                "→".dimmed(),
                display_path(&found.absolute_path).blue()
            )?;
            if found.is_directory_index {
                let entry = if found.is_custom_index { " (package entry)" } else { "" };
                writeln!(writer, "  directory index{}", entry)?;
            } else if found.is_custom_index {
                writeln!(writer, "  custom index")?;
            }
            if let Some(modules) = &found.monorepo_modules_path {
                writeln!(writer, "  package modules: {}", display_path(modules).blue())?;
            }
            if let Some(config) = &found.project_config_at_path {
                let config_path = display_path(&config.config_file_path);
                writeln!(writer, "  package tsconfig: {}", config_path.blue())?;
            }
        }
        None => {
            writeln!(
                writer,
                "{} Could not resolve {} from {}",
                "✗".red().bold(),
                specifier.bold(),
                display_path(from).blue()
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn print_scan_report<W: Write>(
    writer: &mut W,
    file: &Path,
    report: &DependencyReport,
) -> io::Result<()> {
    writeln!(writer, "{}", display_path(file).bright_white().bold())?;

    let total = report.imports.len() + report.workers.len();
    let mut idx = 0;
    for import in &report.imports {
        idx += 1;
        let prefix = if idx == total { "└──" } else { "├──" };
        let kind = serde_json::to_value(import.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        writeln!(writer, "{}  {} {}", prefix.dimmed(), kind.cyan(), import.statement)?;
    }
    for worker in &report.workers {
        idx += 1;
        let prefix = if idx == total { "└──" } else { "├──" };
        let kind = format!("{:?}", worker.kind);
        writeln!(writer, "{}  {} {}", prefix.dimmed(), kind.magenta(), worker.path)?;
    }
    writeln!(writer)?;

    let flags = &report.flags;
    writeln!(writer, "  ES6 syntax:       {}", flag(flags.es6_syntax))?;
    writeln!(writer, "  Dynamic imports:  {}", flag(flags.dynamic_imports))?;
    writeln!(writer, "  JSX:              {}", flag(flags.contains_jsx))?;
    writeln!(writer, "  __filename:       {}", flag(flags.references_file_name))?;
    writeln!(writer, "  __dirname:        {}", flag(flags.references_dir_name))?;
    if let Some(essentials) = &flags.browser_essentials {
        let names: Vec<&str> = essentials.iter().map(|e| e.variable.as_str()).collect();
        writeln!(writer, "  Runtime globals:  {}", names.join(", ").yellow())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_project_refs<W: Write>(writer: &mut W, nodes: &[ProjectNode]) -> io::Result<()> {
    if nodes.is_empty() {
        writeln!(writer, "{} No referenced projects", "✓".green().bold())?;
        writer.flush()?;
        return Ok(());
    }

    for node in nodes {
        writeln!(
            writer,
            "{} ({} emitted files)",
            display_path(&node.config_path).blue(),
            node.file_mappings.len().to_string().cyan()
        )?;
        for (idx, reference) in node.references.iter().enumerate() {
            let prefix = if idx == node.references.len() - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  references {}", prefix.dimmed(), display_path(reference))?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn print_graph_summary<W: Write>(writer: &mut W, graph: &ModuleGraph) -> io::Result<()> {
    writeln!(
        writer,
        "{} {} modules reachable from {} entries",
        "✓".green().bold(),
        graph.modules.len().to_string().cyan(),
        graph.entries.len().to_string().cyan()
    )?;

    let counts = &graph.edge_counts;
    writeln!(
        writer,
        "  Edges: {} static, {} require, {} dynamic, {} workers",
        counts.es6, counts.require, counts.dynamic, counts.worker
    )?;
    if !graph.builtins.is_empty() {
        let builtins: Vec<&str> = graph.builtins.iter().map(String::as_str).collect();
        writeln!(writer, "  Builtins: {}", builtins.join(", "))?;
    }
    if !graph.shims.is_empty() {
        let shims: Vec<String> =
            graph.shims.iter().map(|s| format!("{} ({})", s.variable, s.module_name)).collect();
        writeln!(writer, "  Runtime shims: {}", shims.join(", ").yellow())?;
    }
    if graph.uses_file_name || graph.uses_dir_name {
        writeln!(
            writer,
            "  Path globals: __filename {}, __dirname {}",
            flag(graph.uses_file_name),
            flag(graph.uses_dir_name)
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_unresolved_tree<W: Write>(
    writer: &mut W,
    unresolved: &[Unresolved],
) -> io::Result<()> {
    debug!("Printing unresolved tree for {} specifiers", unresolved.len());
    let mut by_file: BTreeMap<&Path, Vec<&str>> = BTreeMap::new();
    for u in unresolved {
        by_file.entry(u.from.as_path()).or_default().push(u.specifier.as_str());
    }

    writeln!(
        writer,
        "{} {} unresolved specifiers in {} files\n",
        "⚠".yellow().bold(),
        unresolved.len().to_string().yellow(),
        by_file.len()
    )?;

    for (file, specifiers) in &by_file {
        writeln!(writer, "{}", display_path(file).blue())?;
        for (idx, specifier) in specifiers.iter().enumerate() {
            let prefix = if idx == specifiers.len() - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  {}", prefix.dimmed(), specifier.red())?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiresolve_core::{ImportKind, ImportRecord, WorkerKind, WorkerRecord};

    fn plain(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_make_relative_same_dir() {
        let result = make_relative(Path::new("/project/src/file.ts"), Path::new("/project/src"));
        assert_eq!(result, Some(PathBuf::from("file.ts")));
    }

    #[test]
    fn test_make_relative_parent_dir() {
        let result =
            make_relative(Path::new("/project/src/file.ts"), Path::new("/project/src/components"));
        assert_eq!(result, Some(PathBuf::from("../file.ts")));
    }

    #[test]
    fn test_make_relative_sibling_dir() {
        let result =
            make_relative(Path::new("/project/apps/web/index.ts"), Path::new("/project/apps/api"));
        assert_eq!(result, Some(PathBuf::from("../web/index.ts")));
    }

    #[test]
    fn test_make_relative_same_path() {
        let result = make_relative(Path::new("/project/src"), Path::new("/project/src"));
        assert_eq!(result, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_make_relative_multiple_levels_up() {
        let result =
            make_relative(Path::new("/project/file.ts"), Path::new("/project/apps/web/src"));
        assert_eq!(result, Some(PathBuf::from("../../../file.ts")));
    }

    #[test]
    fn test_make_relative_no_shared_root() {
        assert_eq!(make_relative(Path::new("relative/a.ts"), Path::new("/project")), None);
    }

    #[test]
    fn test_unresolved_tree_groups_by_file() {
        colored::control::set_override(false);
        let unresolved = vec![
            Unresolved { from: PathBuf::from("/p/a.ts"), specifier: "./x".to_string() },
            Unresolved { from: PathBuf::from("/p/a.ts"), specifier: "left-pad".to_string() },
            Unresolved { from: PathBuf::from("/p/b.ts"), specifier: "./y".to_string() },
        ];
        let mut buf = Vec::new();
        print_unresolved_tree(&mut buf, &unresolved).unwrap();
        let out = plain(buf);

        assert!(out.contains("3 unresolved specifiers in 2 files"));
        assert!(out.contains("├──  ./x"));
        assert!(out.contains("└──  left-pad"));
        assert!(out.contains("└──  ./y"));
    }

    #[test]
    fn test_scan_report_lists_imports_then_workers() {
        colored::control::set_override(false);
        let report = DependencyReport {
            imports: vec![ImportRecord { kind: ImportKind::Es6, statement: "./a".to_string() }],
            workers: vec![WorkerRecord { path: "./w.js".to_string(), kind: WorkerKind::Worker }],
            flags: Default::default(),
        };
        let mut buf = Vec::new();
        print_scan_report(&mut buf, Path::new("/p/index.ts"), &report).unwrap();
        let out = plain(buf);

        assert!(out.contains("├──  ES6 ./a"));
        assert!(out.contains("└──  Worker ./w.js"));
        assert!(out.contains("ES6 syntax:       no"));
        assert!(!out.contains("Runtime globals"));
    }

    #[test]
    fn test_unresolved_resolution_message() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        print_resolution(&mut buf, "./missing", Path::new("/p/index.ts"), None).unwrap();
        assert!(plain(buf).contains("Could not resolve ./missing"));
    }
}
