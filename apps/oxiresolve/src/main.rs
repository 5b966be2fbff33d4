use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use oxiresolve_core::{ResolveCache, resolve, scan_file};
use oxiresolve_graph::{GraphConfig, ProjectConfig};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oxiresolve")]
#[command(about = "Module resolution and dependency discovery for JavaScript/TypeScript projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a single specifier to a file
    Resolve {
        specifier: String,

        /// Importing file, or the directory to resolve from
        #[arg(long)]
        from: PathBuf,

        #[command(flatten)]
        project: ProjectConfig,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report the imports, workers and runtime globals of a source file
    Scan {
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Expand the project references of a tsconfig
    Refs {
        /// Config to expand (defaults to <root>/tsconfig.json)
        #[arg(value_name = "TSCONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectConfig,

        /// Print the projects as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the module graph reachable from entry files
    Graph(GraphConfig),
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn print_finished<W: Write>(writer: &mut W, start: Instant, files: usize) -> Result<()> {
    writeln!(
        writer,
        "\n{} Finished in {}ms on {} files (using {} threads).",
        "●".bright_blue(),
        start.elapsed().as_millis().to_string().cyan(),
        files.to_string().cyan(),
        rayon::current_num_threads().to_string().cyan()
    )?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Resolve { specifier, from, mut project, json } => {
            project.initialize()?;
            let from = from
                .canonicalize()
                .with_context(|| format!("{} does not exist", from.display()))?;
            // a directory stands in for an extensionless file inside it
            let importer = if from.is_dir() { from.join("index") } else { from.clone() };

            let cache = ResolveCache::new();
            let result = resolve(project.resolver()?, &importer, &specifier, &cache)
                .with_context(|| format!("Failed to resolve '{}'", specifier))?;

            if json {
                write_json(&mut stdout, &result)?;
            } else {
                oxiresolve_graph::print_resolution(
                    &mut stdout,
                    &specifier,
                    &from,
                    result.as_ref(),
                )?;
            }
            if result.is_none() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Scan { file, json } => {
            let report =
                scan_file(&file).with_context(|| format!("Failed to scan {}", file.display()))?;
            debug!("Found {} imports and {} workers", report.imports.len(), report.workers.len());

            if json {
                write_json(&mut stdout, &report)
            } else {
                oxiresolve_graph::print_scan_report(&mut stdout, &file, &report)?;
                print_finished(&mut stdout, start, 1)
            }
        }
        Commands::Refs { config, mut project, json } => {
            if config.is_some() {
                project.tsconfig = config;
            }
            project.initialize()?;
            info!("Expanded {} referenced projects", project.project_refs.len());

            if json {
                write_json(&mut stdout, &project.project_refs)
            } else {
                oxiresolve_graph::print_project_refs(&mut stdout, &project.project_refs)?;
                let files = project.project_refs.iter().map(|n| n.file_mappings.len()).sum();
                print_finished(&mut stdout, start, files)
            }
        }
        Commands::Graph(mut cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Building module graph (using {} threads)", num_threads);
            debug!("Config: root={:?}, entry_glob={:?}", cfg.project.root, cfg.entry_glob);

            cfg.project.initialize()?;
            let graph = oxiresolve_graph::build_module_graph(&cfg)?;
            debug!("Found {} unresolved specifiers", graph.unresolved.len());

            if cfg.json {
                write_json(&mut stdout, &graph)?;
            } else {
                oxiresolve_graph::print_graph_summary(&mut stdout, &graph)?;
                if graph.has_unresolved() {
                    writeln!(stdout)?;
                    oxiresolve_graph::print_unresolved_tree(&mut stdout, &graph.unresolved)?;
                }
                print_finished(&mut stdout, start, graph.files_analyzed)?;
            }

            if graph.has_unresolved() {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
