//! baseline - Baseline feature references on the command line and in editors

use baseline::config::Config;
use baseline::data::load_registry;
use baseline::output::{OutputFormat, render_candidates, render_diagnostics, render_todos};
use baseline_core::{FeatureRegistry, ScanStatus, TodoReport, TodoScanner, validate};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "BASELINE_LOG";

#[derive(Parser)]
#[command(name = "baseline", version, about = "Check and explore Baseline web feature references")]
struct Args {
    /// Project root (defaults to the nearest directory with package.json or .git)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (defaults to .config/baseline/config.yaml under the root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report unrecognized feature ids in files
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List TODO(baseline/<id>) markers in the workspace
    Todos {
        /// Roots to scan (defaults to the project root)
        roots: Vec<PathBuf>,

        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Search features by id, name or description
    Search {
        query: String,

        /// Open the best match on webstatus.dev
        #[arg(long)]
        explore: bool,

        /// Maximum number of results to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Run the language server over stdio
    Lsp,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(matches!(args.command, Command::Lsp));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to create tokio runtime")?;

    match args.command {
        Command::Lsp => rt.block_on(baseline::lsp::run(args.root, args.config)),
        Command::Check { files } => {
            let (root, config) = load_project(args.root, args.config)?;
            let registry = load_registry(&config.data_path(&root));
            let count = run_check(&files, &registry, &config.data_path(&root))?;
            if count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Todos { roots, format } => {
            let (root, config) = load_project(args.root, args.config)?;
            let roots = if roots.is_empty() { vec![root.clone()] } else { roots };
            let registry = load_registry(&config.data_path(&root));
            let report = rt.block_on(run_todos(&roots, &config, &registry))?;
            print!("{}", render_todos(&report, format)?);
            Ok(())
        }
        Command::Search {
            query,
            explore,
            limit,
        } => {
            let (root, config) = load_project(args.root, args.config)?;
            let registry = load_registry(&config.data_path(&root));
            run_search(&query, explore, limit, &registry)
        }
    }
}

/// Logs go to stderr; stdout carries reports and LSP messages.
fn init_logging(lsp: bool) {
    let default = if lsp { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!lsp)
        .init();
}

fn load_project(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<(PathBuf, Config)> {
    let root = match root {
        Some(r) => r,
        None => baseline::find_project_root()?,
    };
    let config_path = config.unwrap_or_else(|| baseline::config_path(&root));
    let config = baseline::load_config_or_default(&config_path)?;
    Ok((root, config))
}

/// Validate each file, printing diagnostics. Returns how many were found.
fn run_check(files: &[PathBuf], registry: &FeatureRegistry, data_path: &Path) -> Result<usize> {
    if registry.is_empty() {
        eyre::bail!(
            "No feature data loaded from {}\n\n\
             Install it with `npm install --save-dev web-features`, or set `data` in {}",
            data_path.display(),
            baseline::config::CONFIG_PATH
        );
    }

    let mut total = 0;
    for file in files {
        let text = std::fs::read_to_string(file)
            .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
        let diagnostics = validate(&text, registry);
        total += diagnostics.len();
        print!("{}", render_diagnostics(file, &text, &diagnostics));
    }

    if total == 0 {
        eprintln!(
            "{} {} file(s), all feature ids recognized",
            "OK".green().bold(),
            files.len()
        );
    } else {
        eprintln!(
            "\n{} {} unrecognized feature id(s)",
            "!".red().bold(),
            total
        );
    }
    Ok(total)
}

async fn run_todos(
    roots: &[PathBuf],
    config: &Config,
    registry: &FeatureRegistry,
) -> Result<TodoReport> {
    let scanner = TodoScanner::new(config.scan_options())?;

    let mut entries = Vec::new();
    let status = scanner
        .scan(roots, &mut entries, &CancellationToken::new())
        .await
        .wrap_err("TODO scan failed")?;
    if status == ScanStatus::Cancelled {
        eyre::bail!("TODO scan was cancelled");
    }

    Ok(TodoReport::build(&entries, registry))
}

fn run_search(query: &str, explore: bool, limit: usize, registry: &FeatureRegistry) -> Result<()> {
    let candidates = registry.search(query);
    print!("{}", render_candidates(&candidates, limit));

    let Some(best) = candidates.first() else {
        return Ok(());
    };
    eprintln!("\n{} {}", "->".blue().bold(), best.summary());

    if explore {
        let url = best.explore_url();
        open::that(&url).wrap_err_with(|| format!("Failed to open {}", url))?;
    }
    Ok(())
}
