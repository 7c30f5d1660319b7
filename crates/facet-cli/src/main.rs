//! facet CLI - drive actions over demo face scans
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`FACET_*`)
//! 3. Project config (`.facet/config.toml` in the project root)
//! 4. Global config (`~/.facet/config.toml`, or `--config`)
//! 5. Default values (lowest priority)
//!
//! # Modes
//!
//! With trailing arguments the CLI runs them as commands (separated by `;`)
//! and exits non-zero if any failed. Without, it reads one command per line
//! from stdin.

mod demo;
mod session;

use anyhow::Result;
use clap::Parser;
use facet_runtime::config::{ConfigError, ConfigLoader, ConfigResolver, FacetConfig};
use session::{Flow, Session};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// facet CLI - drive actions over demo face scans
#[derive(Parser, Debug)]
#[command(name = "facet")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Global config file (defaults to ~/.facet/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum concurrent background actions
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Maximum propagation passes per wave
    #[arg(long, value_name = "N")]
    max_passes: Option<usize>,

    /// Maximum undo entries
    #[arg(long, value_name = "N")]
    undo_limit: Option<usize>,

    /// Simulated work per invert_normals run, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    work_ms: u64,

    /// Commands to execute, separated by `;` (optional)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    global_config: Option<PathBuf>,
    debug: bool,
    max_concurrent: Option<usize>,
    max_passes: Option<usize>,
    undo_limit: Option<usize>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            global_config: args.config.clone(),
            debug: args.debug,
            max_concurrent: args.max_concurrent,
            max_passes: args.max_passes,
            undo_limit: args.undo_limit,
        }
    }

    fn resolve(&self) -> Result<FacetConfig, ConfigError> {
        let mut loader = ConfigLoader::new().with_project_root(&self.project_root);
        if let Some(ref path) = self.global_config {
            loader = loader.with_global_config(path);
        }

        let mut config = loader.load()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut FacetConfig) {
        if self.debug {
            config.debug = true;
        }
        if let Some(n) = self.max_concurrent {
            config.workers.max_concurrent = n;
        }
        if let Some(n) = self.max_passes {
            config.propagation.max_passes = n;
        }
        if let Some(n) = self.undo_limit {
            config.undo.max_entries = n;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
    // Logs go to stderr; stdout carries command output only.
    let filter = if args.debug {
        EnvFilter::new("debug,tokio=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    info!(path = %resolver.project_root.display(), "Project root");
    info!(
        debug = config.debug,
        max_concurrent = config.workers.max_concurrent,
        max_passes = config.propagation.max_passes,
        undo_limit = config.undo.max_entries,
        "Configuration resolved"
    );

    let stdout = std::io::stdout();
    let mut session = Session::new(&config, Duration::from_millis(args.work_ms), stdout.lock())?;

    if args.command.is_empty() {
        let failures = session.run(std::io::stdin().lock())?;
        info!(failures, "Session finished");
        return Ok(());
    }

    let script = args.command.join(" ");
    info!("Command mode: {}", script);
    let mut failed = false;
    for line in script.split(';') {
        match session.execute(line) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                failed = true;
                eprintln!("Error: {e:#}");
                break;
            }
        }
    }
    let drained = session.drain();
    std::io::stdout().flush()?;
    drained?;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
