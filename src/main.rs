//! pdcache - Memoize notebook cell results as CSV tables
//!
//! Runs one cached cell: `pdcache <variable> <path> [cell]`. The cell is read
//! from stdin when not given. Status goes to stdout, logs and the cell's own
//! output go to stderr.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdcache::cache::Scalar;
use pdcache::config::{Config, OutputFormat};
use pdcache::host::{ExecutionContext, ShellContext, Value};
use pdcache::{CacheReport, CacheRequest, Controller};

/// Load a cached table, or run the cell and cache the table it produces.
#[derive(Parser, Debug)]
#[command(name = "pdcache", version)]
struct Cli {
    /// Variable the table is bound to
    variable: String,

    /// Cache file; `$name` is replaced by a `--set` binding
    path: String,

    /// Code run on a cache miss (read from stdin when omitted)
    cell: Option<String>,

    /// Status output format: text or json
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Interpreter for the cell, invoked as `<shell> -c <cell>`
    #[arg(long)]
    shell: Option<String>,

    /// Working directory for the cell and for relative cache paths
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Bind a scalar before running, e.g. `--set cache_dir=fubar`
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_binding)]
    bindings: Vec<(String, String)>,
}

/// Main entry point for the pdcache runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables, then apply CLI flags
/// 3. Seed the shell host with `--set` bindings
/// 4. Parse `<variable> <path>` with interpolation
/// 5. Run the controller and report the outcome
fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "warn" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdcache=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(shell) = cli.shell {
        config.shell = shell;
    }
    if let Some(workdir) = cli.workdir {
        config.workdir = workdir;
    }
    debug!(shell = %config.shell, workdir = %config.workdir.display(), "configuration loaded");

    let code = match cli.cell {
        Some(cell) => cell,
        None => {
            let mut cell = String::new();
            io::stdin()
                .read_to_string(&mut cell)
                .context("Failed to read cell from stdin")?;
            cell
        }
    };

    let mut ctx = ShellContext::from_config(&config);
    for (name, raw) in cli.bindings {
        ctx.set(&name, Value::Scalar(Scalar::Str(raw)));
    }

    let request = CacheRequest::from_args(&cli.variable, &cli.path, &code, &ctx)?;
    let target = config.workdir.join(&request.path);

    let outcome = Controller::default()
        .run(&request.variable, &target, &request.code, &mut ctx)
        .with_context(|| format!("Failed to cache '{}' at {}", request.variable, target.display()))?;

    if !ctx.last_output().is_empty() {
        eprint!("{}", ctx.last_output());
    }

    let mut stdout = io::stdout().lock();
    match config.format {
        OutputFormat::Text => writeln!(stdout, "{}", outcome)?,
        OutputFormat::Json => {
            let table = ctx.get(&request.variable).and_then(Value::as_table);
            let report = CacheReport::new(&request, outcome, table);
            writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }

    Ok(())
}

/// Parses `NAME=VALUE` for `--set`.
fn parse_binding(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if pdcache::host::is_identifier(name) => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

