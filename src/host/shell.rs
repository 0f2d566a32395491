//! Shell Host
//!
//! Executes code blocks with an external interpreter (`sh -c <code>` by
//! default). Tables cross the process boundary as CSV: the block writes
//! `<name>.csv` files into the directory named by `$PDCACHE_OUT`, and each one
//! becomes a binding called `name` once the block exits successfully.
//!
//! Scalar bindings are exported to the block as environment variables.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::cache::{read_table, Table};
use crate::config::Config;
use crate::host::{is_identifier, ExecutionContext, ExecutionResult, Namespace, Value};

/// Environment variable naming the directory a block writes its tables to.
pub const OUTPUT_DIR_VAR: &str = "PDCACHE_OUT";

// == Shell Context ==
/// Host that runs each code block as a child process.
#[derive(Debug)]
pub struct ShellContext {
    /// Interpreter invoked as `<shell> -c <code>`
    shell: String,
    /// Working directory of every block
    workdir: PathBuf,
    namespace: Namespace,
    /// Stdout of the most recent block
    last_output: String,
}

impl ShellContext {
    // == Constructor ==
    pub fn new(shell: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            workdir: workdir.into(),
            namespace: Namespace::new(),
            last_output: String::new(),
        }
    }

    /// Creates a shell host from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.shell.clone(), config.workdir.clone())
    }

    /// What the most recent code block printed to stdout.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    // == Execute ==
    /// Runs the block and returns the tables it produced.
    fn execute(&self, code: &str) -> Result<(String, Vec<(String, Table)>), String> {
        let out_dir = TempDir::new().map_err(|e| format!("cannot create output dir: {}", e))?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(code)
            .current_dir(&self.workdir)
            .env(OUTPUT_DIR_VAR, out_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (name, value) in self.namespace.iter() {
            if let Value::Scalar(scalar) = value {
                cmd.env(name, scalar.to_string());
            }
        }

        debug!(shell = %self.shell, workdir = %self.workdir.display(), "running code block");
        let output = cmd
            .output()
            .map_err(|e| format!("failed to spawn {}: {}", self.shell, e))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(format!("exit status {}: {}", code, stderr.trim_end()));
        }

        let tables = collect_tables(out_dir.path())?;
        Ok((stdout, tables))
    }
}

impl ExecutionContext for ShellContext {
    fn run(&mut self, code: &str) -> ExecutionResult {
        self.last_output.clear();
        match self.execute(code) {
            Ok((output, tables)) => {
                self.last_output.clone_from(&output);
                for (name, table) in tables {
                    debug!(name = %name, rows = table.n_rows(), "binding table");
                    self.namespace.set(&name, Value::Table(table));
                }
                ExecutionResult::succeeded(output)
            }
            Err(error) => {
                warn!(error = %error, "code block failed");
                ExecutionResult::failed(error)
            }
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.namespace.get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.namespace.set(name, value);
    }
}

/// Reads every `<name>.csv` in `dir`. Any unreadable table fails the block.
fn collect_tables(dir: &Path) -> Result<Vec<(String, Table)>, String> {
    let entries = fs::read_dir(dir).map_err(|e| format!("cannot read {}: {}", dir.display(), e))?;

    let mut tables = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let name = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(name) if is_identifier(name) => name.to_string(),
            _ => {
                warn!(file = %path.display(), "ignoring output with invalid name");
                continue;
            }
        };

        let file = File::open(&path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
        let table = read_table(file, &path).map_err(|e| e.to_string())?;
        tables.push((name, table));
    }

    Ok(tables)
}
