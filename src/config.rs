//! Configuration Module
//!
//! Handles loading the cache runner configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// How a finished invocation is reported on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The plain status line
    #[default]
    Text,
    /// A JSON `CacheReport`
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Runner configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interpreter used to run code blocks, invoked as `<shell> -c <code>`
    pub shell: String,
    /// Working directory for code blocks; relative cache paths resolve here
    pub workdir: PathBuf,
    /// Status output format
    pub format: OutputFormat,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PDCACHE_SHELL` - Interpreter for code blocks (default: sh)
    /// - `PDCACHE_WORKDIR` - Working directory (default: current directory)
    /// - `PDCACHE_FORMAT` - `text` or `json` (default: text)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            shell: env::var("PDCACHE_SHELL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.shell),
            workdir: env::var("PDCACHE_WORKDIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.workdir),
            format: env::var("PDCACHE_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.format),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            workdir: PathBuf::from("."),
            format: OutputFormat::Text,
        }
    }
}
