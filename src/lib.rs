//! pdcache - Memoize notebook cell results as CSV tables
//!
//! A code block either runs and has the table it produced written to a file,
//! or, if that file already exists, is skipped and the table is loaded back.

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod models;

pub use cache::{CacheStore, Scalar, Table};
pub use config::Config;
pub use controller::{run, CacheOutcome, Controller};
pub use error::{CacheError, Result};
pub use host::{ExecutionContext, ExecutionResult, ShellContext, Value};
pub use models::{CacheReport, CacheRequest};
