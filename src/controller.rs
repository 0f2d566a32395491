//! Cache Controller
//!
//! Decides, per invocation, whether to load a cached table or to run the code
//! block and cache what it produced.
//!
//! ```text
//! START -> HIT  -> LOAD -> BIND -> DONE
//! START -> MISS -> EXECUTE -> SUCCESS -> STORE -> DONE
//!                          -> FAILURE -> SKIP  -> DONE
//! ```

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::host::{ExecutionContext, Value};
use crate::models::CacheRequest;

// == Cache Outcome ==
/// Which branch an invocation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    /// The file existed and was bound without running the code
    Loaded,
    /// The code ran and its result was written
    Stored,
    /// The code failed, nothing was written
    Skipped,
}

impl CacheOutcome {
    /// Status line shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            CacheOutcome::Loaded => "Loading data from cache",
            CacheOutcome::Stored => "Caching new data",
            CacheOutcome::Skipped => "Skip caching due to error",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Loaded => "loaded",
            CacheOutcome::Stored => "stored",
            CacheOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// == Controller ==
/// Orchestrates the store and the host for one invocation at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controller {
    store: CacheStore,
}

impl Controller {
    // == Run ==
    /// Loads `variable` from `path` if it exists, otherwise runs `code` and
    /// caches the table it binds to `variable`.
    ///
    /// A failing code block is not an error: the outcome is `Skipped` and the
    /// host has already reported the failure. Parse, I/O and name errors
    /// propagate.
    pub fn run<C>(
        &self,
        variable: &str,
        path: &Path,
        code: &str,
        ctx: &mut C,
    ) -> Result<CacheOutcome>
    where
        C: ExecutionContext + ?Sized,
    {
        if self.store.exists(path) {
            let table = self.store.load(path)?;
            ctx.set(variable, Value::Table(table));
            info!(
                variable,
                path = %path.display(),
                status = CacheOutcome::Loaded.as_str(),
                "{}",
                CacheOutcome::Loaded.message()
            );
            return Ok(CacheOutcome::Loaded);
        }

        let result = ctx.run(code);
        if !result.success {
            info!(
                variable,
                path = %path.display(),
                status = CacheOutcome::Skipped.as_str(),
                error = result.error.as_deref().unwrap_or_default(),
                "{}",
                CacheOutcome::Skipped.message()
            );
            return Ok(CacheOutcome::Skipped);
        }

        let table = match ctx.get(variable) {
            Some(Value::Table(table)) => table,
            Some(Value::Scalar(_)) => return Err(CacheError::NotATable(variable.to_string())),
            None => return Err(CacheError::Name(variable.to_string())),
        };
        self.store.save(path, table)?;
        info!(
            variable,
            path = %path.display(),
            status = CacheOutcome::Stored.as_str(),
            rows = table.n_rows(),
            "{}",
            CacheOutcome::Stored.message()
        );
        Ok(CacheOutcome::Stored)
    }

    /// Runs a parsed request.
    pub fn invoke<C>(&self, request: &CacheRequest, ctx: &mut C) -> Result<CacheOutcome>
    where
        C: ExecutionContext + ?Sized,
    {
        self.run(&request.variable, &request.path, &request.code, ctx)
    }
}

/// Runs one invocation with the default store.
pub fn run<C>(variable: &str, path: &Path, code: &str, ctx: &mut C) -> Result<CacheOutcome>
where
    C: ExecutionContext + ?Sized,
{
    Controller::default().run(variable, path, code, ctx)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Scalar, Table};
    use crate::host::{ExecutionResult, Namespace};
    use std::fs;
    use tempfile::TempDir;

    /// Host whose code blocks are looked up in a table of canned effects.
    #[derive(Default)]
    struct ScriptedContext {
        namespace: Namespace,
        blocks: Vec<(String, Option<(String, Value)>, bool)>,
        executed: Vec<String>,
    }

    impl ScriptedContext {
        fn on(mut self, code: &str, binds: Option<(&str, Value)>, success: bool) -> Self {
            self.blocks.push((
                code.to_string(),
                binds.map(|(name, value)| (name.to_string(), value)),
                success,
            ));
            self
        }
    }

    impl ExecutionContext for ScriptedContext {
        fn run(&mut self, code: &str) -> ExecutionResult {
            self.executed.push(code.to_string());
            let block = self.blocks.iter().find(|(c, _, _)| c == code).cloned();
            match block {
                Some((_, binds, success)) => {
                    if let Some((name, value)) = binds {
                        self.namespace.set(&name, value);
                    }
                    if success {
                        ExecutionResult::succeeded("")
                    } else {
                        ExecutionResult::failed("ZeroDivisionError")
                    }
                }
                None => ExecutionResult::succeeded(""),
            }
        }

        fn get(&self, name: &str) -> Option<&Value> {
            self.namespace.get(name)
        }

        fn set(&mut self, name: &str, value: Value) {
            self.namespace.set(name, value);
        }
    }

    fn sample_table() -> Table {
        Table::from_columns(vec![
            ("A", vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]),
            ("B", vec![Scalar::Int(4), Scalar::Int(5), Scalar::Int(6)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_miss_runs_and_stores() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let mut ctx = ScriptedContext::default().on("make df", Some(("df", sample_table().into())), true);

        let outcome = run("df", &path, "make df", &mut ctx).unwrap();

        assert_eq!(outcome, CacheOutcome::Stored);
        assert_eq!(ctx.executed, vec!["make df"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), ",A,B\n0,1,4\n1,2,5\n2,3,6\n");
    }

    #[test]
    fn test_hit_loads_without_running() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        CacheStore::new().save(&path, &sample_table()).unwrap();
        let mut ctx = ScriptedContext::default();
        ctx.set("df2", Value::Scalar(Scalar::from("stale")));

        let outcome = run("df2", &path, "df2 = Table({})", &mut ctx).unwrap();

        assert_eq!(outcome, CacheOutcome::Loaded);
        assert!(ctx.executed.is_empty());
        assert_eq!(ctx.get("df2"), Some(&Value::Table(sample_table())));
    }

    #[test]
    fn test_failure_skips_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let mut ctx = ScriptedContext::default().on("boom", Some(("df", sample_table().into())), false);

        let outcome = run("df", &path, "boom", &mut ctx).unwrap();

        assert_eq!(outcome, CacheOutcome::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_binding_is_name_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let mut ctx = ScriptedContext::default();

        let result = run("df", &path, "", &mut ctx);

        assert!(matches!(result, Err(CacheError::Name(ref name)) if name == "df"));
        assert!(!path.exists());
        assert_eq!(ctx.executed, vec![""]);
    }

    #[test]
    fn test_scalar_binding_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let mut ctx = ScriptedContext::default().on("x", Some(("df", Scalar::Int(1).into())), true);

        let result = run("df", &path, "x", &mut ctx);

        assert!(matches!(result, Err(CacheError::NotATable(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_cache_file_propagates_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        fs::write(&path, "").unwrap();
        let mut ctx = ScriptedContext::default();

        let result = run("df", &path, "make df", &mut ctx);

        assert!(matches!(result, Err(CacheError::Parse { .. })));
        assert!(ctx.executed.is_empty());
    }

    #[test]
    fn test_invoke_uses_request_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("data.csv");
        let request = CacheRequest::new("df", &path, "make df");
        let mut ctx = ScriptedContext::default().on("make df", Some(("df", sample_table().into())), true);

        let outcome = Controller::default().invoke(&request, &mut ctx).unwrap();

        assert_eq!(outcome, CacheOutcome::Stored);
        assert!(path.is_file());
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(CacheOutcome::Loaded.to_string(), "Loading data from cache");
        assert_eq!(CacheOutcome::Stored.to_string(), "Caching new data");
        assert_eq!(CacheOutcome::Skipped.to_string(), "Skip caching due to error");
    }
}
