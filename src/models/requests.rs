//! Request model for one cache invocation
//!
//! Turns the two-token command line `<variable> <path>` into a
//! `CacheRequest`, after substituting `$name` references from the host
//! namespace.

use std::path::PathBuf;

use crate::cache::Scalar;
use crate::error::{CacheError, Result};
use crate::host::{is_identifier, ExecutionContext};

/// Everything one invocation needs. Lives only as long as that invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    /// Name the table is bound to
    pub variable: String,
    /// Cache file location
    pub path: PathBuf,
    /// Code block to run on a miss
    pub code: String,
}

impl CacheRequest {
    pub fn new(
        variable: impl Into<String>,
        path: impl Into<PathBuf>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            path: path.into(),
            code: code.into(),
        }
    }

    /// Parses a command line against the host namespace.
    ///
    /// The line is interpolated first, then split with shell quoting rules;
    /// exactly two tokens must remain.
    pub fn parse<C>(line: &str, code: &str, ctx: &C) -> Result<Self>
    where
        C: ExecutionContext + ?Sized,
    {
        let expanded = interpolate(line, ctx);
        let tokens = shlex::split(&expanded)
            .ok_or_else(|| CacheError::Usage(format!("unbalanced quotes in `{}`", expanded)))?;

        let request = match tokens.as_slice() {
            [variable, path] => Self::new(variable.as_str(), path.as_str(), code),
            _ => {
                return Err(CacheError::Usage(format!(
                    "expected `<variable> <path>`, got {} argument(s)",
                    tokens.len()
                )))
            }
        };

        request.checked()
    }

    /// Builds a request from already separated arguments.
    ///
    /// Only the path is interpolated; it is used as a single path even if it
    /// contains whitespace.
    pub fn from_args<C>(variable: &str, path: &str, code: &str, ctx: &C) -> Result<Self>
    where
        C: ExecutionContext + ?Sized,
    {
        Self::new(variable, interpolate(path, ctx), code).checked()
    }

    fn checked(self) -> Result<Self> {
        match self.validate() {
            Some(error_msg) => Err(CacheError::Usage(error_msg)),
            None => Ok(self),
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !is_identifier(&self.variable) {
            return Some(format!("'{}' is not a valid variable name", self.variable));
        }
        if self.path.as_os_str().is_empty() {
            return Some("Path cannot be empty".to_string());
        }
        None
    }
}

// == Interpolation ==
/// Substitutes `$name` and `${name}` with scalar bindings from `ctx`.
///
/// `$$` is a literal dollar sign. References to unknown names or to tables
/// are left as written.
pub fn interpolate<C>(line: &str, ctx: &C) -> String
where
    C: ExecutionContext + ?Sized,
{
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        let reference = &rest[pos..pos + 1 + consumed];
        match lookup_scalar(name, ctx) {
            Some(value) => out.push_str(&value),
            None => out.push_str(reference),
        }
        rest = &rest[pos + 1 + consumed..];
    }

    out.push_str(rest);
    out
}

fn lookup_scalar<C>(name: &str, ctx: &C) -> Option<String>
where
    C: ExecutionContext + ?Sized,
{
    if !is_identifier(name) {
        return None;
    }
    ctx.get(name)?.as_scalar().map(Scalar::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Table;
    use crate::host::{ExecutionResult, Namespace, Value};

    #[derive(Default)]
    struct Bindings(Namespace);

    impl ExecutionContext for Bindings {
        fn run(&mut self, _code: &str) -> ExecutionResult {
            ExecutionResult::succeeded("")
        }

        fn get(&self, name: &str) -> Option<&Value> {
            self.0.get(name)
        }

        fn set(&mut self, name: &str, value: Value) {
            self.0.set(name, value);
        }
    }

    fn bindings() -> Bindings {
        let mut ctx = Bindings::default();
        ctx.set("cache_dir", Value::Scalar(Scalar::from("fubar")));
        ctx.set("n", Value::Scalar(Scalar::Int(7)));
        ctx.set("df", Value::Table(Table::empty()));
        ctx
    }

    #[test]
    fn test_parse_two_tokens() {
        let req = CacheRequest::parse("df data.csv", "df = 1", &bindings()).unwrap();
        assert_eq!(req, CacheRequest::new("df", "data.csv", "df = 1"));
    }

    #[test]
    fn test_parse_interpolates_path() {
        let req = CacheRequest::parse("df /tmp/$cache_dir/data.csv", "", &bindings()).unwrap();
        assert_eq!(req.path, PathBuf::from("/tmp/fubar/data.csv"));
    }

    #[test]
    fn test_parse_wrong_arity() {
        let ctx = bindings();
        assert!(matches!(CacheRequest::parse("df", "", &ctx), Err(CacheError::Usage(_))));
        assert!(matches!(
            CacheRequest::parse("df a.csv b.csv", "", &ctx),
            Err(CacheError::Usage(_))
        ));
        assert!(matches!(CacheRequest::parse("   ", "", &ctx), Err(CacheError::Usage(_))));
    }

    #[test]
    fn test_parse_rejects_invalid_variable() {
        let result = CacheRequest::parse("1df data.csv", "", &bindings());
        assert!(matches!(result, Err(CacheError::Usage(_))));
    }

    #[test]
    fn test_parse_quoted_path_with_spaces() {
        let req = CacheRequest::parse("df \"my dir/data.csv\"", "", &bindings()).unwrap();
        assert_eq!(req.path, PathBuf::from("my dir/data.csv"));

        let req = CacheRequest::parse("df '$cache_dir/a b.csv'", "", &bindings()).unwrap();
        assert_eq!(req.path, PathBuf::from("fubar/a b.csv"));
    }

    #[test]
    fn test_parse_unbalanced_quote() {
        let result = CacheRequest::parse("df \"data.csv", "", &bindings());
        assert!(matches!(result, Err(CacheError::Usage(_))));
    }

    #[test]
    fn test_from_args_keeps_path_whole() {
        let ctx = bindings();
        let req = CacheRequest::from_args("df", "$cache_dir/my data.csv", "x", &ctx).unwrap();
        assert_eq!(req, CacheRequest::new("df", "fubar/my data.csv", "x"));

        assert!(matches!(
            CacheRequest::from_args("df", "", "x", &ctx),
            Err(CacheError::Usage(_))
        ));
        assert!(matches!(
            CacheRequest::from_args("my df", "a.csv", "x", &ctx),
            Err(CacheError::Usage(_))
        ));
    }

    #[test]
    fn test_interpolate_braced_and_escaped() {
        let ctx = bindings();
        assert_eq!(interpolate("${cache_dir}_${n}.csv", &ctx), "fubar_7.csv");
        assert_eq!(interpolate("cost$$n", &ctx), "cost$n");
    }

    #[test]
    fn test_interpolate_leaves_unknown_and_tables() {
        let ctx = bindings();
        assert_eq!(interpolate("$missing/$df/x", &ctx), "$missing/$df/x");
        assert_eq!(interpolate("${unclosed", &ctx), "${unclosed");
        assert_eq!(interpolate("trailing$", &ctx), "trailing$");
    }
}
