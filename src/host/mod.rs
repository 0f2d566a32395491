//! Host Module
//!
//! The interactive session the cache runs inside of: something that executes
//! code blocks in a persistent namespace of named values.
//!
//! # Hosts
//! - `ShellContext`: runs code blocks with a shell and collects tables the
//!   block writes to `$PDCACHE_OUT`

mod namespace;
mod shell;

use std::fmt;

use crate::cache::{Scalar, Table};

pub use namespace::Namespace;
pub use shell::{ShellContext, OUTPUT_DIR_VAR};

// == Value ==
/// A value bound to a name in the host namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Table(Table),
    Scalar(Scalar),
}

impl Value {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            Value::Table(_) => None,
        }
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

// == Execution Result ==
/// Outcome of running one code block.
///
/// A failing block is reported here instead of being returned as an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Failure description, if any
    pub error: Option<String>,
    /// Whatever the block printed
    pub output: String,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            output: output.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            output: String::new(),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.success, &self.error) {
            (true, _) => f.write_str("ok"),
            (false, Some(error)) => write!(f, "failed: {}", error),
            (false, None) => f.write_str("failed"),
        }
    }
}

// == Execution Context ==
/// A persistent namespace that can execute code against itself.
pub trait ExecutionContext {
    /// Runs `code`. Failures inside the code are reported, never propagated.
    fn run(&mut self, code: &str) -> ExecutionResult;

    /// Returns the value bound to `name`, if any.
    fn get(&self, name: &str) -> Option<&Value>;

    /// Binds `name` to `value`, replacing any previous binding.
    fn set(&mut self, name: &str, value: Value);
}

/// Returns true if `name` can be bound in a namespace.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
