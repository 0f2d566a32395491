//! Report model for a finished cache invocation
//!
//! Serialized as JSON by the binary when `--format json` is used.

use serde::Serialize;

use crate::cache::Table;
use crate::controller::CacheOutcome;
use crate::models::CacheRequest;

/// Summary of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    /// Variable the table is bound to
    pub variable: String,
    /// Cache file location, as given
    pub path: String,
    /// Which branch the invocation took
    pub status: CacheOutcome,
    /// Human-readable status line
    pub message: String,
    /// Shape of the bound table, when one is bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl CacheReport {
    /// Creates a report for `request`, describing `table` if one is bound.
    pub fn new(request: &CacheRequest, status: CacheOutcome, table: Option<&Table>) -> Self {
        Self {
            variable: request.variable.clone(),
            path: request.path.display().to_string(),
            status,
            message: status.message().to_string(),
            rows: table.map(Table::n_rows),
            columns: table.map(|t| t.column_names().into_iter().map(str::to_string).collect()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
