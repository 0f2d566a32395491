//! Cache Module
//!
//! Persists tables as CSV files, one file per cached result.

mod path;
mod store;
mod table;


// Re-export public types
pub use path::ensure_parent_exists;
pub use store::{read_table, write_table, CacheStore};
pub use table::{infer_column, Column, Scalar, Table};
