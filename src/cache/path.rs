//! Path Resolver Module
//!
//! Makes sure the directory a cache file lives in exists before it is written.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CacheError, Result};

// == Ensure Parent Exists ==
/// Creates the parent directory of `path`, including missing intermediates.
///
/// A bare file name has no parent and is written to the current directory, so
/// nothing is done. An already existing directory is not an error.
pub fn ensure_parent_exists(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    if parent.is_dir() {
        return Ok(());
    }

    debug!(dir = %parent.display(), "creating cache directory");
    fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))
}
