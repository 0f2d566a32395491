//! Cache Store Module
//!
//! Reads and writes a single cached table as delimited text. The first column
//! of the file is the row index and the first row is the header.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::cache::path::ensure_parent_exists;
use crate::cache::table::{infer_column, Column, Table};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Filesystem-backed store for cached tables.
///
/// A path that exists is a hit, whatever it contains. The store keeps no
/// state of its own; the filesystem owns every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStore;

impl CacheStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self
    }

    // == Exists ==
    /// Returns true if anything exists at `path`.
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    // == Load ==
    /// Parses the table stored at `path`.
    pub fn load(&self, path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
        let table = read_table(file, path)?;
        debug!(
            path = %path.display(),
            rows = table.n_rows(),
            columns = table.n_columns(),
            "loaded table"
        );
        Ok(table)
    }

    // == Save ==
    /// Writes `table` to `path`, replacing any existing file.
    ///
    /// Missing parent directories are created first. The table is written to
    /// a sibling temporary file and renamed into place, so a failed write
    /// never leaves a truncated file that would later count as a hit.
    ///
    /// A replaced file keeps its permissions. A new file gets the same mode a
    /// plain create would (`0o666` less the umask on unix).
    pub fn save(&self, path: &Path, table: &Table) -> Result<()> {
        ensure_parent_exists(path)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let tmp = builder.tempfile_in(dir).map_err(|e| CacheError::io(dir, e))?;

        write_table(tmp.as_file(), table).map_err(|e| with_path(e, path))?;
        if let Some(permissions) = existing {
            fs::set_permissions(tmp.path(), permissions).map_err(|e| CacheError::io(path, e))?;
        }
        tmp.persist(path).map_err(|e| CacheError::io(path, e.error))?;
        debug!(
            path = %path.display(),
            rows = table.n_rows(),
            columns = table.n_columns(),
            "saved table"
        );
        Ok(())
    }
}

// == Reading ==
/// Parses a table from CSV text.
///
/// `source` only names the origin in error messages.
pub fn read_table<R: Read>(reader: R, source: &Path) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = csv_reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| CacheError::parse(source, e.to_string()))?,
        None => return Err(CacheError::parse(source, "file is empty")),
    };
    let width = header.len();
    if width == 0 {
        return Err(CacheError::parse(source, "header has no fields"));
    }

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); width];
    for (row, record) in records.enumerate() {
        let record = record.map_err(|e| CacheError::parse(source, e.to_string()))?;
        if record.len() != width {
            return Err(CacheError::parse(
                source,
                format!(
                    "row {} has {} fields, header has {}",
                    row + 1,
                    record.len(),
                    width
                ),
            ));
        }
        for (raw, field) in raw_columns.iter_mut().zip(record.iter()) {
            raw.push(field.to_string());
        }
    }

    let index_name = header
        .get(0)
        .filter(|label| !label.is_empty())
        .map(str::to_string);

    let mut raw_columns = raw_columns.into_iter();
    let index = infer_column(&raw_columns.next().unwrap_or_default());
    let columns = unique_names(header.iter().skip(1))
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| Column::new(name, infer_column(&raw)))
        .collect();

    Table::new(index_name, index, columns)
        .map_err(|e| CacheError::parse(source, e.to_string()))
}

/// Renames repeated column labels `A, A` to `A, A.1`, skipping suffixes that
/// are already taken.
fn unique_names<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let labels: Vec<&str> = labels.collect();
    let mut taken: HashSet<String> = labels.iter().map(|l| l.to_string()).collect();
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(labels.len());

    for label in labels {
        if seen.insert(label) {
            names.push(label.to_string());
            continue;
        }
        let mut n = 1;
        while taken.contains(&format!("{}.{}", label, n)) {
            n += 1;
        }
        let renamed = format!("{}.{}", label, n);
        taken.insert(renamed.clone());
        names.push(renamed);
    }

    names
}

// == Writing ==
/// Serializes a table as CSV: header row first, index value first in each row.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.n_columns() + 1);
    header.push(table.index_name().unwrap_or_default());
    header.extend(table.column_names());
    csv_writer.write_record(&header)?;

    for (i, label) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(table.n_columns() + 1);
        record.push(label.to_string());
        record.extend(table.columns().iter().map(|c| c.values[i].to_string()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Turns low-level I/O failures from the CSV writer into path-carrying errors.
fn with_path(err: CacheError, path: &Path) -> CacheError {
    match err {
        CacheError::Csv(e) if e.is_io_error() => CacheError::io(path, e.into()),
        other => other,
    }
}
