//! Table Module
//!
//! The in-memory value that gets cached: a row-indexed, column-oriented table
//! of scalars, plus the per-column type inference used when reading it back.

use std::fmt;

use crate::error::{CacheError, Result};

// == Scalar ==
/// A single cell (or index label) of a table.
#[derive(Debug, Clone)]
pub enum Scalar {
    /// Missing value, written as an empty field
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Scalar {
    /// Returns true for `Null` and for a `NaN` float.
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Lossy numeric view, used when an integer column has to be widened.
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }
}

// Missing values compare equal to each other, so a table holding NaN still
// equals its own reloaded copy.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_missing() && b.is_missing() => true,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    /// Textual form used in the CSV file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) if v.is_nan() => Ok(()),
            // Keep a fractional marker so integral floats re-infer as floats
            Scalar::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Scalar::Float(v) if v.is_finite() && v.abs() >= 1e16 => write!(f, "{:e}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

// == Column ==
/// A named, ordered sequence of scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// == Table ==
/// A two-dimensional labeled table.
///
/// Every column holds exactly as many values as the index has labels. The
/// constructors enforce this, so a `Table` is always rectangular.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: Option<String>,
    index: Vec<Scalar>,
    columns: Vec<Column>,
}

impl Table {
    // == Constructors ==
    /// Creates a table from an explicit index and columns.
    ///
    /// Fails if a column length differs from the index length or if two
    /// columns share a name.
    pub fn new(
        index_name: Option<String>,
        index: Vec<Scalar>,
        columns: Vec<Column>,
    ) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if column.values.len() != index.len() {
                return Err(CacheError::InvalidTable(format!(
                    "column '{}' has {} rows, index has {}",
                    column.name,
                    column.values.len(),
                    index.len()
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CacheError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self {
            index_name,
            index,
            columns,
        })
    }

    /// Creates a table with a default `0..n` index from named columns.
    pub fn from_columns<N>(columns: Vec<(N, Vec<Scalar>)>) -> Result<Self>
    where
        N: Into<String>,
    {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column::new(name, values))
            .collect();
        let rows = columns.first().map_or(0, |c| c.values.len());
        let index = (0..rows as i64).map(Scalar::Int).collect();
        Self::new(None, index, columns)
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            index_name: None,
            index: Vec::new(),
            columns: Vec::new(),
        }
    }

    // == Accessors ==
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn index(&self) -> &[Scalar] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

// == Type Inference ==
/// Infers a typed column from raw text fields.
///
/// Empty fields are missing. If every present field is an integer the column
/// is integral, unless it also has missing values, in which case it is widened
/// to floats with `NaN` holes. Otherwise floats, then booleans, then strings.
pub fn infer_column(raw: &[String]) -> Vec<Scalar> {
    let present: Vec<&str> = raw
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let has_missing = present.len() < raw.len();

    if !present.is_empty() && present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        let ints = raw.iter().map(|s| match s.trim().parse::<i64>() {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::Null,
        });
        if !has_missing {
            return ints.collect();
        }
        return ints
            .map(|v| Scalar::Float(v.as_f64().unwrap_or(f64::NAN)))
            .collect();
    }

    if !present.is_empty() && present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        return raw
            .iter()
            .map(|s| Scalar::Float(s.trim().parse::<f64>().unwrap_or(f64::NAN)))
            .collect();
    }

    if !present.is_empty() && present.iter().all(|s| parse_bool(s).is_some()) {
        return raw
            .iter()
            .map(|s| parse_bool(s).map_or(Scalar::Null, Scalar::Bool))
            .collect();
    }

    raw.iter()
        .map(|s| {
            if s.is_empty() {
                Scalar::Null
            } else {
                Scalar::Str(s.clone())
            }
        })
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}
