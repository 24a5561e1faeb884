//! Result rows and row mapping.

use crate::error::{DbError, DbResult};
use std::str::FromStr;
use std::sync::Arc;

/// One result row: column names shared across the result set, values as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Column names, in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of a column by name. `None` for SQL NULL or an unknown column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.index_of(column).and_then(|i| self.get_idx(i))
    }

    /// Value of a column by position.
    pub fn get_idx(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Value of a column that must exist and be non-NULL.
    pub fn require(&self, column: &str) -> DbResult<&str> {
        let index = self
            .index_of(column)
            .ok_or_else(|| DbError::decode(column, "no such column"))?;
        self.get_idx(index)
            .ok_or_else(|| DbError::decode(column, "unexpected NULL"))
    }

    /// Parse a column value. `Ok(None)` for SQL NULL.
    pub fn try_get<T>(&self, column: &str) -> DbResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if self.index_of(column).is_none() {
            return Err(DbError::decode(column, "no such column"));
        }
        self.get(column)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| DbError::decode(column, format!("'{raw}': {e}")))
            })
            .transpose()
    }

    /// Iterate `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(|v| v.as_deref()))
    }
}

/// Map a result row to a Rust value.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> DbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(row.clone())
    }
}
