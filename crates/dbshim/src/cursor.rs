//! Read-only result cursor.
//!
//! A [`Cursor`] wraps a driver's native result set. The row count is fixed at
//! construction; reads fetch from the native result every time and never
//! cache. Position moves freely with [`Cursor::next`]/[`Cursor::prev`] and is
//! checked on read through [`Cursor::valid`].
//!
//! ```ignore
//! let mut users = select(["id", "name"]).from("users").execute(&*conn)?.into_cursor()?;
//! for row in &mut users {
//!     let row = row?;
//!     println!("{:?}", row.get("name"));
//! }
//! ```

use crate::error::{DbError, DbResult};
use crate::row::{FromRow, Row};
use std::fmt;
use std::sync::Arc;

/// A driver-native result set.
pub trait NativeResult: Send {
    /// Total number of rows.
    fn row_count(&self) -> usize;

    /// Fetch the row at `index` (`Ok(None)` past the end).
    fn fetch_row(&mut self, index: usize) -> DbResult<Option<Row>>;

    /// Release native resources. Called exactly once by the owning cursor.
    fn release(&mut self) {}
}

/// Rows materialized in memory, as returned by the simple-query protocol.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Arc<[String]>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// First column of the first row.
    pub fn first_value(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }
}

impl NativeResult for RowSet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn fetch_row(&mut self, index: usize) -> DbResult<Option<Row>> {
        Ok(self
            .rows
            .get(index)
            .map(|values| Row::new(self.columns.clone(), values.clone())))
    }

    fn release(&mut self) {
        self.rows = Vec::new();
    }
}

/// Read-only, seekable view over a query result.
pub struct Cursor {
    result: Option<Box<dyn NativeResult>>,
    total: usize,
    position: usize,
}

impl Cursor {
    /// Take ownership of a native result.
    pub fn new(result: Box<dyn NativeResult>) -> Self {
        let total = result.row_count();
        Self {
            result: Some(result),
            total,
            position: 0,
        }
    }

    /// Total number of rows.
    pub fn count(&self) -> usize {
        self.total
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the current position points at a row.
    pub fn valid(&self) -> bool {
        self.position < self.total
    }

    /// Move to `offset`. Returns `false` and leaves the position unchanged
    /// when `offset` is out of range.
    pub fn seek(&mut self, offset: usize) -> bool {
        if offset < self.total {
            self.position = offset;
            true
        } else {
            false
        }
    }

    /// Move back to the first row.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Advance one row, unchecked.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        // Wraps from the before-first position back to 0.
        self.position = self.position.wrapping_add(1);
    }

    /// Step back one row, unchecked. Stepping back from 0 leaves the cursor
    /// invalid until the next `next`/`seek`/`rewind`.
    pub fn prev(&mut self) {
        self.position = self.position.wrapping_sub(1);
    }

    /// Fetch the row at the current position.
    pub fn current(&mut self) -> DbResult<Option<Row>> {
        self.get(self.position)
    }

    /// Fetch the row at `index` without moving the cursor.
    pub fn get(&mut self, index: usize) -> DbResult<Option<Row>> {
        if index >= self.total {
            return Ok(None);
        }
        match self.result.as_mut() {
            Some(result) => result.fetch_row(index),
            None => Ok(None),
        }
    }

    /// Results are read-only.
    pub fn set(&mut self, _index: usize, _row: Row) -> DbResult<()> {
        Err(DbError::ReadOnlyResult)
    }

    /// Results are read-only.
    pub fn remove(&mut self, _index: usize) -> DbResult<()> {
        Err(DbError::ReadOnlyResult)
    }

    /// Iterate every row from the start. The cursor is rewound first, so the
    /// iterator can be created again to restart.
    pub fn rows(&mut self) -> Rows<'_> {
        self.rewind();
        Rows { cursor: self }
    }

    /// Collect all rows.
    pub fn fetch_all(&mut self) -> DbResult<Vec<Row>> {
        self.rows().collect()
    }

    /// Collect all rows mapped to `T`.
    pub fn fetch_all_as<T: FromRow>(&mut self) -> DbResult<Vec<T>> {
        self.rows()
            .map(|row| row.and_then(|row| T::from_row(&row)))
            .collect()
    }

    /// Collect one column from every row.
    pub fn pluck(&mut self, column: &str) -> DbResult<Vec<Option<String>>> {
        self.rows()
            .map(|row| row.map(|row| row.get(column).map(str::to_string)))
            .collect()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("total", &self.total)
            .field("position", &self.position)
            .field("released", &self.result.is_none())
            .finish()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Some(mut result) = self.result.take() {
            result.release();
        }
    }
}

/// Lazy iterator over a cursor's rows.
pub struct Rows<'a> {
    cursor: &'a mut Cursor,
}

impl Iterator for Rows<'_> {
    type Item = DbResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.valid() {
            return None;
        }
        let row = self.cursor.current();
        self.cursor.next();
        row.transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.cursor.count().saturating_sub(self.cursor.position());
        (0, Some(left))
    }
}

impl<'a> IntoIterator for &'a mut Cursor {
    type Item = DbResult<Row>;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}
