use super::Statement;
use crate::compile::compile_columns;
use crate::connection::{Connection, QueryKind};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::value::Value;

/// INSERT statement builder.
///
/// Columns are fixed by [`Insert::columns`] or by the first
/// [`Insert::values`] call; every row must match them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    table: Option<Ident>,
    columns: Vec<Ident>,
    rows: Vec<Vec<Value>>,
    /// Build error (reported at compile time)
    build_error: Option<String>,
}

impl Insert {
    pub fn new(table: impl Into<Ident>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Set the target table (overwrites).
    pub fn table(&mut self, table: impl Into<Ident>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Append target columns.
    pub fn columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Ident>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one row of values, in column order.
    pub fn row<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Append one row from ordered `column => value` pairs.
    ///
    /// The first call defines the columns when none were set; later calls
    /// must name the same columns in the same order.
    pub fn values<I, C, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<Ident>,
        V: Into<Value>,
    {
        let (columns, row): (Vec<Ident>, Vec<Value>) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        if self.columns.is_empty() {
            self.columns = columns;
        } else if self.columns != columns {
            self.fail("values() columns differ from the insert columns");
            return self;
        }
        self.rows.push(row);
        self
    }

    fn fail(&mut self, message: &str) {
        if self.build_error.is_none() {
            self.build_error = Some(message.to_string());
        }
    }
}

impl Statement for Insert {
    fn kind(&self) -> QueryKind {
        QueryKind::Insert
    }

    fn compile(&self, conn: &dyn Connection) -> DbResult<String> {
        if let Some(err) = &self.build_error {
            return Err(DbError::validation(err.clone()));
        }
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| DbError::validation("INSERT requires a table"))?;
        if self.columns.is_empty() {
            return Err(DbError::validation("INSERT requires at least one column"));
        }
        if self.rows.is_empty() {
            return Err(DbError::validation("INSERT requires at least one row"));
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(DbError::validation(format!(
                    "INSERT row {i} has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                )));
            }
            let values = row
                .iter()
                .map(|v| conn.quote(v))
                .collect::<DbResult<Vec<_>>>()?;
            rows.push(format!("({})", values.join(", ")));
        }

        Ok(format!(
            "INSERT INTO {} ({}) VALUES {}",
            conn.quote_table(table)?,
            compile_columns(conn, &self.columns)?,
            rows.join(", ")
        ))
    }
}
