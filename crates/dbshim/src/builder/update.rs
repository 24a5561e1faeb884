use super::Statement;
use super::where_clause::{Filter, WhereClause};
use crate::compile::compile_set;
use crate::connection::{Connection, QueryKind};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::value::Value;

/// UPDATE statement builder. Compiling without any SET column fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    table: Option<Ident>,
    /// SET clauses (column, value)
    set: Vec<(Ident, Value)>,
    where_clause: WhereClause,
}

impl Update {
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

    /// Append `column = value` pairs.
    pub fn set<I, C, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<Ident>,
        V: Into<Value>,
    {
        self.set
            .extend(pairs.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Append a single `column = value` pair.
    pub fn value(&mut self, column: impl Into<Ident>, value: impl Into<Value>) -> &mut Self {
        self.set.push((column.into(), value.into()));
        self
    }
}

impl Filter for Update {
    fn where_clause(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}

impl Statement for Update {
    fn kind(&self) -> QueryKind {
        QueryKind::Update
    }

    fn compile(&self, conn: &dyn Connection) -> DbResult<String> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| DbError::validation("UPDATE requires a table"))?;
        if self.set.is_empty() {
            return Err(DbError::validation("UPDATE requires at least one SET column"));
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            conn.quote_table(table)?,
            compile_set(conn, &self.set)?
        );
        sql.push_str(&self.where_clause.render(conn, "WHERE")?);
        Ok(sql)
    }
}
