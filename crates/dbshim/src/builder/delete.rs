use super::Statement;
use super::where_clause::{Filter, WhereClause};
use crate::connection::{Connection, QueryKind};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;

/// DELETE statement builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delete {
    table: Option<Ident>,
    where_clause: WhereClause,
}

impl Delete {
    pub fn new(table: impl Into<Ident>) -> Self {
        Self {
            table: Some(table.into()),
            where_clause: WhereClause::new(),
        }
    }

    /// Set the target table (overwrites).
    pub fn table(&mut self, table: impl Into<Ident>) -> &mut Self {
        self.table = Some(table.into());
        self
    }
}

impl Filter for Delete {
    fn where_clause(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}

impl Statement for Delete {
    fn kind(&self) -> QueryKind {
        QueryKind::Delete
    }

    fn compile(&self, conn: &dyn Connection) -> DbResult<String> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| DbError::validation("DELETE requires a table"))?;
        let mut sql = format!("DELETE FROM {}", conn.quote_table(table)?);
        sql.push_str(&self.where_clause.render(conn, "WHERE")?);
        Ok(sql)
    }
}
