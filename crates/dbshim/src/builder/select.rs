use super::join::JoinSpec;
use super::where_clause::{Filter, WhereClause};
use super::Statement;
use crate::compile::{compile_columns, compile_group_by, compile_join, compile_order_by};
use crate::condition::Logic;
use crate::connection::{Connection, QueryKind};
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::value::Value;

/// SELECT statement builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    /// Selected columns (empty renders `*`)
    columns: Vec<Ident>,
    distinct: bool,
    /// FROM tables
    from: Vec<Ident>,
    joins: Vec<JoinSpec>,
    where_clause: WhereClause,
    group_by: Vec<Ident>,
    having: WhereClause,
    order_by: Vec<(Ident, Option<String>)>,
    limit: Option<u64>,
    offset: Option<u64>,
    /// Build error (reported at compile time)
    build_error: Option<String>,
}

impl Select {
    /// An empty SELECT (`SELECT *`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append selected columns.
    pub fn columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Ident>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one column with an alias.
    pub fn select_as(&mut self, column: &str, alias: &str) -> &mut Self {
        self.columns.push(Ident::aliased(column, alias));
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Append a FROM table.
    pub fn from(&mut self, table: impl Into<Ident>) -> &mut Self {
        self.from.push(table.into());
        self
    }

    /// Add a join. `kind` is the join type (`LEFT`, `INNER`, ...).
    pub fn join(&mut self, table: impl Into<Ident>, kind: Option<&str>) -> &mut Self {
        self.joins.push(JoinSpec::new(table, kind));
        self
    }

    /// Add an ON pair to the most recently added join.
    pub fn on(&mut self, left: impl Into<Ident>, right: impl Into<Ident>) -> &mut Self {
        match self.joins.last_mut() {
            Some(join) => {
                join.on(left, right);
            }
            None => self.fail("on() called before join()"),
        }
        self
    }

    /// Set the USING columns of the most recently added join.
    pub fn using<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Ident>,
    {
        match self.joins.last_mut() {
            Some(join) => {
                join.using(columns);
            }
            None => self.fail("using() called before join()"),
        }
        self
    }

    /// Append GROUP BY columns.
    pub fn group_by<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Ident>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    // ==================== HAVING ====================

    pub fn having(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.and_having(column, op, value)
    }

    pub fn and_having(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having.push(Logic::And, column.into(), op, value.into());
        self
    }

    pub fn or_having(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having.push(Logic::Or, column.into(), op, value.into());
        self
    }

    pub fn having_open(&mut self) -> &mut Self {
        self.and_having_open()
    }

    pub fn and_having_open(&mut self) -> &mut Self {
        self.having.open(Logic::And);
        self
    }

    pub fn or_having_open(&mut self) -> &mut Self {
        self.having.open(Logic::Or);
        self
    }

    pub fn having_close(&mut self) -> &mut Self {
        self.having.close();
        self
    }

    pub fn and_having_close(&mut self) -> &mut Self {
        self.having_close()
    }

    pub fn or_having_close(&mut self) -> &mut Self {
        self.having_close()
    }

    // ==================== Ordering and pagination ====================

    /// Append an ORDER BY column with an optional direction.
    pub fn order_by(&mut self, column: impl Into<Ident>, direction: Option<&str>) -> &mut Self {
        self.order_by
            .push((column.into(), direction.map(str::to_string)));
        self
    }

    /// Set LIMIT (overwrites).
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET (overwrites).
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    fn fail(&mut self, message: &str) {
        if self.build_error.is_none() {
            self.build_error = Some(message.to_string());
        }
    }
}

impl Filter for Select {
    fn where_clause(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}

impl Statement for Select {
    fn kind(&self) -> QueryKind {
        QueryKind::Select
    }

    fn compile(&self, conn: &dyn Connection) -> DbResult<String> {
        if let Some(err) = &self.build_error {
            return Err(DbError::validation(err.clone()));
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&compile_columns(conn, &self.columns)?);
        }

        if !self.from.is_empty() {
            let tables = self
                .from
                .iter()
                .map(|t| conn.quote_table(t))
                .collect::<DbResult<Vec<_>>>()?;
            sql.push_str(" FROM ");
            sql.push_str(&tables.join(", "));
        }
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&compile_join(conn, &self.joins)?);
        }

        sql.push_str(&self.where_clause.render(conn, "WHERE")?);

        if !self.group_by.is_empty() {
            sql.push(' ');
            sql.push_str(&compile_group_by(conn, &self.group_by)?);
        }

        sql.push_str(&self.having.render(conn, "HAVING")?);

        if !self.order_by.is_empty() {
            sql.push(' ');
            sql.push_str(&compile_order_by(conn, &self.order_by)?);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }
}
