//! Shared WHERE/HAVING state for SELECT, UPDATE and DELETE.

use crate::condition::{Condition, Logic};
use crate::connection::Connection;
use crate::compile::compile_conditions;
use crate::error::DbResult;
use crate::ident::Ident;
use crate::value::Value;

/// Ordered condition list behind one WHERE or HAVING clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn push(&mut self, logic: Logic, column: Ident, op: &str, value: Value) {
        self.conditions.push(Condition::Predicate {
            logic,
            column,
            op: op.to_string(),
            value,
        });
    }

    pub fn open(&mut self, logic: Logic) {
        self.conditions.push(Condition::Open(logic));
    }

    pub fn close(&mut self) {
        self.conditions.push(Condition::Close);
    }

    /// ` KEYWORD conditions`, or nothing when empty.
    pub(crate) fn render(&self, conn: &dyn Connection, keyword: &str) -> DbResult<String> {
        if self.conditions.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" {keyword} {}", compile_conditions(conn, &self.conditions)?))
    }
}

/// WHERE-clause methods shared by the filtering builders.
///
/// `where_` is an alias of `and_where`; the logic keyword of the first entry
/// (and of any entry directly after an opening group) is never rendered.
pub trait Filter {
    /// The builder's WHERE state.
    fn where_clause(&mut self) -> &mut WhereClause;

    fn where_(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.and_where(column, op, value)
    }

    fn and_where(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_clause()
            .push(Logic::And, column.into(), op, value.into());
        self
    }

    fn or_where(
        &mut self,
        column: impl Into<Ident>,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_clause()
            .push(Logic::Or, column.into(), op, value.into());
        self
    }

    fn where_open(&mut self) -> &mut Self {
        self.and_where_open()
    }

    fn and_where_open(&mut self) -> &mut Self {
        self.where_clause().open(Logic::And);
        self
    }

    fn or_where_open(&mut self) -> &mut Self {
        self.where_clause().open(Logic::Or);
        self
    }

    fn where_close(&mut self) -> &mut Self {
        self.where_clause().close();
        self
    }

    fn and_where_close(&mut self) -> &mut Self {
        self.where_close()
    }

    fn or_where_close(&mut self) -> &mut Self {
        self.where_close()
    }
}
