//! Statement builders.
//!
//! Builders accumulate structured clauses and render them through a
//! [`Connection`] so identifiers and values are quoted for its dialect.
//! Mutators take `&mut self` and return `&mut Self`, so calls chain on a
//! `let mut` binding:
//!
//! ```ignore
//! use dbshim::{Filter, Statement, select};
//!
//! let mut q = select(["id", "name"]);
//! q.from("users")
//!     .where_("age", ">", 18)
//!     .order_by("name", Some("ASC"))
//!     .limit(10);
//!
//! let users = q.execute(&*conn)?.into_cursor()?;
//! ```
//!
//! Clauses append in call order; `limit`, `offset` and `table` overwrite.

pub mod delete;
pub mod insert;
pub mod join;
pub mod select;
pub mod update;
pub mod where_clause;

pub use delete::Delete;
pub use insert::Insert;
pub use join::JoinSpec;
pub use select::Select;
pub use update::Update;
pub use where_clause::{Filter, WhereClause};

use crate::connection::{Connection, QueryKind, QueryOutput};
use crate::error::DbResult;
use crate::ident::Ident;
use crate::query::RawQuery;
use crate::value::Value;

/// A statement that compiles to SQL text.
pub trait Statement {
    fn kind(&self) -> QueryKind;

    /// Render the statement for `conn`'s dialect.
    fn compile(&self, conn: &dyn Connection) -> DbResult<String>;

    /// Compile into a raw query, e.g. to bind `:name` placeholders left in
    /// expressions.
    fn to_query(&self, conn: &dyn Connection) -> DbResult<RawQuery> {
        Ok(RawQuery::new(self.kind(), self.compile(conn)?))
    }

    /// Compile and run on `conn`.
    fn execute(&self, conn: &dyn Connection) -> DbResult<QueryOutput> {
        let sql = self.compile(conn)?;
        conn.execute(self.kind(), &sql)
    }
}

/// Raw SQL usable as a column or a value; never quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr(pub String);

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(expr.0)
    }
}

impl From<Expr> for Ident {
    fn from(expr: Expr) -> Self {
        Ident::Expr(expr.0)
    }
}

/// A raw SQL expression.
pub fn expr(sql: impl Into<String>) -> Expr {
    Expr(sql.into())
}

/// `SELECT columns`.
pub fn select<I, C>(columns: I) -> Select
where
    I: IntoIterator<Item = C>,
    C: Into<Ident>,
{
    let mut q = Select::new();
    q.columns(columns);
    q
}

/// `SELECT *`.
pub fn select_all() -> Select {
    Select::new()
}

/// `INSERT INTO table`.
pub fn insert(table: impl Into<Ident>) -> Insert {
    Insert::new(table)
}

/// `UPDATE table`.
pub fn update(table: impl Into<Ident>) -> Update {
    Update::new(table)
}

/// `DELETE FROM table`.
pub fn delete(table: impl Into<Ident>) -> Delete {
    Delete::new(table)
}

#[cfg(test)]
mod tests;
