//! Driver abstraction over a live database connection.
//!
//! A [`Connection`] owns one native link and knows how to quote values and
//! identifiers for its backend. Builders only ever talk to the trait, so a
//! new backend is one more implementation of it.

pub mod postgres;

use crate::cursor::Cursor;
use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IdentPart, parse_path};
use crate::value::Value;

pub use postgres::PgConnection;

/// The kind of statement being executed.
///
/// Decides what [`Connection::execute`] hands back: a cursor for `Select`, the
/// inserted row id for `Insert`, an affected-row count otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
}

impl QueryKind {
    /// Detect the statement kind from its leading keyword.
    ///
    /// Leading whitespace, comments and parentheses are skipped. `WITH` and
    /// `SHOW`/`EXPLAIN` are treated as `Select` since they return rows.
    pub fn from_sql(sql: &str) -> Option<Self> {
        let trimmed = strip_sql_prefix(sql);
        let keyword: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" | "SHOW" | "EXPLAIN" | "VALUES" => Some(QueryKind::Select),
            "INSERT" => Some(QueryKind::Insert),
            "UPDATE" => Some(QueryKind::Update),
            "DELETE" => Some(QueryKind::Delete),
            "CREATE" => Some(QueryKind::Create),
            "ALTER" => Some(QueryKind::Alter),
            "DROP" => Some(QueryKind::Drop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
            QueryKind::Create => "CREATE",
            QueryKind::Alter => "ALTER",
            QueryKind::Drop => "DROP",
        }
    }
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => {
                    s = &s[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => {
                    s = &s[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

/// What a statement produced.
#[derive(Debug)]
pub enum QueryOutput {
    /// Rows from a SELECT.
    Rows(Cursor),
    /// Result of an INSERT.
    ///
    /// `id` is driver-defined when the statement did not insert exactly one row.
    Inserted { id: Option<i64>, affected: u64 },
    /// Affected-row count of any other statement.
    Affected(u64),
}

impl QueryOutput {
    /// Take the cursor of a SELECT result.
    pub fn into_cursor(self) -> DbResult<Cursor> {
        match self {
            QueryOutput::Rows(cursor) => Ok(cursor),
            other => Err(DbError::validation(format!(
                "Expected a row set, got {other:?}"
            ))),
        }
    }

    /// The inserted row id, if this is an INSERT result that has one.
    pub fn insert_id(&self) -> Option<i64> {
        match self {
            QueryOutput::Inserted { id, .. } => *id,
            _ => None,
        }
    }

    /// Affected rows (row count for SELECT results).
    pub fn affected_rows(&self) -> u64 {
        match self {
            QueryOutput::Rows(cursor) => cursor.count() as u64,
            QueryOutput::Inserted { affected, .. } => *affected,
            QueryOutput::Affected(n) => *n,
        }
    }
}

/// Column metadata returned by [`Connection::list_columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub ordinal: u32,
}

/// A live link to one database server.
///
/// Implementations guard their native handle internally; the methods take
/// `&self` so a connection can be shared through the registry, but calls are
/// serialized per connection.
pub trait Connection: Send + Sync {
    /// The configuration name this connection was created from.
    fn name(&self) -> &str;

    /// Whether a native link is currently open.
    fn is_connected(&self) -> bool;

    /// Open the native link. No-op when already connected.
    fn connect(&self) -> DbResult<()>;

    /// Release the native link. Idempotent; returns whether the connection is
    /// now closed and never fails.
    fn disconnect(&self) -> bool;

    /// Set the client character set.
    fn set_charset(&self, charset: &str) -> DbResult<()>;

    /// Run `sql`, connecting first if needed.
    fn execute(&self, kind: QueryKind, sql: &str) -> DbResult<QueryOutput>;

    /// Escape a string for use inside a string literal (without the quotes).
    fn escape(&self, value: &str) -> DbResult<String>;

    /// List tables, optionally filtered with a LIKE pattern.
    fn list_tables(&self, like: Option<&str>) -> DbResult<Vec<String>>;

    /// List the columns of a table.
    fn list_columns(&self, table: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Quote a single identifier part.
    fn quote_identifier(&self, name: &str) -> String;

    /// Prefix applied to quoted table names.
    fn table_prefix(&self) -> &str {
        ""
    }

    /// Render a value as a SQL literal.
    ///
    /// Never use this for identifiers; see [`Connection::quote_column`].
    fn quote(&self, value: &Value) -> DbResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(true) => Ok("TRUE".to_string()),
            Value::Bool(false) => Ok("FALSE".to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) if f.is_finite() => Ok(f.to_string()),
            Value::Float(f) => {
                let text = if f.is_nan() {
                    "NaN"
                } else if f.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                Ok(format!("'{text}'"))
            }
            Value::Text(s) if Value::is_digit_text(s) => Ok(s.clone()),
            Value::Text(s) => Ok(format!("'{}'", self.escape(s)?)),
            Value::List(items) if items.is_empty() => Ok("NULL".to_string()),
            Value::List(items) => {
                let quoted = items
                    .iter()
                    .map(|item| self.quote(item))
                    .collect::<DbResult<Vec<_>>>()?;
                Ok(quoted.join(", "))
            }
            Value::Expr(sql) => Ok(sql.clone()),
        }
    }

    /// Quote a column reference (`table.column`, `*`, `t.*`, aliases).
    ///
    /// The table part of a qualified column gets the table prefix.
    fn quote_column(&self, ident: &Ident) -> DbResult<String> {
        match ident {
            Ident::Expr(sql) => Ok(sql.clone()),
            Ident::Name { name, alias } => {
                let parts = parse_path(name)?;
                let table_idx = parts.len().checked_sub(2);
                let mut out = render_path(self, &parts, table_idx);
                push_alias(self, &mut out, alias.as_deref());
                Ok(out)
            }
        }
    }

    /// Quote a table reference, applying the table prefix.
    fn quote_table(&self, ident: &Ident) -> DbResult<String> {
        match ident {
            Ident::Expr(sql) => Ok(sql.clone()),
            Ident::Name { name, alias } => {
                let parts = parse_path(name)?;
                if parts.contains(&IdentPart::Star) {
                    return Err(DbError::validation(format!(
                        "'*' is not a valid table name: '{name}'"
                    )));
                }
                let mut out = render_path(self, &parts, Some(parts.len() - 1));
                push_alias(self, &mut out, alias.as_deref());
                Ok(out)
            }
        }
    }
}

fn render_path<C: Connection + ?Sized>(
    conn: &C,
    parts: &[IdentPart],
    prefixed: Option<usize>,
) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match part {
            IdentPart::Star => out.push('*'),
            _ if prefixed == Some(i) && !conn.table_prefix().is_empty() => {
                let name = format!("{}{}", conn.table_prefix(), part.name());
                out.push_str(&conn.quote_identifier(&name));
            }
            _ => out.push_str(&conn.quote_identifier(part.name())),
        }
    }
    out
}

fn push_alias<C: Connection + ?Sized>(conn: &C, out: &mut String, alias: Option<&str>) {
    if let Some(alias) = alias {
        out.push_str(" AS ");
        out.push_str(&conn.quote_identifier(alias));
    }
}

/// ANSI identifier quoting: wrap in `"` and double embedded quotes.
pub fn quote_ansi_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
