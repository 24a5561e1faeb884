//! Raw SQL with named `:name` parameters.
//!
//! Values are inlined through the connection's quoting when the query is
//! compiled, so the statement that reaches the server is plain text.
//!
//! ```ignore
//! use dbshim::{Binding, QueryKind, RawQuery};
//!
//! let min_age = Binding::new(18);
//! let query = RawQuery::new(QueryKind::Select, "SELECT * FROM users WHERE age > :age")
//!     .bind("age", &min_age);
//!
//! min_age.set(21); // observed by the next execute
//! let users = query.fetch_all(&*conn)?;
//! ```

use crate::connection::{Connection, QueryKind, QueryOutput};
use crate::cursor::Cursor;
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared value cell for deferred binding.
///
/// A query holds a handle to the cell rather than a copy of the value, so
/// [`Binding::set`] calls made after [`RawQuery::bind`] are visible the next
/// time the query is compiled.
#[derive(Debug, Clone, Default)]
pub struct Binding(Arc<RwLock<Value>>);

impl Binding {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Replace the bound value.
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> Value {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Debug, Clone)]
enum Param {
    Value(Value),
    Bound(Binding),
}

impl Param {
    fn current(&self) -> Value {
        match self {
            Param::Value(v) => v.clone(),
            Param::Bound(b) => b.get(),
        }
    }
}

/// A hand-written statement plus its named parameters.
#[derive(Debug, Clone)]
pub struct RawQuery {
    kind: QueryKind,
    sql: String,
    params: HashMap<String, Param>,
}

/// Create a raw query of the given kind.
pub fn query(kind: QueryKind, sql: impl Into<String>) -> RawQuery {
    RawQuery::new(kind, sql)
}

impl RawQuery {
    pub fn new(kind: QueryKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: HashMap::new(),
        }
    }

    /// Create a query whose kind is detected from its leading keyword.
    pub fn detect(sql: impl Into<String>) -> DbResult<Self> {
        let sql = sql.into();
        let kind = QueryKind::from_sql(&sql).ok_or_else(|| {
            DbError::validation("Cannot detect statement kind; use RawQuery::new")
        })?;
        Ok(Self::new(kind, sql))
    }

    /// Bind a value by copy. `name` may include the leading `:`.
    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params
            .insert(param_key(name), Param::Value(value.into()));
        self
    }

    /// Bind a shared cell; its value is read at compile time.
    pub fn bind(mut self, name: &str, binding: &Binding) -> Self {
        self.params
            .insert(param_key(name), Param::Bound(binding.clone()));
        self
    }

    /// Bind several values at once.
    pub fn parameters<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in params {
            self.params
                .insert(param_key(name.as_ref()), Param::Value(value.into()));
        }
        self
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The SQL template, placeholders unreplaced.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Render the statement with every placeholder replaced by its quoted value.
    pub fn compile(&self, conn: &dyn Connection) -> DbResult<String> {
        let mut out = String::with_capacity(self.sql.len());
        let mut copied = 0;
        for span in scan_placeholders(&self.sql) {
            let param = self
                .params
                .get(span.name)
                .ok_or_else(|| DbError::UnboundParameter(span.name.to_string()))?;
            out.push_str(&self.sql[copied..span.start]);
            out.push_str(&conn.quote(&param.current())?);
            copied = span.end;
        }
        out.push_str(&self.sql[copied..]);
        Ok(out)
    }

    /// Compile and run the statement.
    pub fn execute(&self, conn: &dyn Connection) -> DbResult<QueryOutput> {
        let sql = self.compile(conn)?;
        conn.execute(self.kind, &sql)
    }

    /// Execute and return the result cursor.
    pub fn cursor(&self, conn: &dyn Connection) -> DbResult<Cursor> {
        self.execute(conn)?.into_cursor()
    }

    /// Execute and collect every row.
    pub fn fetch_all(&self, conn: &dyn Connection) -> DbResult<Vec<Row>> {
        self.cursor(conn)?.fetch_all()
    }

    /// Execute and map every row to `T`.
    pub fn fetch_all_as<T: FromRow>(&self, conn: &dyn Connection) -> DbResult<Vec<T>> {
        self.cursor(conn)?.fetch_all_as()
    }

    /// Execute and return the first row, if any.
    pub fn fetch_opt(&self, conn: &dyn Connection) -> DbResult<Option<Row>> {
        self.cursor(conn)?.get(0)
    }
}

fn param_key(name: &str) -> String {
    name.strip_prefix(':').unwrap_or(name).to_string()
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

/// Find `:name` tokens outside literals, dollar-quoted bodies, quoted
/// identifiers, comments, `::` casts and array slices.
fn scan_placeholders(sql: &str) -> Vec<Placeholder<'_>> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                let escapes = i > 0 && matches!(bytes[i - 1], b'E' | b'e') && !is_word(bytes, i - 1);
                i = skip_quoted(bytes, i, b'\'', escapes);
            }
            b'"' => i = skip_quoted(bytes, i, b'"', false),
            b'$' if !is_word(bytes, i) => match dollar_tag(sql, i) {
                Some(tag) => {
                    let body = i + tag.len();
                    i = sql[body..].find(tag).map_or(bytes.len(), |n| body + n + tag.len());
                }
                None => i += 1,
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if !is_word(bytes, i) && i > 0 && matches!(bytes[i - 1], b'[' | b']') => i += 1,
            b':' if !is_word(bytes, i)
                && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
            {
                let start = i;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                found.push(Placeholder {
                    start,
                    end: i,
                    name: &sql[start + 1..i],
                });
            }
            _ => i += 1,
        }
    }
    found
}

/// Whether the byte before `idx` is part of an identifier or number.
fn is_word(bytes: &[u8], idx: usize) -> bool {
    idx > 0 && (bytes[idx - 1].is_ascii_alphanumeric() || matches!(bytes[idx - 1], b'_' | b'$'))
}

/// The `$tag$` opening a dollar-quoted string at `open`, if any. Positional
/// parameters such as `$1` are not tags.
fn dollar_tag(sql: &str, open: usize) -> Option<&str> {
    let bytes = sql.as_bytes();
    let mut i = open + 1;
    if bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    (bytes.get(i) == Some(&b'$')).then(|| &sql[open..=i])
}

/// Index just past the quoted run opening at `open`. A doubled quote
/// character is an escaped quote.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8, backslash_escapes: bool) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if backslash_escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}
