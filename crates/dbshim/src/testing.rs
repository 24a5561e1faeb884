//! In-process stub connection for unit tests.

use crate::connection::{ColumnInfo, Connection, QueryKind, QueryOutput, quote_ansi_identifier};
use crate::cursor::{Cursor, RowSet};
use crate::error::{DbError, DbResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Quotes like PostgreSQL with `standard_conforming_strings = on`, records
/// executed SQL and serves canned row sets to SELECTs.
#[derive(Default)]
pub(crate) struct StubConnection {
    name: String,
    prefix: String,
    connected: AtomicBool,
    pub connects: AtomicUsize,
    pub executed: Mutex<Vec<(QueryKind, String)>>,
    results: Mutex<VecDeque<RowSet>>,
}

impl StubConnection {
    pub fn new() -> Self {
        Self {
            name: "stub".to_string(),
            ..Self::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::new()
        }
    }

    /// Queue a row set for the next SELECT.
    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Option<&str>>>) {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect())
            .collect();
        self.results
            .lock()
            .unwrap()
            .push_back(RowSet::new(columns, rows));
    }

    pub fn last_sql(&self) -> Option<String> {
        self.executed.lock().unwrap().last().map(|(_, sql)| sql.clone())
    }
}

impl Connection for StubConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connect(&self) -> DbResult<()> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn disconnect(&self) -> bool {
        self.connected.store(false, Ordering::SeqCst);
        true
    }

    fn set_charset(&self, _charset: &str) -> DbResult<()> {
        self.connect()
    }

    fn execute(&self, kind: QueryKind, sql: &str) -> DbResult<QueryOutput> {
        self.connect()?;
        if sql.contains("syntax error") {
            return Err(DbError::query("syntax error at or near", sql));
        }
        let mut executed = self.executed.lock().unwrap();
        executed.push((kind, sql.to_string()));
        Ok(match kind {
            QueryKind::Select => {
                let set = self.results.lock().unwrap().pop_front().unwrap_or_default();
                QueryOutput::Rows(Cursor::new(Box::new(set)))
            }
            QueryKind::Insert => QueryOutput::Inserted {
                id: Some(executed.len() as i64),
                affected: 1,
            },
            _ => QueryOutput::Affected(1),
        })
    }

    fn escape(&self, value: &str) -> DbResult<String> {
        self.connect()?;
        if value.contains('\0') {
            return Err(DbError::validation("NUL in string literal"));
        }
        Ok(value.replace('\'', "''"))
    }

    fn list_tables(&self, _like: Option<&str>) -> DbResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_columns(&self, _table: &str) -> DbResult<Vec<ColumnInfo>> {
        Ok(Vec::new())
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi_identifier(name)
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }
}
