//! PostgreSQL driver over `tokio-postgres`.
//!
//! The public surface is synchronous: each connection owns a current-thread
//! tokio runtime and blocks on the client futures. Statements go through the
//! simple-query protocol since values are already inlined as literals, and
//! result rows arrive as text.
//!
//! Do not call these methods from inside an async runtime; use a blocking
//! thread (`spawn_blocking`) instead.

use super::{ColumnInfo, Connection, QueryKind, QueryOutput, quote_ansi_identifier};
use crate::config::ConnectionConfig;
use crate::cursor::{Cursor, RowSet};
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// Maximum SQL length (bytes) written to log events.
const LOG_SQL_MAX: usize = 200;

/// How long `disconnect` waits for the server to acknowledge termination.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A live PostgreSQL link plus the runtime that drives it.
struct Link {
    runtime: Runtime,
    client: Client,
    driver: JoinHandle<Result<(), tokio_postgres::Error>>,
    /// Server `standard_conforming_strings` setting, read on connect.
    standard_strings: bool,
}

impl Link {
    fn simple_query(
        &self,
        sql: &str,
        timeout: Option<Duration>,
    ) -> DbResult<Vec<SimpleQueryMessage>> {
        let fut = self.client.simple_query(sql);
        let result = self.runtime.block_on(async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .map_err(|_| DbError::Timeout(limit)),
                None => Ok(fut.await),
            }
        })?;
        result.map_err(|e| DbError::from_pg_query(e, sql))
    }

    fn read_standard_strings(&self) -> DbResult<bool> {
        let set = collect_rows(self.simple_query("SHOW standard_conforming_strings", None)?).0;
        Ok(set
            .first_value()
            .is_none_or(|v| v.eq_ignore_ascii_case("on")))
    }

    fn last_insert_id(&self, name: &str) -> Option<i64> {
        match self.simple_query("SELECT lastval()", None) {
            Ok(messages) => collect_rows(messages)
                .0
                .first_value()
                .and_then(|v| v.parse().ok()),
            Err(err) => {
                tracing::debug!(connection = %name, error = %err, "no insert id available");
                None
            }
        }
    }
}

/// Settings moved out of the configuration group when the connection is built.
struct PgSettings {
    pg: tokio_postgres::Config,
    charset: Option<String>,
    table_prefix: String,
    query_timeout: Option<Duration>,
}

/// PostgreSQL implementation of [`Connection`].
///
/// Required configuration keys: `hostname`, `database`, `username`.
/// Optional: `password`, `port`, `connect_timeout` and `query_timeout`
/// (seconds).
pub struct PgConnection {
    name: String,
    settings: PgSettings,
    link: Mutex<Option<Link>>,
}

impl PgConnection {
    /// Configuration keys every PostgreSQL group must define.
    pub const REQUIRED_KEYS: &'static [&'static str] = &["hostname", "database", "username"];

    /// Build a (not yet connected) connection from a configuration group.
    ///
    /// The group is consumed: credentials move into the native client
    /// configuration and are not kept anywhere else.
    pub fn new(name: impl Into<String>, mut config: ConnectionConfig) -> DbResult<Self> {
        let name = name.into();
        config.require(&name, Self::REQUIRED_KEYS)?;

        let mut pg = tokio_postgres::Config::new();
        pg.application_name("dbshim");
        for key in Self::REQUIRED_KEYS {
            let value = &config.connection[*key];
            match *key {
                "hostname" => pg.host(value),
                "database" => pg.dbname(value),
                _ => pg.user(value),
            };
        }
        if let Some(port) = config.get_parsed::<u16>(&name, "port")? {
            pg.port(port);
        }
        if let Some(timeout) = config.get_seconds(&name, "connect_timeout")? {
            pg.connect_timeout(timeout);
        }
        let query_timeout = config.get_seconds(&name, "query_timeout")?;
        if let Some(password) = config.connection.remove("password") {
            pg.password(password);
        }
        if config.persistent {
            tracing::debug!(connection = %name, "persistent links are not supported, using a regular link");
        }

        Ok(Self {
            name,
            settings: PgSettings {
                pg,
                charset: config.character_set.take(),
                table_prefix: std::mem::take(&mut config.table_prefix),
                query_timeout,
            },
            link: Mutex::new(None),
        })
    }

    /// Factory used by the registry.
    pub fn create(name: &str, config: ConnectionConfig) -> DbResult<Arc<dyn Connection>> {
        Ok(Arc::new(Self::new(name, config)?))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> DbResult<Link> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::connection("58000", e.to_string()))?;
        let (client, connection) = runtime
            .block_on(self.settings.pg.connect(NoTls))
            .map_err(DbError::from_pg_connect)?;
        let driver = runtime.spawn(connection);

        let mut link = Link {
            runtime,
            client,
            driver,
            standard_strings: true,
        };
        if let Some(charset) = &self.settings.charset {
            apply_charset(&link, charset).map_err(into_connection_error)?;
        }
        link.standard_strings = link
            .read_standard_strings()
            .map_err(into_connection_error)?;

        tracing::info!(connection = %self.name, "connected");
        Ok(link)
    }

    /// Run `f` against an open link, connecting first if needed.
    fn with_link<T>(&self, f: impl FnOnce(&Link) -> DbResult<T>) -> DbResult<T> {
        let mut state = self.lock();
        let link = match state.take() {
            Some(link) if !link.client.is_closed() => link,
            _ => self.open()?,
        };
        f(state.insert(link))
    }

    fn fetch(&self, sql: &str) -> DbResult<Cursor> {
        self.execute(QueryKind::Select, sql)?.into_cursor()
    }
}

impl fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection for PgConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|link| !link.client.is_closed())
    }

    fn connect(&self) -> DbResult<()> {
        self.with_link(|_| Ok(()))
    }

    fn disconnect(&self) -> bool {
        let Some(link) = self.lock().take() else {
            return true;
        };
        let Link {
            runtime,
            client,
            driver,
            ..
        } = link;
        // Dropping the client lets the driver task send Terminate and finish.
        drop(client);
        let closed = runtime.block_on(async { tokio::time::timeout(CLOSE_TIMEOUT, driver).await });
        match closed {
            Ok(Ok(Ok(()))) => {
                tracing::info!(connection = %self.name, "disconnected");
                true
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!(connection = %self.name, error = %err, "error while closing connection");
                false
            }
            Ok(Err(err)) => {
                tracing::warn!(connection = %self.name, error = %err, "connection task failed");
                false
            }
            Err(_) => {
                tracing::warn!(connection = %self.name, "timed out closing connection");
                false
            }
        }
    }

    fn set_charset(&self, charset: &str) -> DbResult<()> {
        self.with_link(|link| apply_charset(link, charset))
    }

    fn execute(&self, kind: QueryKind, sql: &str) -> DbResult<QueryOutput> {
        tracing::debug!(
            target: "dbshim.sql",
            connection = %self.name,
            kind = kind.as_str(),
            sql = %truncate_sql(sql, LOG_SQL_MAX),
            "execute"
        );
        self.with_link(|link| {
            let (set, affected) = collect_rows(link.simple_query(sql, self.settings.query_timeout)?);
            Ok(match kind {
                QueryKind::Select => QueryOutput::Rows(Cursor::new(Box::new(set))),
                QueryKind::Insert => {
                    let id = match insert_id_source(set.first_value(), affected) {
                        InsertId::Returned(id) => id,
                        InsertId::LastVal => link.last_insert_id(&self.name),
                        InsertId::Unknown => None,
                    };
                    QueryOutput::Inserted { id, affected }
                }
                _ => QueryOutput::Affected(affected),
            })
        })
    }

    fn escape(&self, value: &str) -> DbResult<String> {
        if value.contains('\0') {
            return Err(DbError::validation(
                "PostgreSQL string literals cannot contain NUL",
            ));
        }
        let standard = self.with_link(|link| Ok(link.standard_strings))?;
        Ok(escape_literal(value, standard))
    }

    fn list_tables(&self, like: Option<&str>) -> DbResult<Vec<String>> {
        let mut sql = String::from(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = current_schema()",
        );
        if let Some(pattern) = like {
            let pattern = format!("{}{}", self.settings.table_prefix, pattern);
            sql.push_str(" AND table_name LIKE ");
            sql.push_str(&self.quote(&Value::Text(pattern))?);
        }
        sql.push_str(" ORDER BY table_name");

        let mut cursor = self.fetch(&sql)?;
        Ok(cursor.pluck("table_name")?.into_iter().flatten().collect())
    }

    fn list_columns(&self, table: &str) -> DbResult<Vec<ColumnInfo>> {
        let (schema, table) = match table.rsplit_once('.') {
            Some((schema, table)) => (self.quote(&Value::from(schema))?, table),
            None => ("current_schema()".to_string(), table),
        };
        let table = format!("{}{}", self.settings.table_prefix, table);
        let sql = format!(
            "SELECT column_name, data_type, is_nullable, column_default, ordinal_position \
             FROM information_schema.columns \
             WHERE table_schema = {schema} AND table_name = {} \
             ORDER BY ordinal_position",
            self.quote(&Value::Text(table))?
        );
        self.fetch(&sql)?.fetch_all_as()
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi_identifier(name)
    }

    fn table_prefix(&self) -> &str {
        &self.settings.table_prefix
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        if tokio::runtime::Handle::try_current().is_err() {
            self.disconnect();
            return;
        }
        // Inside another runtime neither `block_on` nor a blocking runtime drop is allowed.
        if let Some(link) = self.lock().take() {
            let Link { runtime, client, .. } = link;
            drop(client);
            runtime.shutdown_background();
            tracing::debug!(
                connection = %self.name,
                "dropped inside a runtime; closed without waiting"
            );
        }
    }
}

impl FromRow for ColumnInfo {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            name: row.require("column_name")?.to_string(),
            data_type: row.require("data_type")?.to_string(),
            is_nullable: row.require("is_nullable")? == "YES",
            default: row.get("column_default").map(str::to_string),
            ordinal: row.try_get("ordinal_position")?.unwrap_or_default(),
        })
    }
}

fn apply_charset(link: &Link, charset: &str) -> DbResult<()> {
    // tokio-postgres decodes every text value as UTF-8.
    let normalized = charset.replace(['-', '_'], "").to_ascii_lowercase();
    if normalized != "utf8" && normalized != "unicode" {
        return Err(DbError::connection(
            "22023",
            format!("unsupported character set '{charset}', only UTF-8 is available"),
        ));
    }
    link.simple_query("SET client_encoding TO 'UTF8'", None)?;
    Ok(())
}

fn into_connection_error(err: DbError) -> DbError {
    match err {
        DbError::Query { code, message, .. } => DbError::Connection {
            code: code.unwrap_or_else(|| "08000".to_string()),
            message,
        },
        other => other,
    }
}

/// Escape a string literal body.
///
/// Quotes are always doubled; backslashes only when the server does not
/// treat them literally (`standard_conforming_strings = off`).
pub fn escape_literal(value: &str, standard_strings: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' if !standard_strings => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

/// Where an INSERT's id comes from.
#[derive(Debug, PartialEq)]
enum InsertId {
    /// First value of a `RETURNING` row.
    Returned(Option<i64>),
    /// Ask `lastval()`.
    LastVal,
    Unknown,
}

/// `lastval()` is only consulted when exactly one row went in without a
/// `RETURNING` value; otherwise it could report an earlier insert's sequence.
fn insert_id_source(returned: Option<&str>, affected: u64) -> InsertId {
    match (returned, affected) {
        (Some(value), _) => InsertId::Returned(value.parse().ok()),
        (None, 1) => InsertId::LastVal,
        (None, _) => InsertId::Unknown,
    }
}

/// Gather rows and the last command's affected count from simple-query messages.
fn collect_rows(messages: Vec<SimpleQueryMessage>) -> (RowSet, u64) {
    let mut columns: Option<Arc<[String]>> = None;
    let mut rows = Vec::new();
    let mut affected = 0;
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(desc) => {
                columns = Some(desc.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_none() {
                    columns = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
            SimpleQueryMessage::CommandComplete(n) => affected = n,
            _ => {}
        }
    }
    let columns = columns.unwrap_or_else(|| Arc::from(Vec::new()));
    (RowSet::new(columns, rows), affected)
}

fn truncate_sql(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
