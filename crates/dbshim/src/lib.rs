//! # dbshim
//!
//! A small, synchronous relational-database layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Driver abstraction**: the [`Connection`] trait with connect, execute,
//!   escape and catalog listing; [`PgConnection`] implements it over
//!   `tokio-postgres`
//! - **Registry**: named, lazily created, shared connections ([`Registry`])
//! - **Builders**: SELECT/INSERT/UPDATE/DELETE accumulate structured clauses
//!   and compile to dialect-correct SQL
//! - **Raw queries**: hand-written SQL with `:name` parameters and deferred
//!   [`Binding`]s
//! - **Read-only cursors**: seekable result sets with lazy row iteration
//!
//! Values are inlined into the statement text through the connection's
//! quoting; there is no prepared-statement protocol.
//!
//! ## Example
//!
//! ```ignore
//! use dbshim::{Filter, Registry, Statement, insert, select};
//!
//! let registry = Registry::from_toml(CONFIG)?;
//! let conn = registry.default_instance()?;
//!
//! let mut q = insert("users");
//! q.values([("name", "O'Brien"), ("email", "ob@example.com")]);
//! let id = q.execute(&*conn)?.insert_id();
//!
//! let mut q = select(["id", "name"]);
//! q.from("users").where_("age", ">", 18).order_by("name", Some("ASC")).limit(10);
//! for row in &mut q.execute(&*conn)?.into_cursor()? {
//!     let row = row?;
//!     println!("{:?}", row.get("name"));
//! }
//! ```
//!
//! ## Logging
//!
//! Executed statements are emitted as `tracing` events with target
//! `dbshim.sql` at `DEBUG`; connects and disconnects at `INFO`.

pub mod builder;
pub mod compile;
pub mod condition;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod ident;
pub mod query;
pub mod registry;
pub mod row;
pub mod value;

#[cfg(test)]
mod testing;

pub use builder::{
    Delete, Expr, Filter, Insert, JoinSpec, Select, Statement, Update, WhereClause, delete, expr,
    insert, select, select_all, update,
};
pub use condition::{Condition, Logic};
pub use config::{ConnectionConfig, RegistryConfig};
pub use connection::{ColumnInfo, Connection, PgConnection, QueryKind, QueryOutput};
pub use cursor::{Cursor, NativeResult, RowSet, Rows};
pub use error::{DbError, DbResult};
pub use ident::{Ident, IdentPart};
pub use query::{Binding, RawQuery, query};
pub use registry::{DEFAULT_NAME, DriverFactory, Registry};
pub use row::{FromRow, Row};
pub use value::Value;
