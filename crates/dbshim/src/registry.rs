//! Named connection registry.
//!
//! The registry maps configuration names to shared connections. The first
//! [`Registry::instance`] call for a name builds the connection through the
//! driver named by the group's `type`; every later call returns the same
//! `Arc`. The configuration group moves into the connection when it is
//! built, so credentials are not kept in the registry afterwards.
//!
//! ```ignore
//! let registry = Registry::from_toml(&std::fs::read_to_string("database.toml")?)?;
//! let conn = registry.instance("default")?;
//! ```

use crate::config::{ConnectionConfig, RegistryConfig};
use crate::connection::{Connection, PgConnection};
use crate::error::{DbError, DbResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Name used by [`Registry::default_instance`].
pub const DEFAULT_NAME: &str = "default";

/// Builds a connection from its name and configuration group.
pub type DriverFactory =
    Arc<dyn Fn(&str, ConnectionConfig) -> DbResult<Arc<dyn Connection>> + Send + Sync>;

struct State {
    configs: BTreeMap<String, ConnectionConfig>,
    drivers: HashMap<String, DriverFactory>,
    instances: HashMap<String, Arc<dyn Connection>>,
}

/// Connection registry. Share it by reference or behind an `Arc`.
pub struct Registry {
    state: Mutex<State>,
}

impl Registry {
    /// Create a registry over the given configuration groups, with the
    /// PostgreSQL driver registered as `postgresql`, `postgres` and `pgsql`.
    pub fn new(config: RegistryConfig) -> Self {
        let mut drivers: HashMap<String, DriverFactory> = HashMap::new();
        let pg: DriverFactory = Arc::new(PgConnection::create);
        for alias in ["postgresql", "postgres", "pgsql"] {
            drivers.insert(alias.to_string(), pg.clone());
        }
        Self {
            state: Mutex::new(State {
                configs: config.groups,
                drivers,
                instances: HashMap::new(),
            }),
        }
    }

    /// Create a registry from a TOML document of configuration groups.
    pub fn from_toml(source: &str) -> DbResult<Self> {
        Ok(Self::new(RegistryConfig::from_toml(source)?))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a driver under a `type` name (case-insensitive).
    pub fn register_driver<F>(&self, driver: &str, factory: F)
    where
        F: Fn(&str, ConnectionConfig) -> DbResult<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        self.lock()
            .drivers
            .insert(driver.to_ascii_lowercase(), Arc::new(factory));
    }

    /// Add or replace a configuration group. An existing instance of the
    /// same name is kept until [`Registry::clear`].
    pub fn configure(&self, name: &str, config: ConnectionConfig) {
        self.lock().configs.insert(name.to_string(), config);
    }

    /// The shared connection for `name`, built on first use.
    pub fn instance(&self, name: &str) -> DbResult<Arc<dyn Connection>> {
        let mut state = self.lock();
        if let Some(conn) = state.instances.get(name) {
            return Ok(conn.clone());
        }

        let config = state.configs.get(name).ok_or_else(|| {
            DbError::configuration(format!("Connection '{name}' is not configured"))
        })?;
        let driver = config.driver_name(name)?.to_ascii_lowercase();
        let factory = state.drivers.get(&driver).cloned().ok_or_else(|| {
            DbError::configuration(format!(
                "Unknown database type '{driver}' in '{name}' configuration"
            ))
        })?;

        let config = state.configs.remove(name).unwrap_or_default();
        let conn = match factory(name, config.clone()) {
            Ok(conn) => conn,
            Err(err) => {
                state.configs.insert(name.to_string(), config);
                return Err(err);
            }
        };
        state.instances.insert(name.to_string(), conn.clone());
        debug!(target: "dbshim.sql", connection = name, driver = %driver, "connection created");
        Ok(conn)
    }

    /// The connection named [`DEFAULT_NAME`].
    pub fn default_instance(&self) -> DbResult<Arc<dyn Connection>> {
        self.instance(DEFAULT_NAME)
    }

    /// Whether `name` has a live instance or a pending configuration.
    pub fn contains(&self, name: &str) -> bool {
        let state = self.lock();
        state.instances.contains_key(name) || state.configs.contains_key(name)
    }

    /// Disconnect every instance. Instances stay registered and reconnect
    /// on next use. Returns whether all of them reported closed.
    pub fn disconnect_all(&self) -> bool {
        let instances: Vec<Arc<dyn Connection>> =
            self.lock().instances.values().cloned().collect();
        instances.iter().fold(true, |ok, conn| conn.disconnect() && ok)
    }

    /// Disconnect and drop every instance.
    pub fn clear(&self) {
        let instances: Vec<(String, Arc<dyn Connection>)> =
            self.lock().instances.drain().collect();
        for (name, conn) in instances {
            conn.disconnect();
            debug!(target: "dbshim.sql", connection = %name, "connection released");
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let mut drivers: Vec<&String> = state.drivers.keys().collect();
        drivers.sort();
        let mut instances: Vec<&String> = state.instances.keys().collect();
        instances.sort();
        f.debug_struct("Registry")
            .field("configured", &state.configs.keys().collect::<Vec<_>>())
            .field("drivers", &drivers)
            .field("instances", &instances)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubConnection;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn stub_registry(builds: Arc<AtomicUsize>) -> Registry {
        let registry = Registry::default();
        registry.configure("default", ConnectionConfig::new("stub"));
        registry.configure("other", ConnectionConfig::new("STUB"));
        registry.register_driver("stub", move |name, _config| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubConnection::named(name)) as Arc<dyn Connection>)
        });
        registry
    }

    #[test]
    fn same_name_returns_same_instance() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = stub_registry(builds.clone());

        let a = registry.default_instance().unwrap();
        let b = registry.instance("default").unwrap();
        let other = registry.instance("other").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(a.name(), "default");
        assert_eq!(other.name(), "other");
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(stub_registry(builds.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.instance("default").unwrap())
            })
            .collect();
        let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(conns.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn config_moves_into_the_connection() {
        let registry = stub_registry(Arc::new(AtomicUsize::new(0)));
        assert!(registry.contains("default"));
        registry.instance("default").unwrap();
        assert!(registry.contains("default"));

        registry.clear();
        assert!(!registry.contains("default"));
        let err = registry
            .instance("default")
            .err()
            .expect("cleared registry has no groups");
        assert!(err.is_configuration());
    }

    #[test]
    fn disconnect_all_keeps_instances() {
        let registry = stub_registry(Arc::new(AtomicUsize::new(0)));
        let conn = registry.instance("default").unwrap();
        conn.connect().unwrap();
        assert!(registry.disconnect_all());
        assert!(!conn.is_connected());
        assert!(Arc::ptr_eq(&conn, &registry.instance("default").unwrap()));
    }

    #[test]
    fn configuration_errors() {
        let registry = Registry::from_toml(
            r#"
            [untyped]
            [unknown]
            type = "oracle"
            [incomplete]
            type = "PostgreSQL"
            [incomplete.connection]
            hostname = "localhost"
            "#,
        )
        .unwrap();

        for name in ["missing", "untyped", "unknown", "incomplete"] {
            let err = registry.instance(name).err().expect("instance should fail");
            assert!(err.is_configuration(), "{name}: {err}");
        }
        // a failed build keeps the group for a later retry
        assert!(registry.contains("incomplete"));
    }

    #[test]
    fn postgres_driver_is_registered_without_connecting() {
        let registry = Registry::from_toml(
            r#"
            [default]
            type = "pgsql"
            table_prefix = "app_"
            [default.connection]
            hostname = "127.0.0.1"
            database = "app"
            username = "app"
            password = "secret"
            "#,
        )
        .unwrap();
        let conn = registry.default_instance().unwrap();
        assert!(!conn.is_connected());
        assert_eq!(conn.table_prefix(), "app_");
        assert!(!format!("{registry:?}").contains("secret"));
    }
}
