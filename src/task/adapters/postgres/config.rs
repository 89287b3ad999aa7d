//! Connection pool configuration for the `PostgreSQL` task adapter.

use diesel::ConnectionError as EstablishError;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::Connection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PoolError};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Environment variable holding the connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding [`PoolConfig::max_size`].
pub const POOL_MAX_SIZE_ENV: &str = "TASKSTORE_POOL_MAX_SIZE";
/// Environment variable overriding [`PoolConfig::connection_timeout`], in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "TASKSTORE_CONNECT_TIMEOUT_SECS";
/// Environment variable setting [`PoolConfig::statement_timeout`], in milliseconds.
pub const STATEMENT_TIMEOUT_ENV: &str = "TASKSTORE_STATEMENT_TIMEOUT_MS";

/// Errors raised while building the connection pool.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A configuration value is missing or malformed.
    #[error("invalid database configuration: {0}")]
    Config(String),

    /// The server refused or could not be reached by the initial connection.
    #[error("failed to connect to database: {0}")]
    Connect(#[from] EstablishError),

    /// The pool could not be constructed.
    #[error("failed to establish connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Settings for the task repository connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// libpq-style connection string or `postgres://` URL.
    pub database_url: String,
    /// Maximum pooled connections (default: 10).
    pub max_size: u32,
    /// Time to wait for a connection before failing (default: 30s).
    pub connection_timeout: Duration,
    /// Server-side `statement_timeout` applied to every pooled connection.
    pub statement_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Default maximum pool size.
    pub const DEFAULT_MAX_SIZE: u32 = 10;
    /// Default connection checkout timeout.
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: Self::DEFAULT_MAX_SIZE,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            statement_timeout: None,
        }
    }

    /// Sets the maximum pool size.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the connection checkout timeout.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Bounds every statement with a server-side timeout.
    #[must_use]
    pub const fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Config`] when `DATABASE_URL` is unset or an
    /// optional variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConnectionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, keyed by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Config`] when the connection string is
    /// missing or an optional value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConnectionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConnectionError::Config(format!("{DATABASE_URL_ENV} is not set")))?;

        let mut config = Self::new(database_url);
        if let Some(max_size) = parse_var::<u32>(&lookup, POOL_MAX_SIZE_ENV)? {
            config.max_size = max_size;
        }
        if let Some(seconds) = parse_var::<u64>(&lookup, CONNECT_TIMEOUT_ENV)? {
            config.connection_timeout = Duration::from_secs(seconds);
        }
        if let Some(millis) = parse_var::<u64>(&lookup, STATEMENT_TIMEOUT_ENV)? {
            config.statement_timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Builds a connection pool from this configuration.
    ///
    /// A single connection is established up front, so unreachable hosts and
    /// bad credentials fail here without retrying.
    /// The pool itself opens connections lazily.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Config`] for invalid settings and
    /// [`ConnectionError::Connect`] when the initial connection fails.
    pub fn build_pool(&self) -> Result<TaskPgPool, ConnectionError> {
        if self.max_size == 0 {
            return Err(ConnectionError::Config(
                "pool size must be at least 1".to_owned(),
            ));
        }

        PgConnection::establish(&self.database_url)?;

        let manager = ConnectionManager::<PgConnection>::new(self.database_url.as_str());
        let pool = Pool::builder()
            .max_size(self.max_size)
            .min_idle(Some(0))
            .connection_timeout(self.connection_timeout)
            .connection_customizer(Box::new(SessionCustomizer {
                statement_timeout: self.statement_timeout,
            }))
            .build(manager)?;
        Ok(pool)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConnectionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| ConnectionError::Config(format!("{key}={raw:?}: {err}")))
        })
        .transpose()
}

/// Session settings applied to each new pooled connection.
#[derive(Debug)]
struct SessionCustomizer {
    statement_timeout: Option<Duration>,
}

impl CustomizeConnection<PgConnection, r2d2::Error> for SessionCustomizer {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        if let Some(timeout) = self.statement_timeout {
            conn.batch_execute(&format!(
                "SET statement_timeout = {}",
                timeout.as_millis()
            ))
            .map_err(r2d2::Error::QueryError)?;
        }
        Ok(())
    }
}
