// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database configuration.
//!
//! A [`DatabaseConfig`] is built from a connection URL, either directly or
//! from the environment. The backend is inferred from the URL scheme:
//!
//! - `mysql://...` selects `MySQL`/`MariaDB`
//! - `postgres://...` or `postgresql://...` selects `PostgreSQL`
//! - anything else is a `SQLite` path or URI; `:memory:` selects a private
//!   in-memory database

use std::str::FromStr;
use std::time::Duration;

use crate::error::PersistenceError;

/// Environment variable holding the connection URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable overriding the pool size.
pub const MAX_CONNECTIONS_ENV: &str = "CMSDB_MAX_CONNECTIONS";

/// URL selecting a private in-memory `SQLite` database.
pub const IN_MEMORY_URL: &str = ":memory:";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The physical database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// `SQLite`, selected by any URL without a server scheme.
    Sqlite,
    /// `MySQL` or `MariaDB`, selected by `mysql://`.
    Mysql,
    /// `PostgreSQL`, selected by `postgres://` or `postgresql://`.
    Postgres,
}

impl BackendKind {
    /// Infers the backend from a connection URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("mysql://") {
            Self::Mysql
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Self::Postgres
        } else {
            Self::Sqlite
        }
    }

    /// Converts this backend to its display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(PersistenceError::InitializationError(format!(
                "Unknown database backend: {s}"
            ))),
        }
    }
}

/// Connection and pool settings for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL or `SQLite` path.
    pub url: String,
    /// Backend inferred from `url`.
    pub backend: BackendKind,
    /// Maximum number of pooled connections.
    ///
    /// In-memory `SQLite` databases always use a single connection.
    pub max_connections: u32,
    /// How long a checkout waits for a free connection.
    pub connection_timeout: Duration,
    /// How long `SQLite` waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Creates a configuration for `url` with default pool settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            backend: BackendKind::from_url(&url),
            url,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Creates a configuration for a private in-memory `SQLite` database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_URL)
    }

    /// Reads the configuration from the environment.
    ///
    /// `DATABASE_URL` is required; `CMSDB_MAX_CONNECTIONS` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset or the pool size is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, PersistenceError> {
        let url: String = std::env::var(DATABASE_URL_ENV).map_err(|_| {
            PersistenceError::InitializationError(format!("{DATABASE_URL_ENV} is not set"))
        })?;

        let mut config: Self = Self::new(url);
        if let Ok(value) = std::env::var(MAX_CONNECTIONS_ENV) {
            config.max_connections = parse_max_connections(&value)?;
        }
        Ok(config)
    }

    /// Sets the maximum pool size.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the pool checkout timeout.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the `SQLite` busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Returns true if this is an in-memory `SQLite` database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.backend == BackendKind::Sqlite
            && (self.url == IN_MEMORY_URL || self.url.contains("mode=memory"))
    }

    /// Returns the `SQLite` path with any `sqlite://` scheme removed.
    #[must_use]
    pub fn sqlite_path(&self) -> &str {
        self.url.strip_prefix("sqlite://").unwrap_or(&self.url)
    }
}

pub(crate) fn parse_max_connections(value: &str) -> Result<u32, PersistenceError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PersistenceError::InitializationError(format!(
            "{MAX_CONNECTIONS_ENV} must be a positive integer, got '{value}'"
        ))),
    }
}
