// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates what cannot be expressed in backend-agnostic Diesel
//! DSL:
//!
//! - connection pool construction and per-connection settings
//! - migration execution
//! - foreign key enforcement checks
//! - the default change-event recorder for the backend
//! - how a write transaction begins
//!
//! ## Backend Support
//!
//! - `sqlite`: `SQLite` backend (default for development and testing)
//! - `mysql`: MySQL/MariaDB backend (validated via opt-in tests)
//! - `postgres`: `PostgreSQL` backend (validated via opt-in tests)

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use diesel::QueryResult;
use diesel::connection::{Connection, TransactionManager};
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection, R2D2Connection};
use diesel::{MysqlConnection, PgConnection, SqliteConnection};

use crate::config::{BackendKind, DatabaseConfig};
use crate::entities::{
    ChangeEventStore, ContentStore, DatatypeStore, FieldStore, MediaStore, RouteStore, UserStore,
};
use crate::error::PersistenceError;
use crate::recorder::{ChangeRecorder, MysqlRecorder, PostgresRecorder, SqliteRecorder};

/// A pool of connections to one backend.
pub type ConnectionPool<C> = Pool<ConnectionManager<C>>;

/// A connection checked out of a [`ConnectionPool`].
pub type PooledConn<C> = PooledConnection<ConnectionManager<C>>;

/// A connection type the audited framework can run on.
///
/// Implemented for `SqliteConnection`, `MysqlConnection` and `PgConnection`.
/// The entity store supertraits give every backend the same typed
/// operations; this trait adds the pieces that differ per backend.
pub trait AuditBackend:
    R2D2Connection
    + Send
    + 'static
    + UserStore
    + RouteStore
    + DatatypeStore
    + FieldStore
    + ContentStore
    + MediaStore
    + ChangeEventStore
{
    /// The backend this connection type talks to.
    const KIND: BackendKind;

    /// Returns the change-event recorder for this backend.
    fn default_recorder() -> Arc<dyn ChangeRecorder<Self>>;

    /// Builds a connection pool for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot open its initial connections.
    fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool<Self>, PersistenceError>;

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `MigrationFailed` if a migration cannot be applied.
    fn run_migrations(&mut self) -> Result<(), PersistenceError>;

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;

    /// Begins a transaction that is going to write.
    ///
    /// Defaults to the connection's ordinary `BEGIN` (or savepoint when
    /// nested).
    ///
    /// # Errors
    ///
    /// Returns the driver error if the transaction cannot start.
    fn begin_write_transaction(&mut self) -> QueryResult<()> {
        <<Self as Connection>::TransactionManager as TransactionManager<Self>>::begin_transaction(
            self,
        )
    }
}

impl AuditBackend for SqliteConnection {
    const KIND: BackendKind = BackendKind::Sqlite;

    fn default_recorder() -> Arc<dyn ChangeRecorder<Self>> {
        Arc::new(SqliteRecorder)
    }

    fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool<Self>, PersistenceError> {
        sqlite::build_pool(config)
    }

    fn run_migrations(&mut self) -> Result<(), PersistenceError> {
        sqlite::run_migrations(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(self)
    }

    fn begin_write_transaction(&mut self) -> QueryResult<()> {
        sqlite::begin_immediate(self)
    }
}

impl AuditBackend for MysqlConnection {
    const KIND: BackendKind = BackendKind::Mysql;

    fn default_recorder() -> Arc<dyn ChangeRecorder<Self>> {
        Arc::new(MysqlRecorder)
    }

    fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool<Self>, PersistenceError> {
        mysql::build_pool(config)
    }

    fn run_migrations(&mut self) -> Result<(), PersistenceError> {
        mysql::run_migrations(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        mysql::verify_foreign_key_enforcement(self)
    }
}

impl AuditBackend for PgConnection {
    const KIND: BackendKind = BackendKind::Postgres;

    fn default_recorder() -> Arc<dyn ChangeRecorder<Self>> {
        Arc::new(PostgresRecorder)
    }

    fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool<Self>, PersistenceError> {
        postgres::build_pool(config)
    }

    fn run_migrations(&mut self) -> Result<(), PersistenceError> {
        postgres::run_migrations(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        postgres::verify_foreign_key_enforcement(self)
    }
}

/// A connection pool bound to the change-event recorder for its backend.
///
/// Cloning is cheap; clones share the pool and the recorder.
pub struct Database<C: AuditBackend> {
    pool: ConnectionPool<C>,
    recorder: Arc<dyn ChangeRecorder<C>>,
}

impl<C: AuditBackend> Clone for Database<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            recorder: Arc::clone(&self.recorder),
        }
    }
}

impl<C: AuditBackend> std::fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &C::KIND)
            .field("pool", &self.pool.state())
            .finish_non_exhaustive()
    }
}

impl<C: AuditBackend> Database<C> {
    /// Opens a database, applies migrations and verifies foreign keys.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` selects a different backend, or if the
    /// pool, migrations or foreign key check fail.
    pub fn open(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        if config.backend != C::KIND {
            return Err(PersistenceError::InitializationError(format!(
                "Configuration selects {} but a {} database was requested",
                config.backend,
                C::KIND
            )));
        }

        let db: Self = Self::from_pool(C::build_pool(config)?);
        db.migrate()?;
        db.verify_foreign_key_enforcement()?;
        Ok(db)
    }

    /// Wraps an existing pool without running migrations.
    #[must_use]
    pub fn from_pool(pool: ConnectionPool<C>) -> Self {
        Self {
            pool,
            recorder: C::default_recorder(),
        }
    }

    /// Replaces the change-event recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn ChangeRecorder<C>>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &ConnectionPool<C> {
        &self.pool
    }

    /// Returns the change-event recorder.
    #[must_use]
    pub fn recorder(&self) -> &dyn ChangeRecorder<C> {
        self.recorder.as_ref()
    }

    /// Returns the backend of this database.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        C::KIND
    }

    /// Checks a connection out of the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError` if no connection becomes available in time.
    pub fn connection(&self) -> Result<PooledConn<C>, PersistenceError> {
        Ok(self.pool.get()?)
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained or a migration fails.
    pub fn migrate(&self) -> Result<(), PersistenceError> {
        self.connection()?.run_migrations()
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&self) -> Result<(), PersistenceError> {
        self.connection()?.verify_foreign_key_enforcement()
    }
}

impl Database<SqliteConnection> {
    /// Opens a fresh, private in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::open(&DatabaseConfig::in_memory())
    }
}
