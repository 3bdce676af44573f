// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! SQLite-specific backend utilities.
//!
//! This module is limited to:
//! - Connection pool construction
//! - Per-connection configuration (PRAGMA statements)
//! - Migration execution
//! - Beginning write transactions
//!
//! Every pooled connection enables `foreign_keys` and sets `busy_timeout`
//! when it is opened. File databases use WAL. In-memory databases use a
//! single-connection pool whose connection is never retired, so the database
//! lives exactly as long as the pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use diesel::connection::{AnsiTransactionManager, SimpleConnection, TransactionManager};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_types::Integer;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::ConnectionPool;
use crate::config::{DatabaseConfig, IN_MEMORY_URL};
use crate::error::PersistenceError;

/// SQLite-specific migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Counter for unique in-memory database names.
///
/// Each private in-memory database gets its own name so that pools opened
/// in the same process never share state.
static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Helper row struct for PRAGMA queries.
#[derive(QueryableByName)]
struct PragmaRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Applies per-connection PRAGMAs when the pool opens a connection.
#[derive(Debug, Clone, Copy)]
struct SqliteCustomizer {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // NOTE: PRAGMA is raw SQL (Diesel has no PRAGMA DSL)
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Returns a URI naming a fresh shared-cache in-memory database.
fn unique_memory_url() -> String {
    let db_id: u64 = MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("file:cmsdb_memdb_{db_id}?mode=memory&cache=shared")
}

/// Builds a connection pool for a `SQLite` database.
///
/// # Errors
///
/// Returns an error if the pool cannot open its connections or WAL mode
/// cannot be enabled.
pub fn build_pool(
    config: &DatabaseConfig,
) -> Result<ConnectionPool<SqliteConnection>, PersistenceError> {
    let customizer: SqliteCustomizer = SqliteCustomizer {
        busy_timeout: config.busy_timeout,
    };

    if config.is_in_memory() {
        let url: String = if config.url == IN_MEMORY_URL {
            unique_memory_url()
        } else {
            config.url.clone()
        };
        info!("Opening in-memory SQLite database: {}", url);

        return Ok(Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(config.connection_timeout)
            .connection_customizer(Box::new(customizer))
            .build(ConnectionManager::<SqliteConnection>::new(url))?);
    }

    let path: &str = config.sqlite_path();
    info!("Opening SQLite database at: {}", path);

    let pool: ConnectionPool<SqliteConnection> = Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connection_timeout)
        .connection_customizer(Box::new(customizer))
        .build(ConnectionManager::<SqliteConnection>::new(path))?;

    enable_wal_mode(&mut *pool.get()?)?;
    Ok(pool)
}

/// Verifies that foreign key enforcement is enabled.
///
/// # Errors
///
/// Returns an error if foreign key enforcement is not enabled.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    // NOTE: PRAGMA is raw SQL (Diesel has no PRAGMA DSL)
    let foreign_keys_enabled: i32 = diesel::sql_query("PRAGMA foreign_keys")
        .get_result::<PragmaRow>(conn)?
        .foreign_keys;

    if foreign_keys_enabled == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    info!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Runs pending migrations on the provided connection.
///
/// # Errors
///
/// Returns `MigrationFailed` if migration execution fails.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    info!("Running SQLite database migrations");
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!("Applied {} SQLite migration(s)", applied.len());
    Ok(())
}

/// Begins a transaction holding the write lock.
///
/// At the outermost level this issues `BEGIN IMMEDIATE`, which waits out
/// `busy_timeout` for other writers instead of failing later when a read
/// would have to be upgraded. Nested calls open a savepoint as usual.
///
/// # Errors
///
/// Returns the driver error if the lock cannot be taken in time.
pub fn begin_immediate(conn: &mut SqliteConnection) -> QueryResult<()> {
    let depth = AnsiTransactionManager::transaction_manager_status_mut(conn).transaction_depth()?;
    if depth.is_some() {
        return AnsiTransactionManager::begin_transaction(conn);
    }
    AnsiTransactionManager::begin_transaction_sql(conn, "BEGIN IMMEDIATE")
}

/// Enables WAL mode for a file-based `SQLite` database.
///
/// # Errors
///
/// Returns an error if the PRAGMA statement fails.
pub fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    // NOTE: PRAGMA is raw SQL (Diesel has no PRAGMA DSL)
    diesel::sql_query("PRAGMA journal_mode = WAL")
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}
