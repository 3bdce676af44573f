// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! MySQL/MariaDB-specific persistence utilities.
//!
//! `MySQL` support is compiled by default (no feature flags) but validated
//! only via explicit opt-in tests run by `cargo xtask test-mariadb`, which:
//!
//! 1. Starts a `MariaDB` container via Docker
//! 2. Sets required environment variables (`DATABASE_URL`, `CMSDB_TEST_BACKEND`)
//! 3. Runs ignored tests explicitly
//! 4. Stops and removes the container
//!
//! Compilation requires the `MySQL` client development libraries.
//!
//! ## Schema Parity
//!
//! `migrations_mysql/` must stay schema-equivalent to `migrations/` and
//! `migrations_postgres/`: same tables, same columns, same constraints and
//! same foreign keys. The only permitted differences are the integer widths
//! of counters and the change-log column types documented in
//! `diesel_schema`.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::BigInt;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::ConnectionPool;
use crate::config::DatabaseConfig;
use crate::error::PersistenceError;

/// `MySQL`-specific migrations.
pub const MYSQL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations_mysql");

/// Result type for foreign key check query.
#[derive(QueryableByName)]
struct ForeignKeyCheck {
    #[diesel(sql_type = BigInt)]
    fk_checks: i64,
}

/// Builds a connection pool for a `MySQL` database.
///
/// # Errors
///
/// Returns an error if the pool cannot open its connections.
pub fn build_pool(
    config: &DatabaseConfig,
) -> Result<ConnectionPool<MysqlConnection>, PersistenceError> {
    info!("Connecting to MySQL database");
    Ok(Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connection_timeout)
        .build(ConnectionManager::<MysqlConnection>::new(&config.url))?)
}

/// Runs pending migrations on the provided `MySQL` connection.
///
/// # Errors
///
/// Returns `MigrationFailed` if migration execution fails.
pub fn run_migrations(conn: &mut MysqlConnection) -> Result<(), PersistenceError> {
    info!("Running MySQL database migrations");
    let applied = conn
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!("Applied {} MySQL migration(s)", applied.len());
    Ok(())
}

/// Verifies that foreign key enforcement is enabled on `MySQL`.
///
/// `InnoDB` enforces foreign keys unless `foreign_key_checks` is switched
/// off for the session.
///
/// # Errors
///
/// Returns an error if verification fails.
pub fn verify_foreign_key_enforcement(conn: &mut MysqlConnection) -> Result<(), PersistenceError> {
    // NOTE: raw SQL (Diesel has no system variable query DSL)
    let check: ForeignKeyCheck =
        diesel::sql_query("SELECT CAST(@@foreign_key_checks AS SIGNED) AS fk_checks")
            .get_result(conn)
            .map_err(|e| {
                PersistenceError::QueryFailed(format!(
                    "Failed to verify foreign key enforcement: {e}"
                ))
            })?;

    if check.fk_checks != 1 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    info!("MySQL foreign key enforcement is enabled");
    Ok(())
}
