// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! PostgreSQL-specific persistence utilities.
//!
//! Like `MySQL`, `PostgreSQL` is compiled by default and validated only by
//! opt-in tests (`cargo xtask test-postgres`). `migrations_postgres/` must
//! stay schema-equivalent to the other migration directories.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::Text;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::ConnectionPool;
use crate::config::DatabaseConfig;
use crate::error::PersistenceError;

/// `PostgreSQL`-specific migrations.
pub const POSTGRES_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations_postgres");

#[derive(QueryableByName)]
struct ReplicationRole {
    #[diesel(sql_type = Text)]
    role: String,
}

/// Builds a connection pool for a `PostgreSQL` database.
///
/// # Errors
///
/// Returns an error if the pool cannot open its connections.
pub fn build_pool(config: &DatabaseConfig) -> Result<ConnectionPool<PgConnection>, PersistenceError> {
    info!("Connecting to PostgreSQL database");
    Ok(Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connection_timeout)
        .build(ConnectionManager::<PgConnection>::new(&config.url))?)
}

/// Runs pending migrations on the provided `PostgreSQL` connection.
///
/// # Errors
///
/// Returns `MigrationFailed` if migration execution fails.
pub fn run_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    info!("Running PostgreSQL database migrations");
    let applied = conn
        .run_pending_migrations(POSTGRES_MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!("Applied {} PostgreSQL migration(s)", applied.len());
    Ok(())
}

/// Verifies that foreign key enforcement is enabled on `PostgreSQL`.
///
/// Foreign keys are enforced by system triggers, which do not fire when
/// `session_replication_role` is `replica`.
///
/// # Errors
///
/// Returns an error if verification fails.
pub fn verify_foreign_key_enforcement(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    // NOTE: raw SQL (Diesel has no setting query DSL)
    let setting: ReplicationRole =
        diesel::sql_query("SELECT current_setting('session_replication_role') AS role")
            .get_result(conn)
            .map_err(|e| {
                PersistenceError::QueryFailed(format!(
                    "Failed to verify foreign key enforcement: {e}"
                ))
            })?;

    if setting.role == "replica" {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    info!("PostgreSQL foreign key enforcement is enabled");
    Ok(())
}
