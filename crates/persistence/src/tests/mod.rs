// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod audited_tests;
mod backend_validation_tests;
mod entity_tests;

use std::path::PathBuf;

use cmsdb_audit::AuditContext;
use cmsdb_domain::{CanonicalId, NewRoute, NewUser, Role, Route};
use diesel::SqliteConnection;

use crate::{Database, DatabaseConfig, OperationContext, count_change_events, create_route};

/// Opens a fresh, isolated in-memory database.
pub fn create_test_db() -> Database<SqliteConnection> {
    Database::in_memory().expect("Failed to create in-memory database")
}

/// A `SQLite` database file in the temp directory, removed with its WAL
/// companions on drop.
pub struct TempDbFile(PathBuf);

impl TempDbFile {
    pub fn new() -> Self {
        Self(std::env::temp_dir().join(format!("cmsdb-{}.db", CanonicalId::generate())))
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.0.to_string_lossy().into_owned())
    }
}

impl Drop for TempDbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Opens a file-backed database with a real multi-connection pool.
///
/// Keep the returned file alive for as long as the database is used.
pub fn create_file_test_db(max_connections: u32) -> (Database<SqliteConnection>, TempDbFile) {
    let file = TempDbFile::new();
    let db = Database::open(&file.config().with_max_connections(max_connections))
        .expect("Failed to create file database");
    (db, file)
}

pub fn create_test_audit_context() -> AuditContext {
    AuditContext::new(
        CanonicalId::generate(),
        None,
        String::from("test-request"),
        String::from("127.0.0.1"),
    )
}

pub fn create_test_route_params(slug: &str) -> NewRoute {
    NewRoute {
        slug: slug.to_string(),
        title: format!("Title of {slug}"),
        status: 1,
        author_id: None,
    }
}

pub fn create_test_user_params(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        name: String::from("Test User"),
        email: format!("{username}@example.com"),
        role: Role::Editor,
        password: String::from("correct horse battery"),
    }
}

/// Creates a route through the audited path.
pub fn seed_route(db: &Database<SqliteConnection>, slug: &str) -> Route {
    create_route(
        db,
        &OperationContext::new(),
        &create_test_audit_context(),
        create_test_route_params(slug),
    )
    .expect("Failed to seed route")
}

pub fn event_count(db: &Database<SqliteConnection>) -> i64 {
    count_change_events(db).expect("Failed to count change events")
}
