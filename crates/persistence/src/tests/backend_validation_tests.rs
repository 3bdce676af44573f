// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend validation tests for `MariaDB`/`MySQL` and `PostgreSQL`.
//!
//! The standard suite runs against `SQLite`. These tests check that the
//! same audited paths, constraints and width rules hold on the server
//! backends.
//!
//! ## Test Execution
//!
//! - Every test here is marked `#[ignore]`
//! - `cargo xtask test-mariadb` and `cargo xtask test-postgres` provision a
//!   container, set `DATABASE_URL` and `CMSDB_TEST_BACKEND`, and run them
//!
//! Tests fail fast if the required infrastructure is missing. Runs share
//! one database, so every test uses fresh slugs and identifiers.

use std::env;

use cmsdb_audit::Operation;
use cmsdb_domain::{CanonicalId, NewContentNode, NewDatatype, RouteUpdate};
use diesel::prelude::*;
use diesel::{MysqlConnection, PgConnection};

use super::{create_test_audit_context, create_test_route_params};
use crate::{
    AuditBackend, BackendKind, CONTENT_DATA, Database, DatabaseConfig, OperationContext,
    Persistence, PersistenceError, ROUTES, create_content, create_datatype, create_route,
    delete_route, get_route, get_route_by_slug, list_change_events_for_record, update_route,
};

const BACKEND_ENV: &str = "CMSDB_TEST_BACKEND";

/// Returns the connection URL after checking the test environment.
///
/// # Panics
///
/// Panics if `CMSDB_TEST_BACKEND` is not `expected` or `DATABASE_URL` is unset.
fn test_database_url(expected: &str, xtask: &str) -> String {
    let backend = env::var(BACKEND_ENV)
        .unwrap_or_else(|_| panic!("{BACKEND_ENV} not set - run via `cargo xtask {xtask}`"));
    assert_eq!(backend, expected, "{BACKEND_ENV} must be '{expected}'");

    env::var("DATABASE_URL")
        .unwrap_or_else(|_| panic!("DATABASE_URL not set - run via `cargo xtask {xtask}`"))
}

fn open_mariadb() -> Database<MysqlConnection> {
    let url = test_database_url("mariadb", "test-mariadb");
    Database::open(&DatabaseConfig::new(url)).expect("Failed to open MariaDB database")
}

fn open_postgres() -> Database<PgConnection> {
    let url = test_database_url("postgres", "test-postgres");
    Database::open(&DatabaseConfig::new(url)).expect("Failed to open PostgreSQL database")
}

fn unique_slug(prefix: &str) -> String {
    format!("{prefix}-{}", CanonicalId::generate().as_str().to_lowercase())
}

fn check_audited_lifecycle<C: AuditBackend>(db: &Database<C>) {
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let slug = unique_slug("lifecycle");

    let route = create_route(db, &ctx, &audit, create_test_route_params(&slug)).unwrap();
    assert_eq!(get_route(db, &route.id).unwrap(), route);

    update_route(
        db,
        &ctx,
        &audit,
        RouteUpdate {
            id: route.id.clone(),
            slug: slug.clone(),
            title: String::from("Updated"),
            status: i64::from(i32::MAX),
            author_id: None,
        },
    )
    .unwrap();
    assert_eq!(get_route(db, &route.id).unwrap().status, i64::from(i32::MAX));

    delete_route(db, &ctx, &audit, &route.id).unwrap();

    let events = list_change_events_for_record(db, ROUTES, &route.id).unwrap();
    let operations: Vec<Operation> = events.iter().map(|e| e.operation).collect();
    assert_eq!(
        operations,
        vec![Operation::Create, Operation::Update, Operation::Delete]
    );
    assert!(events.iter().all(|e| e.audit == audit));
    // Timestamps survive the backend round trip with microsecond precision.
    assert_eq!(
        events[0].after.as_ref().unwrap().data["created_at"],
        serde_json::to_value(route.created_at).unwrap()
    );
}

fn check_narrowing_is_rejected<C: AuditBackend>(db: &Database<C>) {
    let slug = unique_slug("overflow");
    let mut params = create_test_route_params(&slug);
    params.status = i64::from(i32::MAX) + 1;

    let result = create_route(
        db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    );

    assert!(matches!(result, Err(PersistenceError::ValueOutOfRange(_))));
    assert!(matches!(
        get_route_by_slug(db, &slug),
        Err(PersistenceError::NotFound(_))
    ));
}

fn check_foreign_keys<C: AuditBackend>(db: &Database<C>) {
    db.verify_foreign_key_enforcement().unwrap();

    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let datatype = create_datatype(
        db,
        &ctx,
        &audit,
        NewDatatype {
            parent_id: None,
            label: String::from("Page"),
            kind: String::from("page"),
            author_id: None,
        },
    )
    .unwrap();

    let result = create_content(
        db,
        &ctx,
        &audit,
        NewContentNode {
            route_id: CanonicalId::generate(),
            datatype_id: datatype.id,
            parent_id: None,
            first_child_id: None,
            next_sibling_id: None,
            prev_sibling_id: None,
            status: 0,
            author_id: None,
        },
    );
    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
}

/// Builds a raw change-log insert whose `record_id` is too short.
fn short_record_id_insert(created_at: &str) -> String {
    let event_id = CanonicalId::generate();
    format!(
        "INSERT INTO change_events \
         (event_id, table_name, operation, record_id, node_id, request_id, ip, created_at) \
         VALUES ('{event_id}', '{CONTENT_DATA}', 'CREATE', 'short', '{event_id}', 'req', \
         '127.0.0.1', '{created_at}')"
    )
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_opens_and_migrates() {
    let url = test_database_url("mariadb", "test-mariadb");
    let persistence = Persistence::open(&DatabaseConfig::new(url)).unwrap();
    assert_eq!(persistence.backend(), BackendKind::Mysql);

    // Reapplying migrations is a no-op.
    persistence.migrate().unwrap();
    persistence.table_counts().unwrap();
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_audited_lifecycle() {
    check_audited_lifecycle(&open_mariadb());
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_rejects_i32_overflow() {
    check_narrowing_is_rejected(&open_mariadb());
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_enforces_foreign_keys() {
    check_foreign_keys(&open_mariadb());
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_change_log_check_constraint() {
    let db = open_mariadb();
    let mut conn = db.connection().unwrap();

    let result = diesel::sql_query(short_record_id_insert("2026-01-01 00:00:00"))
        .execute(&mut *conn);
    assert!(result.is_err(), "change log accepted a short record_id");
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_opens_and_migrates() {
    let url = test_database_url("postgres", "test-postgres");
    let persistence = Persistence::open(&DatabaseConfig::new(url)).unwrap();
    assert_eq!(persistence.backend(), BackendKind::Postgres);

    persistence.migrate().unwrap();
    persistence.table_counts().unwrap();
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_audited_lifecycle() {
    check_audited_lifecycle(&open_postgres());
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_rejects_i32_overflow() {
    check_narrowing_is_rejected(&open_postgres());
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_enforces_foreign_keys() {
    check_foreign_keys(&open_postgres());
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_change_log_check_constraint() {
    let db = open_postgres();
    let mut conn = db.connection().unwrap();

    let result = diesel::sql_query(short_record_id_insert("2026-01-01 00:00:00+00"))
        .execute(&mut *conn);
    assert!(result.is_err(), "change log accepted a short record_id");
}
