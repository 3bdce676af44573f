// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audited command tests.
//!
//! Every test checks atomicity by counting rows and change events before and
//! after the operation.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use cmsdb_audit::{AuditContext, ChangeEvent, Operation, StateSnapshot};
use cmsdb_domain::{CanonicalId, Route, RouteUpdate};
use diesel::SqliteConnection;
use diesel::connection::{Connection, TransactionManager};

use super::{
    create_file_test_db, create_test_audit_context, create_test_db, create_test_route_params,
    event_count, seed_route,
};
use crate::audited::{self, CreateCommand, UpdateCommand};
use crate::{
    ChangeRecorder, ConnectionPool, Database, OperationContext, PersistenceError, ROUTES,
    RouteStore, SqliteRecorder, count_routes, create_route, delete_route, get_route,
    list_change_events_for_record, update_route,
};

/// A recorder that always fails.
struct FailingRecorder;

impl ChangeRecorder<SqliteConnection> for FailingRecorder {
    fn record(
        &self,
        _conn: &mut SqliteConnection,
        _event: &ChangeEvent,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::DatabaseError(String::from(
            "recorder unavailable",
        )))
    }
}

/// A recorder that notes the transaction depth it was called at.
#[derive(Default)]
struct DepthRecorder {
    depth: AtomicU32,
}

impl ChangeRecorder<SqliteConnection> for DepthRecorder {
    fn record(
        &self,
        conn: &mut SqliteConnection,
        event: &ChangeEvent,
    ) -> Result<(), PersistenceError> {
        let depth: Option<NonZeroU32> =
            <<SqliteConnection as Connection>::TransactionManager as TransactionManager<
                SqliteConnection,
            >>::transaction_manager_status_mut(conn)
            .transaction_depth()?;
        self.depth
            .store(depth.map_or(0, NonZeroU32::get), Ordering::SeqCst);
        SqliteRecorder.record(conn, event)
    }
}

/// An update whose mutation step fails after writing.
struct FailingRouteUpdate<'a> {
    db: &'a Database<SqliteConnection>,
    ctx: OperationContext,
    audit: AuditContext,
    params: RouteUpdate,
}

impl UpdateCommand for FailingRouteUpdate<'_> {
    type Conn = SqliteConnection;
    type Row = Route;
    type Params = RouteUpdate;

    fn context(&self) -> &OperationContext {
        &self.ctx
    }

    fn audit_context(&self) -> &AuditContext {
        &self.audit
    }

    fn connection(&self) -> &ConnectionPool<SqliteConnection> {
        self.db.pool()
    }

    fn recorder(&self) -> &dyn ChangeRecorder<SqliteConnection> {
        self.db.recorder()
    }

    fn table_name(&self) -> &str {
        ROUTES
    }

    fn params(&self) -> &RouteUpdate {
        &self.params
    }

    fn get_id(&self) -> String {
        self.params.id.to_string()
    }

    fn get_before(
        &self,
        _ctx: &OperationContext,
        tx: &mut SqliteConnection,
    ) -> Result<Route, PersistenceError> {
        tx.find_route(&self.params.id)?
            .ok_or_else(|| PersistenceError::record_not_found(ROUTES, &self.params.id))
    }

    fn execute(
        &self,
        _ctx: &OperationContext,
        tx: &mut SqliteConnection,
    ) -> Result<(), PersistenceError> {
        tx.update_route_row(&self.params)?;
        Err(PersistenceError::QueryFailed(String::from(
            "forced mutation failure",
        )))
    }
}

/// A create command that reports the slug as the record id.
struct SlugKeyedRouteCreate<'a> {
    db: &'a Database<SqliteConnection>,
    ctx: OperationContext,
    audit: AuditContext,
    id: CanonicalId,
    params: cmsdb_domain::NewRoute,
}

impl CreateCommand for SlugKeyedRouteCreate<'_> {
    type Conn = SqliteConnection;
    type Row = Route;
    type Params = cmsdb_domain::NewRoute;

    fn context(&self) -> &OperationContext {
        &self.ctx
    }

    fn audit_context(&self) -> &AuditContext {
        &self.audit
    }

    fn connection(&self) -> &ConnectionPool<SqliteConnection> {
        self.db.pool()
    }

    fn recorder(&self) -> &dyn ChangeRecorder<SqliteConnection> {
        self.db.recorder()
    }

    fn table_name(&self) -> &str {
        ROUTES
    }

    fn params(&self) -> &cmsdb_domain::NewRoute {
        &self.params
    }

    fn execute(
        &self,
        _ctx: &OperationContext,
        tx: &mut SqliteConnection,
    ) -> Result<Route, PersistenceError> {
        tx.insert_route(&self.id, &self.params)?;
        tx.find_route(&self.id)?
            .ok_or_else(|| PersistenceError::record_not_found(ROUTES, &self.id))
    }

    fn get_id(&self, row: &Route) -> String {
        row.slug.clone()
    }
}

// ============================================================================
// Create
// ============================================================================

#[test]
fn test_create_records_exactly_one_create_event() {
    let db = create_test_db();
    let route = seed_route(&db, "about");

    let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.operation, Operation::Create);
    assert_eq!(event.table_name, ROUTES);
    assert_eq!(event.record_id, route.id.to_string());
    assert!(event.before.is_none());
    assert_eq!(event.after, Some(StateSnapshot::capture(&route).unwrap()));
}

#[test]
fn test_create_carries_audit_context() {
    let db = create_test_db();
    let audit = AuditContext::new(
        CanonicalId::generate(),
        Some(CanonicalId::generate()),
        String::from("req-42"),
        String::from("10.0.0.1"),
    );

    let route = create_route(
        &db,
        &OperationContext::new(),
        &audit,
        create_test_route_params("contact"),
    )
    .unwrap();

    let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
    assert_eq!(events[0].audit, audit);
}

#[test]
fn test_recorder_runs_inside_the_mutation_transaction() {
    let recorder = Arc::new(DepthRecorder::default());
    let db = create_test_db().with_recorder(recorder.clone());

    seed_route(&db, "home");

    assert_eq!(recorder.depth.load(Ordering::SeqCst), 1);
    assert_eq!(event_count(&db), 1);
}

#[test]
fn test_failing_recorder_rolls_back_create() {
    let db = create_test_db().with_recorder(Arc::new(FailingRecorder));

    let result = create_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        create_test_route_params("home"),
    );

    assert_eq!(
        result,
        Err(PersistenceError::DatabaseError(String::from(
            "recorder unavailable"
        )))
    );
    assert_eq!(count_routes(&db).unwrap(), 0);
    assert_eq!(event_count(&db), 0);
}

#[test]
fn test_create_with_cancelled_context_writes_nothing() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    ctx.cancel();

    let result = create_route(
        &db,
        &ctx,
        &create_test_audit_context(),
        create_test_route_params("home"),
    );

    assert!(matches!(
        result,
        Err(PersistenceError::BeginTransaction(ref cause)) if **cause == PersistenceError::Cancelled
    ));
    assert_eq!(count_routes(&db).unwrap(), 0);
    assert_eq!(event_count(&db), 0);
}

#[test]
fn test_slug_record_id_is_rejected_and_rolled_back() {
    let db = create_test_db();
    let cmd = SlugKeyedRouteCreate {
        db: &db,
        ctx: OperationContext::new(),
        audit: create_test_audit_context(),
        id: CanonicalId::generate(),
        params: create_test_route_params("about-us"),
    };

    let result = audited::create(&cmd);

    assert!(
        matches!(result, Err(PersistenceError::InvalidIdentifier(_))),
        "Expected InvalidIdentifier, got {result:?}"
    );
    assert_eq!(count_routes(&db).unwrap(), 0);
    assert_eq!(event_count(&db), 0);
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_records_before_state_and_params() {
    let db = create_test_db();
    let route = seed_route(&db, "home");
    let params = RouteUpdate {
        id: route.id.clone(),
        slug: String::from("start"),
        title: String::from("Start"),
        status: 2,
        author_id: None,
    };

    update_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params.clone(),
    )
    .unwrap();

    let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
    assert_eq!(events.len(), 2);
    let event = &events[1];
    assert_eq!(event.operation, Operation::Update);
    assert_eq!(event.before, Some(StateSnapshot::capture(&route).unwrap()));
    assert_eq!(event.after, Some(StateSnapshot::capture(&params).unwrap()));

    let stored = get_route(&db, &route.id).unwrap();
    assert_eq!(stored.slug, "start");
    assert_eq!(stored.status, 2);
    assert_eq!(stored.created_at, route.created_at);
}

#[test]
fn test_update_failing_after_get_before_changes_nothing() {
    let db = create_test_db();
    let route = seed_route(&db, "home");
    let events_before = event_count(&db);

    let cmd = FailingRouteUpdate {
        db: &db,
        ctx: OperationContext::new(),
        audit: create_test_audit_context(),
        params: RouteUpdate {
            id: route.id.clone(),
            slug: String::from("changed"),
            title: String::from("Changed"),
            status: 9,
            author_id: None,
        },
    };

    let result = audited::update(&cmd);

    assert_eq!(
        result,
        Err(PersistenceError::QueryFailed(String::from(
            "forced mutation failure"
        )))
    );
    assert_eq!(get_route(&db, &route.id).unwrap(), route);
    assert_eq!(event_count(&db), events_before);
}

#[test]
fn test_update_of_missing_row_fails_before_mutation() {
    let db = create_test_db();
    let missing = CanonicalId::generate();

    let result = update_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        RouteUpdate {
            id: missing.clone(),
            slug: String::from("ghost"),
            title: String::from("Ghost"),
            status: 0,
            author_id: None,
        },
    );

    assert_eq!(
        result,
        Err(PersistenceError::record_not_found(ROUTES, &missing))
    );
    assert_eq!(event_count(&db), 0);
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn test_delete_twice_records_one_delete_event() {
    let db = create_test_db();
    let route = seed_route(&db, "home");
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();

    delete_route(&db, &ctx, &audit, &route.id).unwrap();
    let second = delete_route(&db, &ctx, &audit, &route.id);

    assert_eq!(
        second,
        Err(PersistenceError::record_not_found(ROUTES, &route.id))
    );
    let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].operation, Operation::Delete);
    assert_eq!(events[1].before, Some(StateSnapshot::capture(&route).unwrap()));
    assert!(events[1].after.is_none());
    assert_eq!(count_routes(&db).unwrap(), 0);
}

#[test]
fn test_failing_recorder_rolls_back_delete() {
    let db = create_test_db();
    let route = seed_route(&db, "home");
    let failing = db.clone().with_recorder(Arc::new(FailingRecorder));

    let result = delete_route(
        &failing,
        &OperationContext::new(),
        &create_test_audit_context(),
        &route.id,
    );

    assert!(result.is_err());
    assert_eq!(get_route(&db, &route.id).unwrap(), route);
    assert_eq!(event_count(&db), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_creates_lose_no_writes() {
    let db = create_test_db();

    let ids: Vec<CanonicalId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let db = &db;
                scope.spawn(move || {
                    create_route(
                        db,
                        &OperationContext::new(),
                        &create_test_audit_context(),
                        create_test_route_params(&format!("page-{i}")),
                    )
                    .expect("Concurrent create failed")
                    .id
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Thread panicked"))
            .collect()
    });

    let distinct: HashSet<&CanonicalId> = ids.iter().collect();
    assert_eq!(distinct.len(), 10);
    assert_eq!(count_routes(&db).unwrap(), 10);
    assert_eq!(event_count(&db), 10);
}

const WRITERS: usize = 10;
const UPDATE_ROUNDS: usize = 5;

#[test]
fn test_concurrent_creates_on_file_database_lose_no_writes() {
    let (db, _file) = create_file_test_db(10);

    let ids: Vec<CanonicalId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let db = &db;
                scope.spawn(move || {
                    create_route(
                        db,
                        &OperationContext::new(),
                        &create_test_audit_context(),
                        create_test_route_params(&format!("page-{i}")),
                    )
                    .expect("Concurrent create failed")
                    .id
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Thread panicked"))
            .collect()
    });

    let distinct: HashSet<&CanonicalId> = ids.iter().collect();
    assert_eq!(distinct.len(), WRITERS);
    assert_eq!(count_routes(&db).unwrap(), 10);
    assert_eq!(event_count(&db), 10);
}

#[test]
fn test_concurrent_updates_of_distinct_rows_on_file_database() {
    let (db, _file) = create_file_test_db(10);
    let routes: Vec<Route> = (0..WRITERS)
        .map(|i| seed_route(&db, &format!("page-{i}")))
        .collect();

    std::thread::scope(|scope| {
        for route in &routes {
            let db = &db;
            scope.spawn(move || {
                for round in 0..UPDATE_ROUNDS {
                    update_route(
                        db,
                        &OperationContext::new(),
                        &create_test_audit_context(),
                        RouteUpdate {
                            id: route.id.clone(),
                            slug: route.slug.clone(),
                            title: format!("{} round {round}", route.slug),
                            status: route.status,
                            author_id: None,
                        },
                    )
                    .expect("Concurrent update failed");
                }
            });
        }
    });

    assert_eq!(count_routes(&db).unwrap(), 10);
    assert_eq!(event_count(&db), 10 + 10 * 5);
    for route in &routes {
        let stored = get_route(&db, &route.id).unwrap();
        assert_eq!(stored.title, format!("{} round 4", route.slug));
        let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
        assert_eq!(events.len(), 1 + UPDATE_ROUNDS);
    }
}

#[test]
fn test_concurrent_deletes_of_distinct_rows_on_file_database() {
    let (db, _file) = create_file_test_db(10);
    let routes: Vec<Route> = (0..WRITERS)
        .map(|i| seed_route(&db, &format!("page-{i}")))
        .collect();

    std::thread::scope(|scope| {
        for route in &routes {
            let db = &db;
            scope.spawn(move || {
                delete_route(
                    db,
                    &OperationContext::new(),
                    &create_test_audit_context(),
                    &route.id,
                )
                .expect("Concurrent delete failed");
            });
        }
    });

    assert_eq!(count_routes(&db).unwrap(), 0);
    assert_eq!(event_count(&db), 20);
    for route in &routes {
        let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].operation, Operation::Delete);
    }
}
