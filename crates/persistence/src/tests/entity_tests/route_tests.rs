// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_domain::{DomainError, RouteUpdate};

use super::super::{
    create_test_audit_context, create_test_db, create_test_route_params, create_test_user_params,
    event_count, seed_route,
};
use crate::{
    OperationContext, PersistenceError, ROUTES, count_routes, create_route, create_user,
    delete_user, get_route, get_route_by_slug, list_change_events_for_record, list_routes,
    update_route,
};

#[test]
fn test_get_route_by_slug() {
    let db = create_test_db();
    let route = seed_route(&db, "about");

    assert_eq!(get_route_by_slug(&db, "about").unwrap(), route);
    assert!(matches!(
        get_route_by_slug(&db, "missing"),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_list_routes_returns_all_routes() {
    let db = create_test_db();
    let a = seed_route(&db, "a");
    let b = seed_route(&db, "b");

    let mut expected = vec![a, b];
    expected.sort_by(|x, y| x.id.cmp(&y.id));
    assert_eq!(list_routes(&db).unwrap(), expected);
    assert_eq!(count_routes(&db).unwrap(), 2);
}

#[test]
fn test_slug_with_whitespace_is_rejected() {
    let db = create_test_db();

    let result = create_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        create_test_route_params("about us"),
    );

    assert_eq!(
        result,
        Err(PersistenceError::Validation(DomainError::InvalidSlug(
            String::from("about us")
        )))
    );
    assert_eq!(count_routes(&db).unwrap(), 0);
}

#[test]
fn test_duplicate_slug_leaves_no_event() {
    let db = create_test_db();
    seed_route(&db, "home");

    let result = create_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        create_test_route_params("home"),
    );

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
    assert_eq!(count_routes(&db).unwrap(), 1);
    assert_eq!(event_count(&db), 1);
}

#[test]
fn test_slug_change_keeps_audit_trail_on_canonical_id() {
    let db = create_test_db();
    let route = seed_route(&db, "old-slug");

    update_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        RouteUpdate {
            id: route.id.clone(),
            slug: String::from("new-slug"),
            title: route.title.clone(),
            status: route.status,
            author_id: None,
        },
    )
    .unwrap();

    let events = list_change_events_for_record(&db, ROUTES, &route.id).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.record_id == route.id.as_str()));
    assert_eq!(get_route_by_slug(&db, "new-slug").unwrap().id, route.id);
}

#[test]
fn test_route_author_must_exist() {
    let db = create_test_db();
    let mut params = create_test_route_params("home");
    params.author_id = Some(cmsdb_domain::CanonicalId::generate());

    let result = create_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    );

    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
    assert_eq!(event_count(&db), 0);
}

#[test]
fn test_referenced_author_cannot_be_deleted() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let author = create_user(&db, &ctx, &audit, create_test_user_params("author")).unwrap();
    let mut params = create_test_route_params("home");
    params.author_id = Some(author.id.clone());
    let route = create_route(&db, &ctx, &audit, params).unwrap();

    let result = delete_user(&db, &ctx, &audit, &author.id);

    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
    assert_eq!(get_route(&db, &route.id).unwrap().author_id, Some(author.id));
    assert_eq!(event_count(&db), 2);
}
