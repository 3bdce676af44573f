// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_domain::{CanonicalId, ContentNode, ContentNodeUpdate, NewContentNode, NewDatatype};
use diesel::SqliteConnection;

use super::super::{create_test_audit_context, create_test_db, event_count, seed_route};
use crate::{
    Database, OperationContext, PersistenceError, count_content, create_content, create_datatype,
    delete_content, delete_route, get_content, list_content, list_content_for_route,
    update_content,
};

/// Creates a route, a datatype and one root node.
fn seed_tree(db: &Database<SqliteConnection>) -> ContentNode {
    let route = seed_route(db, "home");
    let datatype = create_datatype(
        db,
        &OperationContext::new(),
        &create_test_audit_context(),
        NewDatatype {
            parent_id: None,
            label: String::from("Section"),
            kind: String::from("block"),
            author_id: None,
        },
    )
    .unwrap();

    create_content(
        db,
        &OperationContext::new(),
        &create_test_audit_context(),
        NewContentNode {
            route_id: route.id,
            datatype_id: datatype.id,
            parent_id: None,
            first_child_id: None,
            next_sibling_id: None,
            prev_sibling_id: None,
            status: 0,
            author_id: None,
        },
    )
    .unwrap()
}

#[test]
fn test_tree_pointers_are_plain_data() {
    let db = create_test_db();
    let root = seed_tree(&db);
    let dangling = CanonicalId::generate();

    update_content(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        ContentNodeUpdate {
            id: root.id.clone(),
            parent_id: None,
            first_child_id: Some(dangling.clone()),
            next_sibling_id: None,
            prev_sibling_id: None,
            status: 1,
        },
    )
    .unwrap();

    let stored = get_content(&db, &root.id).unwrap();
    assert_eq!(stored.first_child_id, Some(dangling));
    assert_eq!(stored.status, 1);
    assert_eq!(stored.route_id, root.route_id);
}

#[test]
fn test_list_content_for_route() {
    let db = create_test_db();
    let root = seed_tree(&db);

    assert_eq!(
        list_content_for_route(&db, &root.route_id).unwrap(),
        vec![root.clone()]
    );
    assert!(
        list_content_for_route(&db, &CanonicalId::generate())
            .unwrap()
            .is_empty()
    );
    assert_eq!(list_content(&db).unwrap(), vec![root]);
}

#[test]
fn test_route_with_content_cannot_be_deleted() {
    let db = create_test_db();
    let root = seed_tree(&db);
    let events_before = event_count(&db);

    let result = delete_route(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        &root.route_id,
    );

    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
    assert_eq!(event_count(&db), events_before);
}

#[test]
fn test_delete_content() {
    let db = create_test_db();
    let root = seed_tree(&db);
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();

    delete_content(&db, &ctx, &audit, &root.id).unwrap();
    assert_eq!(count_content(&db).unwrap(), 0);

    // The route is free to go once its content is gone.
    delete_route(&db, &ctx, &audit, &root.route_id).unwrap();
}
