// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_audit::Operation;
use cmsdb_domain::{DomainError, Role, UserUpdate};

use super::super::{
    create_test_audit_context, create_test_db, create_test_user_params, event_count,
};
use crate::{
    OperationContext, PersistenceError, USERS, count_users, create_user, delete_user, get_user,
    get_user_by_username, list_change_events_for_record, list_users, update_user,
    verify_user_password,
};

#[test]
fn test_create_and_get_user() {
    let db = create_test_db();

    let user = create_user(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        create_test_user_params("alice"),
    )
    .unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Editor);
    assert!(user.is_active);
    assert_eq!(get_user(&db, &user.id).unwrap(), user);
    assert_eq!(get_user_by_username(&db, "alice").unwrap(), user);
    assert_eq!(count_users(&db).unwrap(), 1);
}

#[test]
fn test_password_never_reaches_change_log() {
    let db = create_test_db();
    let params = create_test_user_params("alice");
    let password = params.password.clone();

    let user = create_user(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    )
    .unwrap();

    let events = list_change_events_for_record(&db, USERS, &user.id).unwrap();
    assert_eq!(events.len(), 1);
    let after = events[0].after.as_ref().unwrap().data.to_string();
    assert!(!after.contains(&password));
    assert!(!after.contains("password"));
}

#[test]
fn test_verify_user_password() {
    let db = create_test_db();
    let params = create_test_user_params("alice");
    let password = params.password.clone();
    create_user(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    )
    .unwrap();

    assert!(verify_user_password(&db, "alice", &password).unwrap());
    assert!(!verify_user_password(&db, "alice", "wrong password").unwrap());
    assert!(!verify_user_password(&db, "nobody", &password).unwrap());
}

#[test]
fn test_inactive_user_does_not_verify() {
    let db = create_test_db();
    let params = create_test_user_params("alice");
    let password = params.password.clone();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let user = create_user(&db, &ctx, &audit, params).unwrap();

    update_user(
        &db,
        &ctx,
        &audit,
        UserUpdate {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: false,
        },
    )
    .unwrap();

    assert!(!verify_user_password(&db, "alice", &password).unwrap());
}

#[test]
fn test_duplicate_username_is_unique_violation() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    create_user(&db, &ctx, &audit, create_test_user_params("alice")).unwrap();

    let result = create_user(&db, &ctx, &audit, create_test_user_params("alice"));

    assert!(
        matches!(result, Err(PersistenceError::UniqueViolation(_))),
        "Expected UniqueViolation, got {result:?}"
    );
    assert_eq!(count_users(&db).unwrap(), 1);
    assert_eq!(event_count(&db), 1);
}

#[test]
fn test_invalid_user_params_are_rejected_before_any_write() {
    let db = create_test_db();
    let mut params = create_test_user_params("alice");
    params.email = String::from("not-an-email");

    let result = create_user(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    );

    assert!(matches!(
        result,
        Err(PersistenceError::Validation(DomainError::InvalidEmail(_)))
    ));
    assert_eq!(event_count(&db), 0);
}

#[test]
fn test_update_and_delete_user() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let user = create_user(&db, &ctx, &audit, create_test_user_params("alice")).unwrap();

    update_user(
        &db,
        &ctx,
        &audit,
        UserUpdate {
            id: user.id.clone(),
            username: String::from("alice2"),
            name: String::from("Alice Two"),
            email: String::from("alice2@example.com"),
            role: Role::Admin,
            is_active: true,
        },
    )
    .unwrap();

    let updated = get_user(&db, &user.id).unwrap();
    assert_eq!(updated.username, "alice2");
    assert_eq!(updated.role, Role::Admin);

    delete_user(&db, &ctx, &audit, &user.id).unwrap();
    assert!(list_users(&db).unwrap().is_empty());

    let operations: Vec<Operation> = list_change_events_for_record(&db, USERS, &user.id)
        .unwrap()
        .into_iter()
        .map(|event| event.operation)
        .collect();
    assert_eq!(
        operations,
        vec![Operation::Create, Operation::Update, Operation::Delete]
    );
}
