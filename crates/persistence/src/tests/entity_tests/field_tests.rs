// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_domain::{CanonicalId, Datatype, FieldUpdate, NewDatatype, NewField};
use diesel::SqliteConnection;

use super::super::{create_test_audit_context, create_test_db};
use crate::{
    Database, OperationContext, PersistenceError, count_fields, create_datatype, create_field,
    delete_field, get_field, list_fields, list_fields_for_datatype, update_field,
};

fn seed_datatype(db: &Database<SqliteConnection>) -> Datatype {
    create_datatype(
        db,
        &OperationContext::new(),
        &create_test_audit_context(),
        NewDatatype {
            parent_id: None,
            label: String::from("Article"),
            kind: String::from("page"),
            author_id: None,
        },
    )
    .unwrap()
}

fn field_params(datatype_id: &CanonicalId, label: &str, sort_order: i64) -> NewField {
    NewField {
        datatype_id: datatype_id.clone(),
        label: label.to_string(),
        kind: String::from("text"),
        data: String::new(),
        sort_order,
        author_id: None,
    }
}

#[test]
fn test_fields_list_in_sort_order() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let datatype = seed_datatype(&db);

    let body = create_field(&db, &ctx, &audit, field_params(&datatype.id, "Body", 2)).unwrap();
    let title = create_field(&db, &ctx, &audit, field_params(&datatype.id, "Title", 1)).unwrap();

    let fields = list_fields_for_datatype(&db, &datatype.id).unwrap();
    assert_eq!(fields, vec![title, body]);
    assert_eq!(list_fields(&db).unwrap().len(), 2);
}

#[test]
fn test_field_sort_order_keeps_full_width_on_sqlite() {
    let db = create_test_db();
    let datatype = seed_datatype(&db);
    let sort_order: i64 = i64::from(i32::MAX) + 1;

    let field = create_field(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        field_params(&datatype.id, "Wide", sort_order),
    )
    .unwrap();

    assert_eq!(get_field(&db, &field.id).unwrap().sort_order, sort_order);
}

#[test]
fn test_field_requires_existing_datatype() {
    let db = create_test_db();

    let result = create_field(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        field_params(&CanonicalId::generate(), "Orphan", 0),
    );

    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
    assert_eq!(count_fields(&db).unwrap(), 0);
}

#[test]
fn test_update_and_delete_field() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let datatype = seed_datatype(&db);
    let field = create_field(&db, &ctx, &audit, field_params(&datatype.id, "Title", 0)).unwrap();

    update_field(
        &db,
        &ctx,
        &audit,
        FieldUpdate {
            id: field.id.clone(),
            label: String::from("Headline"),
            kind: String::from("text"),
            data: String::from("{\"max\":120}"),
            sort_order: 5,
        },
    )
    .unwrap();

    let updated = get_field(&db, &field.id).unwrap();
    assert_eq!(updated.label, "Headline");
    assert_eq!(updated.sort_order, 5);
    assert_eq!(updated.datatype_id, datatype.id);

    delete_field(&db, &ctx, &audit, &field.id).unwrap();
    assert_eq!(count_fields(&db).unwrap(), 0);
}
