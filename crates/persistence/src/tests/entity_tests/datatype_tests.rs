// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_domain::{DatatypeUpdate, NewDatatype};

use super::super::{create_test_audit_context, create_test_db};
use crate::{
    OperationContext, PersistenceError, count_datatypes, create_datatype, delete_datatype,
    get_datatype, list_datatypes, update_datatype,
};

fn datatype_params(label: &str) -> NewDatatype {
    NewDatatype {
        parent_id: None,
        label: label.to_string(),
        kind: String::from("page"),
        author_id: None,
    }
}

#[test]
fn test_datatype_crud() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();

    let datatype = create_datatype(&db, &ctx, &audit, datatype_params("Article")).unwrap();
    assert_eq!(get_datatype(&db, &datatype.id).unwrap(), datatype);

    update_datatype(
        &db,
        &ctx,
        &audit,
        DatatypeUpdate {
            id: datatype.id.clone(),
            parent_id: None,
            label: String::from("Post"),
            kind: String::from("page"),
        },
    )
    .unwrap();
    assert_eq!(get_datatype(&db, &datatype.id).unwrap().label, "Post");
    assert_eq!(list_datatypes(&db).unwrap().len(), 1);

    delete_datatype(&db, &ctx, &audit, &datatype.id).unwrap();
    assert_eq!(count_datatypes(&db).unwrap(), 0);
}

#[test]
fn test_parent_datatype_cannot_be_deleted_while_referenced() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();
    let parent = create_datatype(&db, &ctx, &audit, datatype_params("Base")).unwrap();
    let mut child_params = datatype_params("Derived");
    child_params.parent_id = Some(parent.id.clone());
    let child = create_datatype(&db, &ctx, &audit, child_params).unwrap();
    assert_eq!(child.parent_id.as_ref(), Some(&parent.id));

    let result = delete_datatype(&db, &ctx, &audit, &parent.id);

    assert!(matches!(
        result,
        Err(PersistenceError::ForeignKeyViolation(_))
    ));
    assert_eq!(count_datatypes(&db).unwrap(), 2);
}

#[test]
fn test_blank_label_is_rejected() {
    let db = create_test_db();

    let result = create_datatype(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        datatype_params("   "),
    );

    assert!(matches!(result, Err(PersistenceError::Validation(_))));
}
