// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_domain::{DomainError, MediaUpdate, NewMedia};

use super::super::{create_test_audit_context, create_test_db, event_count};
use crate::{
    OperationContext, PersistenceError, count_media, create_media, delete_media, get_media,
    list_media, update_media,
};

fn media_params() -> NewMedia {
    NewMedia {
        name: String::from("logo.png"),
        display_name: Some(String::from("Logo")),
        mimetype: String::from("image/png"),
        url: String::from("/media/logo.png"),
        size: Some(2048),
        width: Some(64),
        height: Some(64),
        author_id: None,
    }
}

#[test]
fn test_media_crud() {
    let db = create_test_db();
    let ctx = OperationContext::new();
    let audit = create_test_audit_context();

    let media = create_media(&db, &ctx, &audit, media_params()).unwrap();
    assert_eq!(get_media(&db, &media.id).unwrap(), media);

    update_media(
        &db,
        &ctx,
        &audit,
        MediaUpdate {
            id: media.id.clone(),
            display_name: None,
            url: String::from("/media/logo-v2.png"),
            size: None,
            width: Some(128),
            height: Some(128),
        },
    )
    .unwrap();

    let updated = get_media(&db, &media.id).unwrap();
    assert_eq!(updated.display_name, None);
    assert_eq!(updated.size, None);
    assert_eq!(updated.width, Some(128));
    assert_eq!(updated.name, "logo.png");
    assert_eq!(list_media(&db).unwrap().len(), 1);

    delete_media(&db, &ctx, &audit, &media.id).unwrap();
    assert_eq!(count_media(&db).unwrap(), 0);
    assert_eq!(event_count(&db), 3);
}

#[test]
fn test_negative_dimension_is_rejected() {
    let db = create_test_db();
    let mut params = media_params();
    params.width = Some(-1);

    let result = create_media(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    );

    assert_eq!(
        result,
        Err(PersistenceError::Validation(DomainError::InvalidDimension {
            field: "width",
            value: -1
        }))
    );
    assert_eq!(event_count(&db), 0);
}

#[test]
fn test_large_media_size_is_kept_on_sqlite() {
    let db = create_test_db();
    let mut params = media_params();
    params.size = Some(5_000_000_000);

    let media = create_media(
        &db,
        &OperationContext::new(),
        &create_test_audit_context(),
        params,
    )
    .unwrap();

    assert_eq!(get_media(&db, &media.id).unwrap().size, Some(5_000_000_000));
}
