// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity stores and their audited operations.
//!
//! Each entity module declares a store trait with `backend_store!`, which
//! implements it for every backend connection, and exposes free functions
//! generic over [`AuditBackend`]:
//!
//! - `create_*`, `update_*`, `delete_*` validate their input, build an
//!   audited command from the store operations and run it
//! - `get_*`, `list_*`, `count_*` read on a pooled connection
//!
//! Reads are not audited.

mod change_events;
mod content;
mod datatypes;
mod fields;
mod media;
mod routes;
mod users;

pub use change_events::{
    ChangeEventStore, count_change_events, count_change_events_for_record,
    list_change_events_for_record, list_recent_change_events,
};
pub use content::{
    ContentStore, count_content, create_content, delete_content, get_content, list_content,
    list_content_for_route, update_content,
};
pub use datatypes::{
    DatatypeStore, count_datatypes, create_datatype, delete_datatype, get_datatype,
    list_datatypes, update_datatype,
};
pub use fields::{
    FieldStore, count_fields, create_field, delete_field, get_field, list_fields,
    list_fields_for_datatype, update_field,
};
pub use media::{
    MediaStore, count_media, create_media, delete_media, get_media, list_media, update_media,
};
pub use routes::{
    RouteStore, count_routes, create_route, delete_route, get_route, get_route_by_slug,
    list_routes, update_route,
};
pub use users::{
    NewUserRecord, UserStore, count_users, create_user, delete_user, get_user,
    get_user_by_username, list_users, update_user, verify_user_password,
};

use crate::backend::{AuditBackend, Database, PooledConn};
use crate::error::PersistenceError;

/// Table of user accounts.
pub const USERS: &str = "users";
/// Table of routes.
pub const ROUTES: &str = "routes";
/// Table of datatypes.
pub const DATATYPES: &str = "datatypes";
/// Table of datatype fields.
pub const FIELDS: &str = "fields";
/// Table of content nodes.
pub const CONTENT_DATA: &str = "content_data";
/// Table of media assets.
pub const MEDIA: &str = "media";
/// The change log.
pub const CHANGE_EVENTS: &str = "change_events";

/// Returns the row count of every entity table and of the change log.
///
/// All counts are read on one connection.
pub(crate) fn table_counts<C: AuditBackend>(
    db: &Database<C>,
) -> Result<Vec<(&'static str, i64)>, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    Ok(vec![
        (USERS, conn.count_user_rows()?),
        (ROUTES, conn.count_route_rows()?),
        (DATATYPES, conn.count_datatype_rows()?),
        (FIELDS, conn.count_field_rows()?),
        (CONTENT_DATA, conn.count_content_rows()?),
        (MEDIA, conn.count_media_rows()?),
        (CHANGE_EVENTS, conn.count_event_rows()?),
    ])
}
