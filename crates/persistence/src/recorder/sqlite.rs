// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_audit::ChangeEvent;
use cmsdb_domain::CanonicalId;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use super::{ChangeRecorder, snapshot_text, validate_record_id};
use crate::diesel_schema::sqlite::change_events;
use crate::error::PersistenceError;

/// Records change events in the `SQLite` change log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteRecorder;

impl ChangeRecorder<SqliteConnection> for SqliteRecorder {
    fn record(
        &self,
        conn: &mut SqliteConnection,
        event: &ChangeEvent,
    ) -> Result<(), PersistenceError> {
        let record_id: CanonicalId = validate_record_id(event)?;
        let before: Option<String> = snapshot_text(event.before.as_ref())?;
        let after: Option<String> = snapshot_text(event.after.as_ref())?;
        let created_at: String = event.occurred_at.to_storage_string()?;

        diesel::insert_into(change_events::table)
            .values((
                change_events::event_id.eq(event.event_id.as_str()),
                change_events::table_name.eq(&event.table_name),
                change_events::operation.eq(event.operation.as_str()),
                change_events::record_id.eq(record_id.as_str()),
                change_events::before_value.eq(before),
                change_events::after_value.eq(after),
                change_events::node_id.eq(event.audit.node_id.as_str()),
                change_events::user_id.eq(event.audit.user_id.as_ref().map(CanonicalId::as_str)),
                change_events::request_id.eq(&event.audit.request_id),
                change_events::ip.eq(&event.audit.ip),
                change_events::created_at.eq(created_at),
            ))
            .execute(conn)?;

        debug!(
            event_id = %event.event_id,
            table = %event.table_name,
            operation = %event.operation,
            "Recorded change event"
        );
        Ok(())
    }
}
