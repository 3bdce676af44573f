// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_audit::{ChangeEvent, StateSnapshot};
use cmsdb_domain::CanonicalId;
use diesel::PgConnection;
use diesel::prelude::*;
use tracing::debug;

use super::{ChangeRecorder, validate_record_id};
use crate::diesel_schema::postgres::change_events;
use crate::error::PersistenceError;

/// Records change events in the `PostgreSQL` change log.
///
/// Snapshots are stored as `JSONB` and the timestamp as `TIMESTAMPTZ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresRecorder;

impl ChangeRecorder<PgConnection> for PostgresRecorder {
    fn record(&self, conn: &mut PgConnection, event: &ChangeEvent) -> Result<(), PersistenceError> {
        let record_id: CanonicalId = validate_record_id(event)?;
        let snapshot_value = |snapshot: Option<&StateSnapshot>| snapshot.map(|s| s.data.clone());

        diesel::insert_into(change_events::table)
            .values((
                change_events::event_id.eq(event.event_id.as_str()),
                change_events::table_name.eq(&event.table_name),
                change_events::operation.eq(event.operation.as_str()),
                change_events::record_id.eq(record_id.as_str()),
                change_events::before_value.eq(snapshot_value(event.before.as_ref())),
                change_events::after_value.eq(snapshot_value(event.after.as_ref())),
                change_events::node_id.eq(event.audit.node_id.as_str()),
                change_events::user_id.eq(event.audit.user_id.as_ref().map(CanonicalId::as_str)),
                change_events::request_id.eq(&event.audit.request_id),
                change_events::ip.eq(&event.audit.ip),
                change_events::created_at.eq(event.occurred_at.as_datetime()),
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
