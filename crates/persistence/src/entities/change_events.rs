// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change-log reads.
//!
//! Change events are written only by recorders, inside the transaction of
//! the mutation they describe. This module reads them back. Events are
//! ordered by `(created_at, event_id)`. Event ids are monotonic ULIDs, so
//! events one process created in the same microsecond still sort in
//! creation order. Concurrent writers may commit in a different order than
//! they created their events.

use cmsdb_audit::ChangeEvent;
use cmsdb_domain::CanonicalId;
use diesel::prelude::*;

use crate::backend::{AuditBackend, Database};
use crate::error::PersistenceError;

backend_store! {
    /// Change-log queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait ChangeEventStore {
        /// Lists the events of one record, oldest first.
        fn select_record_events(
            conn: &mut Self,
            table_name: &str,
            record_id: &str,
        ) -> Result<Vec<ChangeEvent>, PersistenceError> {
            schema::change_events::table
                .filter(schema::change_events::table_name.eq(table_name))
                .filter(schema::change_events::record_id.eq(record_id))
                .order((
                    schema::change_events::created_at.asc(),
                    schema::change_events::event_id.asc(),
                ))
                .load::<rows::ChangeEventRow>(conn)?
                .into_iter()
                .map(rows::ChangeEventRow::into_domain)
                .collect()
        }

        /// Lists the most recent `limit` events, newest first.
        fn select_recent_events(
            conn: &mut Self,
            limit: i64,
        ) -> Result<Vec<ChangeEvent>, PersistenceError> {
            schema::change_events::table
                .order((
                    schema::change_events::created_at.desc(),
                    schema::change_events::event_id.desc(),
                ))
                .limit(limit)
                .load::<rows::ChangeEventRow>(conn)?
                .into_iter()
                .map(rows::ChangeEventRow::into_domain)
                .collect()
        }

        /// Counts all events.
        fn count_event_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::change_events::table.count().get_result::<i64>(conn)?)
        }

        /// Counts the events of one record.
        fn count_record_event_rows(
            conn: &mut Self,
            table_name: &str,
            record_id: &str,
        ) -> Result<i64, PersistenceError> {
            Ok(schema::change_events::table
                .filter(schema::change_events::table_name.eq(table_name))
                .filter(schema::change_events::record_id.eq(record_id))
                .count()
                .get_result::<i64>(conn)?)
        }
    }
}

/// Lists the change events of one record in creation order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored event is malformed.
pub fn list_change_events_for_record<C: AuditBackend>(
    db: &Database<C>,
    table_name: &str,
    record_id: &CanonicalId,
) -> Result<Vec<ChangeEvent>, PersistenceError> {
    db.connection()?
        .select_record_events(table_name, record_id.as_str())
}

/// Lists the most recent change events, newest first.
///
/// A negative `limit` is treated as zero.
///
/// # Errors
///
/// Returns an error if the query fails or a stored event is malformed.
pub fn list_recent_change_events<C: AuditBackend>(
    db: &Database<C>,
    limit: i64,
) -> Result<Vec<ChangeEvent>, PersistenceError> {
    db.connection()?.select_recent_events(limit.max(0))
}

/// Counts all change events.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_change_events<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_event_rows()
}

/// Counts the change events of one record.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_change_events_for_record<C: AuditBackend>(
    db: &Database<C>,
    table_name: &str,
    record_id: &CanonicalId,
) -> Result<i64, PersistenceError> {
    db.connection()?
        .count_record_event_rows(table_name, record_id.as_str())
}
