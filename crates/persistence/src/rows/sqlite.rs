// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` rows. Counters are stored at full 64-bit width.

use cmsdb_audit::{AuditContext, ChangeEvent, Operation, StateSnapshot};
use diesel::Queryable;

use super::{parse_id, parse_opt_id, parse_timestamp};
use crate::error::PersistenceError;

#[allow(clippy::unnecessary_wraps)]
const fn keep_wide(value: i64) -> Result<i64, PersistenceError> {
    Ok(value)
}

const fn identity(value: i64) -> i64 {
    value
}

super::entity_rows!(int = i64, widen = identity, store = keep_wide);

/// A `change_events` row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct ChangeEventRow {
    pub event_id: String,
    pub table_name: String,
    pub operation: String,
    pub record_id: String,
    pub before_value: Option<String>,
    pub after_value: Option<String>,
    pub node_id: String,
    pub user_id: Option<String>,
    pub request_id: String,
    pub ip: String,
    pub created_at: String,
}

impl ChangeEventRow {
    /// Maps the row to a [`ChangeEvent`].
    ///
    /// # Errors
    ///
    /// Returns an error if a stored identifier, operation, snapshot or
    /// timestamp is malformed.
    pub fn into_domain(self) -> Result<ChangeEvent, PersistenceError> {
        let snapshot = |text: Option<String>| {
            text.as_deref()
                .map(StateSnapshot::from_json_str)
                .transpose()
        };

        Ok(ChangeEvent::with_id(
            parse_id(&self.event_id)?,
            parse_timestamp(&self.created_at)?,
            self.operation.parse::<Operation>()?,
            self.table_name,
            self.record_id,
            snapshot(self.before_value)?,
            snapshot(self.after_value)?,
            AuditContext::new(
                parse_id(&self.node_id)?,
                parse_opt_id(self.user_id)?,
                self.request_id,
                self.ip,
            ),
        ))
    }
}
