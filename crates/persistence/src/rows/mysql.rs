// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `MySQL` rows. Entity rows are the shared 32-bit rows.

use cmsdb_audit::{AuditContext, ChangeEvent, Operation, StateSnapshot};
use cmsdb_domain::Timestamp;
use diesel::Queryable;
use time::PrimitiveDateTime;

use super::{parse_id, parse_opt_id};
use crate::error::PersistenceError;

pub use super::narrow::*;

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
    pub created_at: PrimitiveDateTime,
}

impl ChangeEventRow {
    /// Maps the row to a [`ChangeEvent`], reading `created_at` as UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored identifier, operation or snapshot is
    /// malformed.
    pub fn into_domain(self) -> Result<ChangeEvent, PersistenceError> {
        let snapshot = |text: Option<String>| {
            text.as_deref()
                .map(StateSnapshot::from_json_str)
                .transpose()
        };

        Ok(ChangeEvent::with_id(
            parse_id(&self.event_id)?,
            Timestamp::from_primitive_utc(self.created_at),
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
