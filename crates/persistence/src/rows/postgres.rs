// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `PostgreSQL` rows. Entity rows are the shared 32-bit rows.

use cmsdb_audit::{AuditContext, ChangeEvent, Operation, StateSnapshot};
use cmsdb_domain::Timestamp;
use diesel::Queryable;
use time::OffsetDateTime;

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
    pub before_value: Option<serde_json::Value>,
    pub after_value: Option<serde_json::Value>,
    pub node_id: String,
    pub user_id: Option<String>,
    pub request_id: String,
    pub ip: String,
    pub created_at: OffsetDateTime,
}

impl ChangeEventRow {
    /// Maps the row to a [`ChangeEvent`].
    ///
    /// # Errors
    ///
    /// Returns an error if a stored identifier or operation is malformed.
    pub fn into_domain(self) -> Result<ChangeEvent, PersistenceError> {
        Ok(ChangeEvent::with_id(
            parse_id(&self.event_id)?,
            Timestamp::from_datetime(self.created_at),
            self.operation.parse::<Operation>()?,
            self.table_name,
            self.record_id,
            self.before_value.map(StateSnapshot::new),
            self.after_value.map(StateSnapshot::new),
            AuditContext::new(
                parse_id(&self.node_id)?,
                parse_opt_id(self.user_id)?,
                self.request_id,
                self.ip,
            ),
        ))
    }
}
