// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change-event recording.
//!
//! A [`ChangeRecorder`] writes one change event on the same connection, and
//! therefore in the same transaction, as the mutation it describes. There is
//! one recorder per backend because the change-log columns differ:
//!
//! | Backend | Snapshots | Timestamp |
//! |---|---|---|
//! | `SQLite` | JSON text | fixed-width UTC text |
//! | `MySQL` | JSON text | `DATETIME(6)` (UTC) |
//! | `PostgreSQL` | `JSONB` | `TIMESTAMPTZ` |
//!
//! Every recorder validates the event's record identifier before writing.
//! A non-canonical identifier is an error; it is never trimmed, padded or
//! otherwise reformatted.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use cmsdb_audit::{ChangeEvent, StateSnapshot};
use cmsdb_domain::CanonicalId;

use crate::error::PersistenceError;

pub use mysql::MysqlRecorder;
pub use postgres::PostgresRecorder;
pub use sqlite::SqliteRecorder;

/// Persists change events for connections of type `C`.
pub trait ChangeRecorder<C>: Send + Sync {
    /// Writes `event` using `conn`.
    ///
    /// Must be called with the connection that performed the mutation,
    /// while its transaction is still open.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if the record id is not canonical, or the
    /// underlying serialization or database error.
    fn record(&self, conn: &mut C, event: &ChangeEvent) -> Result<(), PersistenceError>;
}

/// Validates the record identifier of `event`.
///
/// # Errors
///
/// Returns `PersistenceError::InvalidIdentifier` if the id is not a
/// 26-character canonical identifier.
pub fn validate_record_id(event: &ChangeEvent) -> Result<CanonicalId, PersistenceError> {
    CanonicalId::parse(&event.record_id).map_err(PersistenceError::InvalidIdentifier)
}

/// Renders an optional snapshot as JSON text.
fn snapshot_text(snapshot: Option<&StateSnapshot>) -> Result<Option<String>, PersistenceError> {
    Ok(snapshot.map(StateSnapshot::to_json_string).transpose()?)
}
