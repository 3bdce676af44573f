// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use cmsdb_domain::{CanonicalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Identifies who caused a mutation and from where.
///
/// Constructed once per inbound request and copied by value into every
/// change event the request produces. It is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    /// The node that executed the mutation.
    pub node_id: CanonicalId,
    /// The acting user, if the mutation was made on behalf of one.
    pub user_id: Option<CanonicalId>,
    /// Request correlation identifier.
    pub request_id: String,
    /// Source address of the request.
    pub ip: String,
}

impl AuditContext {
    /// Creates a new `AuditContext`.
    ///
    /// # Arguments
    ///
    /// * `node_id` - The node executing the mutation
    /// * `user_id` - The acting user, or `None` for system actions
    /// * `request_id` - Request correlation identifier
    /// * `ip` - Source address of the request
    #[must_use]
    pub const fn new(
        node_id: CanonicalId,
        user_id: Option<CanonicalId>,
        request_id: String,
        ip: String,
    ) -> Self {
        Self {
            node_id,
            user_id,
            request_id,
            ip,
        }
    }
}

/// The kind of mutation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Converts this operation to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Error returned when a stored operation name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnknownOperation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized copy of an entity's state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    /// The JSON form of the captured value.
    pub data: serde_json::Value,
}

impl StateSnapshot {
    /// Wraps an already-serialized value.
    #[must_use]
    pub const fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Captures the serialized form of `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized to JSON.
    pub fn capture<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::new)
    }

    /// Parses a snapshot from its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid JSON.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::new)
    }

    /// Renders the snapshot as compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be rendered.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.data)
    }
}

/// An immutable record of one successful mutation.
///
/// Exactly one change event is written per mutation, in the same
/// transaction as the mutation. Change events are append-only: nothing in
/// this workspace updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Identifier of the event itself.
    pub event_id: CanonicalId,
    /// The kind of mutation.
    pub operation: Operation,
    /// The table the mutated row lives in.
    pub table_name: String,
    /// Identifier of the mutated row.
    ///
    /// Kept as raw text so that a malformed identifier reaches the recorder,
    /// which must reject it rather than have it silently normalized here.
    pub record_id: String,
    /// State before the mutation. Absent for creates.
    pub before: Option<StateSnapshot>,
    /// State after the mutation. Absent for deletes.
    pub after: Option<StateSnapshot>,
    /// Who caused the mutation.
    pub audit: AuditContext,
    /// When the event was built.
    pub occurred_at: Timestamp,
}

impl ChangeEvent {
    /// Builds a new event with a fresh identifier and the current time.
    #[must_use]
    pub fn new(
        operation: Operation,
        table_name: impl Into<String>,
        record_id: impl Into<String>,
        before: Option<StateSnapshot>,
        after: Option<StateSnapshot>,
        audit: AuditContext,
    ) -> Self {
        Self::with_id(
            CanonicalId::generate(),
            Timestamp::now(),
            operation,
            table_name,
            record_id,
            before,
            after,
            audit,
        )
    }

    /// Builds an event with an explicit identifier and time.
    ///
    /// Used when rehydrating stored events.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        event_id: CanonicalId,
        occurred_at: Timestamp,
        operation: Operation,
        table_name: impl Into<String>,
        record_id: impl Into<String>,
        before: Option<StateSnapshot>,
        after: Option<StateSnapshot>,
        audit: AuditContext,
    ) -> Self {
        Self {
            event_id,
            operation,
            table_name: table_name.into(),
            record_id: record_id.into(),
            before,
            after,
            audit,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_audit_context() -> AuditContext {
        AuditContext::new(
            CanonicalId::generate(),
            None,
            String::from("req-1"),
            String::from("127.0.0.1"),
        )
    }

    #[test]
    fn test_operation_string_round_trip() {
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn test_operation_rejects_lowercase() {
        assert_eq!(
            "create".parse::<Operation>(),
            Err(UnknownOperation(String::from("create")))
        );
    }

    #[test]
    fn test_operation_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Operation::Delete).unwrap(),
            "\"DELETE\""
        );
    }

    #[test]
    fn test_snapshot_capture_serializes_value() {
        #[derive(Serialize)]
        struct Row {
            slug: &'static str,
            status: i64,
        }

        let snapshot: StateSnapshot = StateSnapshot::capture(&Row {
            slug: "home",
            status: i64::from(i32::MIN),
        })
        .unwrap();

        assert_eq!(
            snapshot.data,
            json!({"slug": "home", "status": -2_147_483_648_i64})
        );
    }

    #[test]
    fn test_snapshot_json_text_round_trip() {
        let snapshot: StateSnapshot = StateSnapshot::new(json!({"a": [1, 2, null]}));
        let text: String = snapshot.to_json_string().unwrap();
        assert_eq!(StateSnapshot::from_json_str(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_change_event_new_generates_identity() {
        let audit: AuditContext = test_audit_context();
        let first: ChangeEvent = ChangeEvent::new(
            Operation::Create,
            "routes",
            CanonicalId::generate().into_string(),
            None,
            Some(StateSnapshot::new(json!({}))),
            audit.clone(),
        );
        let second: ChangeEvent = ChangeEvent::new(
            Operation::Create,
            "routes",
            first.record_id.clone(),
            None,
            None,
            audit.clone(),
        );

        assert_ne!(first.event_id, second.event_id);
        assert!(first.occurred_at <= second.occurred_at);
        assert_eq!(first.audit, audit);
        assert!(first.before.is_none());
    }

    #[test]
    fn test_change_event_keeps_malformed_record_id_verbatim() {
        let event: ChangeEvent = ChangeEvent::new(
            Operation::Update,
            "routes",
            " about-us ",
            None,
            None,
            test_audit_context(),
        );
        assert_eq!(event.record_id, " about-us ");
    }
}
