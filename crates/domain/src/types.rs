// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity types shared by every backend.
//!
//! Each entity has a persisted form (e.g. [`Route`]), creation parameters
//! (e.g. [`NewRoute`]) and update parameters keyed by canonical identifier
//! (e.g. [`RouteUpdate`]). Counters are always `i64` here regardless of the
//! width a backend stores them with.

use crate::error::DomainError;
use crate::identifier::CanonicalId;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management.
    Admin,
    /// May create and edit content.
    Editor,
    /// Read-only access.
    #[default]
    Viewer,
}

impl Role {
    /// Converts this role to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Users
// ============================================================================

/// A user account.
///
/// The password hash is deliberately not part of this type so that it never
/// appears in a change-event snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: CanonicalId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a user.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Plaintext password, hashed before storage and never serialized.
    #[serde(skip_serializing)]
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parameters for updating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub id: CanonicalId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

// ============================================================================
// Routes
// ============================================================================

/// A routable address in the site, identified for humans by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: CanonicalId,
    pub slug: String,
    pub title: String,
    pub status: i64,
    pub author_id: Option<CanonicalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoute {
    pub slug: String,
    pub title: String,
    pub status: i64,
    pub author_id: Option<CanonicalId>,
}

/// Parameters for updating a route.
///
/// Routes are always addressed by canonical identifier for mutations; the
/// slug is an ordinary, updatable column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub id: CanonicalId,
    pub slug: String,
    pub title: String,
    pub status: i64,
    pub author_id: Option<CanonicalId>,
}

// ============================================================================
// Datatypes
// ============================================================================

/// A content type definition. Datatypes may nest under a parent datatype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datatype {
    pub id: CanonicalId,
    pub parent_id: Option<CanonicalId>,
    pub label: String,
    pub kind: String,
    pub author_id: Option<CanonicalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a datatype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDatatype {
    pub parent_id: Option<CanonicalId>,
    pub label: String,
    pub kind: String,
    pub author_id: Option<CanonicalId>,
}

/// Parameters for updating a datatype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatatypeUpdate {
    pub id: CanonicalId,
    pub parent_id: Option<CanonicalId>,
    pub label: String,
    pub kind: String,
}

// ============================================================================
// Fields
// ============================================================================

/// A field definition belonging to a datatype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: CanonicalId,
    pub datatype_id: CanonicalId,
    pub label: String,
    pub kind: String,
    pub data: String,
    pub sort_order: i64,
    pub author_id: Option<CanonicalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewField {
    pub datatype_id: CanonicalId,
    pub label: String,
    pub kind: String,
    pub data: String,
    pub sort_order: i64,
    pub author_id: Option<CanonicalId>,
}

/// Parameters for updating a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub id: CanonicalId,
    pub label: String,
    pub kind: String,
    pub data: String,
    pub sort_order: i64,
}

// ============================================================================
// Content nodes
// ============================================================================

/// A node in a route's content tree.
///
/// Tree pointers are plain identifiers; no tree algorithm is applied here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: CanonicalId,
    pub route_id: CanonicalId,
    pub datatype_id: CanonicalId,
    pub parent_id: Option<CanonicalId>,
    pub first_child_id: Option<CanonicalId>,
    pub next_sibling_id: Option<CanonicalId>,
    pub prev_sibling_id: Option<CanonicalId>,
    pub status: i64,
    pub author_id: Option<CanonicalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContentNode {
    pub route_id: CanonicalId,
    pub datatype_id: CanonicalId,
    pub parent_id: Option<CanonicalId>,
    pub first_child_id: Option<CanonicalId>,
    pub next_sibling_id: Option<CanonicalId>,
    pub prev_sibling_id: Option<CanonicalId>,
    pub status: i64,
    pub author_id: Option<CanonicalId>,
}

/// Parameters for updating a content node's position and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNodeUpdate {
    pub id: CanonicalId,
    pub parent_id: Option<CanonicalId>,
    pub first_child_id: Option<CanonicalId>,
    pub next_sibling_id: Option<CanonicalId>,
    pub prev_sibling_id: Option<CanonicalId>,
    pub status: i64,
}

// ============================================================================
// Media
// ============================================================================

/// An uploaded media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: CanonicalId,
    pub name: String,
    pub display_name: Option<String>,
    pub mimetype: String,
    pub url: String,
    pub size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub author_id: Option<CanonicalId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for registering a media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedia {
    pub name: String,
    pub display_name: Option<String>,
    pub mimetype: String,
    pub url: String,
    pub size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub author_id: Option<CanonicalId>,
}

/// Parameters for updating a media asset's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUpdate {
    pub id: CanonicalId,
    pub display_name: Option<String>,
    pub url: String,
    pub size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

macro_rules! keyed_by_id {
    ($($entity:ty),* $(,)?) => {
        $(
            impl AsRef<CanonicalId> for $entity {
                fn as_ref(&self) -> &CanonicalId {
                    &self.id
                }
            }
        )*
    };
}

keyed_by_id!(User, Route, Datatype, Field, ContentNode, Media);
