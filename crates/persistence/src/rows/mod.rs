// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend row types and their mapping to domain types.
//!
//! Each backend module exposes the same row type names so that store code
//! written once against `rows::RouteRow` compiles for every backend. The
//! entity rows differ only in integer width:
//!
//! - `sqlite` rows hold `i64` counters, matching the domain exactly
//! - `mysql` and `postgres` share the `i32` rows in `narrow`; counters are
//!   widened on read and narrowed with a range check on write
//!
//! Identifiers and timestamps are stored as text on every backend and are
//! validated when a row is mapped back to a domain value.

use cmsdb_domain::{CanonicalId, Timestamp};

use crate::error::PersistenceError;

/// Generates the entity row types for one integer width.
///
/// `$widen` maps a stored counter to `i64`; `$store` maps an `i64` counter
/// to the stored width and fails if it does not fit.
macro_rules! entity_rows {
    (int = $int:ty, widen = $widen:path, store = $store:path) => {
        /// Converts a domain counter to the stored width.
        ///
        /// # Errors
        ///
        /// Returns `ValueOutOfRange` if the value does not fit the column.
        pub fn store_int(value: i64) -> Result<$int, $crate::error::PersistenceError> {
            $store(value)
        }

        /// Converts an optional domain counter to the stored width.
        ///
        /// # Errors
        ///
        /// Returns `ValueOutOfRange` if a present value does not fit the column.
        pub fn store_opt_int(value: Option<i64>) -> Result<Option<$int>, $crate::error::PersistenceError> {
            value.map(store_int).transpose()
        }

        fn load_opt_int(value: Option<$int>) -> Option<i64> {
            value.map($widen)
        }

        /// A `users` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct UserRow {
            pub id: String,
            pub username: String,
            pub name: String,
            pub email: String,
            pub role: String,
            pub password_hash: String,
            pub is_active: bool,
            pub created_at: String,
            pub updated_at: String,
        }

        impl UserRow {
            /// Maps the row to a [`cmsdb_domain::User`], dropping the password hash.
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier, role or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::User, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::User {
                    id: $crate::rows::parse_id(&self.id)?,
                    username: self.username,
                    name: self.name,
                    email: self.email,
                    role: self.role.parse::<cmsdb_domain::Role>()?,
                    is_active: self.is_active,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// A `routes` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct RouteRow {
            pub id: String,
            pub slug: String,
            pub title: String,
            pub status: $int,
            pub author_id: Option<String>,
            pub created_at: String,
            pub updated_at: String,
        }

        impl RouteRow {
            /// Maps the row to a [`cmsdb_domain::Route`].
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::Route, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::Route {
                    id: $crate::rows::parse_id(&self.id)?,
                    slug: self.slug,
                    title: self.title,
                    status: $widen(self.status),
                    author_id: $crate::rows::parse_opt_id(self.author_id)?,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// A `datatypes` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct DatatypeRow {
            pub id: String,
            pub parent_id: Option<String>,
            pub label: String,
            pub kind: String,
            pub author_id: Option<String>,
            pub created_at: String,
            pub updated_at: String,
        }

        impl DatatypeRow {
            /// Maps the row to a [`cmsdb_domain::Datatype`].
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::Datatype, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::Datatype {
                    id: $crate::rows::parse_id(&self.id)?,
                    parent_id: $crate::rows::parse_opt_id(self.parent_id)?,
                    label: self.label,
                    kind: self.kind,
                    author_id: $crate::rows::parse_opt_id(self.author_id)?,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// A `fields` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct FieldRow {
            pub id: String,
            pub datatype_id: String,
            pub label: String,
            pub kind: String,
            pub data: String,
            pub sort_order: $int,
            pub author_id: Option<String>,
            pub created_at: String,
            pub updated_at: String,
        }

        impl FieldRow {
            /// Maps the row to a [`cmsdb_domain::Field`].
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::Field, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::Field {
                    id: $crate::rows::parse_id(&self.id)?,
                    datatype_id: $crate::rows::parse_id(&self.datatype_id)?,
                    label: self.label,
                    kind: self.kind,
                    data: self.data,
                    sort_order: $widen(self.sort_order),
                    author_id: $crate::rows::parse_opt_id(self.author_id)?,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// A `content_data` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct ContentRow {
            pub id: String,
            pub route_id: String,
            pub datatype_id: String,
            pub parent_id: Option<String>,
            pub first_child_id: Option<String>,
            pub next_sibling_id: Option<String>,
            pub prev_sibling_id: Option<String>,
            pub status: $int,
            pub author_id: Option<String>,
            pub created_at: String,
            pub updated_at: String,
        }

        impl ContentRow {
            /// Maps the row to a [`cmsdb_domain::ContentNode`].
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::ContentNode, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::ContentNode {
                    id: $crate::rows::parse_id(&self.id)?,
                    route_id: $crate::rows::parse_id(&self.route_id)?,
                    datatype_id: $crate::rows::parse_id(&self.datatype_id)?,
                    parent_id: $crate::rows::parse_opt_id(self.parent_id)?,
                    first_child_id: $crate::rows::parse_opt_id(self.first_child_id)?,
                    next_sibling_id: $crate::rows::parse_opt_id(self.next_sibling_id)?,
                    prev_sibling_id: $crate::rows::parse_opt_id(self.prev_sibling_id)?,
                    status: $widen(self.status),
                    author_id: $crate::rows::parse_opt_id(self.author_id)?,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// A `media` row.
        #[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable)]
        pub struct MediaRow {
            pub id: String,
            pub name: String,
            pub display_name: Option<String>,
            pub mimetype: String,
            pub url: String,
            pub size: Option<$int>,
            pub width: Option<$int>,
            pub height: Option<$int>,
            pub author_id: Option<String>,
            pub created_at: String,
            pub updated_at: String,
        }

        impl MediaRow {
            /// Maps the row to a [`cmsdb_domain::Media`].
            ///
            /// # Errors
            ///
            /// Returns an error if a stored identifier or timestamp is malformed.
            pub fn into_domain(self) -> Result<cmsdb_domain::Media, $crate::error::PersistenceError> {
                Ok(cmsdb_domain::Media {
                    id: $crate::rows::parse_id(&self.id)?,
                    name: self.name,
                    display_name: self.display_name,
                    mimetype: self.mimetype,
                    url: self.url,
                    size: load_opt_int(self.size),
                    width: load_opt_int(self.width),
                    height: load_opt_int(self.height),
                    author_id: $crate::rows::parse_opt_id(self.author_id)?,
                    created_at: $crate::rows::parse_timestamp(&self.created_at)?,
                    updated_at: $crate::rows::parse_timestamp(&self.updated_at)?,
                })
            }
        }

        /// Renders an optional identifier for an optional text column.
        #[must_use]
        pub fn opt_id(id: Option<&cmsdb_domain::CanonicalId>) -> Option<&str> {
            id.map(cmsdb_domain::CanonicalId::as_str)
        }
    };
}

pub(crate) use entity_rows;

mod narrow;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

/// Parses a stored identifier.
///
/// # Errors
///
/// Returns `InvalidIdentifier` if the stored text is not canonical.
pub fn parse_id(value: &str) -> Result<CanonicalId, PersistenceError> {
    Ok(CanonicalId::parse(value)?)
}

/// Parses an optional stored identifier.
///
/// # Errors
///
/// Returns `InvalidIdentifier` if a present value is not canonical.
pub fn parse_opt_id(value: Option<String>) -> Result<Option<CanonicalId>, PersistenceError> {
    value.as_deref().map(parse_id).transpose()
}

/// Parses a stored entity timestamp.
///
/// # Errors
///
/// Returns an error if the text is not in the storage format.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, PersistenceError> {
    Ok(Timestamp::parse_storage(value)?)
}

/// Returns the current time in the entity timestamp storage format.
///
/// # Errors
///
/// Returns an error if the clock is outside the representable range.
pub fn now_text() -> Result<String, PersistenceError> {
    Ok(Timestamp::now().to_storage_string()?)
}
