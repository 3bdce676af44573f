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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod identifier;
pub mod numeric;
mod timestamp;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use identifier::{CANONICAL_ID_LEN, CanonicalId, IdentifierError};
pub use numeric::NumericError;
pub use timestamp::Timestamp;
pub use types::{
    ContentNode, ContentNodeUpdate, Datatype, DatatypeUpdate, Field, FieldUpdate, Media,
    MediaUpdate, NewContentNode, NewDatatype, NewField, NewMedia, NewRoute, NewUser, Role, Route,
    RouteUpdate, User, UserUpdate,
};
pub use validation::{
    MIN_PASSWORD_LENGTH, validate_datatype_update, validate_email, validate_field_update,
    validate_label, validate_media_dimensions, validate_media_update, validate_new_datatype,
    validate_new_field, validate_new_media, validate_new_route, validate_new_user,
    validate_password, validate_route_update, validate_slug, validate_user_update,
    validate_username,
};
