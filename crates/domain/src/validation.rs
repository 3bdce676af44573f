// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{
    DatatypeUpdate, FieldUpdate, MediaUpdate, NewDatatype, NewField, NewMedia, NewRoute, NewUser,
    RouteUpdate, UserUpdate,
};

/// Minimum length accepted for a new user password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validates a route slug.
///
/// A slug must be non-empty and must not contain whitespace.
///
/// # Errors
///
/// Returns `DomainError::InvalidSlug` if the slug is empty or contains
/// whitespace.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if slug.is_empty() || slug.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Validates that a label-like field is not blank.
///
/// # Errors
///
/// Returns `DomainError::InvalidLabel` naming `field` if the value is empty
/// or whitespace only.
pub fn validate_label(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidLabel {
            field,
            reason: String::from("must not be empty"),
        });
    }
    Ok(())
}

/// Validates a username.
///
/// # Errors
///
/// Returns `DomainError::InvalidUsername` if the username is empty or
/// contains whitespace.
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Validates the shape of an e-mail address.
///
/// Only the structure `local@domain` is checked, where the domain contains
/// at least one dot that is neither its first nor its last character.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if the address does not have that shape.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err(invalid());
    }
    Ok(())
}

/// Validates a new plaintext password.
///
/// # Errors
///
/// Returns `DomainError::InvalidPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), DomainError> {
    let length: usize = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(DomainError::InvalidPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters, got {length}"
        )));
    }
    Ok(())
}

/// Validates that optional media dimensions are not negative.
///
/// # Errors
///
/// Returns `DomainError::InvalidDimension` for the first negative value.
pub fn validate_media_dimensions(
    size: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
) -> Result<(), DomainError> {
    for (field, value) in [("size", size), ("width", width), ("height", height)] {
        if let Some(value) = value
            && value < 0
        {
            return Err(DomainError::InvalidDimension { field, value });
        }
    }
    Ok(())
}

/// Validates the parameters for a new user.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_new_user(params: &NewUser) -> Result<(), DomainError> {
    validate_username(&params.username)?;
    validate_label("name", &params.name)?;
    validate_email(&params.email)?;
    validate_password(&params.password)
}

/// Validates the parameters for a user update.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_user_update(params: &UserUpdate) -> Result<(), DomainError> {
    validate_username(&params.username)?;
    validate_label("name", &params.name)?;
    validate_email(&params.email)
}

/// Validates the parameters for a new route.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_new_route(params: &NewRoute) -> Result<(), DomainError> {
    validate_slug(&params.slug)?;
    validate_label("title", &params.title)
}

/// Validates the parameters for a route update.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_route_update(params: &RouteUpdate) -> Result<(), DomainError> {
    validate_slug(&params.slug)?;
    validate_label("title", &params.title)
}

/// Validates the parameters for a new datatype.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_new_datatype(params: &NewDatatype) -> Result<(), DomainError> {
    validate_label("label", &params.label)?;
    validate_label("type", &params.kind)
}

/// Validates the parameters for a datatype update.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_datatype_update(params: &DatatypeUpdate) -> Result<(), DomainError> {
    validate_label("label", &params.label)?;
    validate_label("type", &params.kind)
}

/// Validates the parameters for a new field.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_new_field(params: &NewField) -> Result<(), DomainError> {
    validate_label("label", &params.label)?;
    validate_label("type", &params.kind)
}

/// Validates the parameters for a field update.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_field_update(params: &FieldUpdate) -> Result<(), DomainError> {
    validate_label("label", &params.label)?;
    validate_label("type", &params.kind)
}

/// Validates the parameters for a new media asset.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_new_media(params: &NewMedia) -> Result<(), DomainError> {
    validate_label("name", &params.name)?;
    validate_label("mimetype", &params.mimetype)?;
    validate_label("url", &params.url)?;
    validate_media_dimensions(params.size, params.width, params.height)
}

/// Validates the parameters for a media update.
///
/// # Errors
///
/// Returns the first field validation error encountered.
pub fn validate_media_update(params: &MediaUpdate) -> Result<(), DomainError> {
    validate_label("url", &params.url)?;
    validate_media_dimensions(params.size, params.width, params.height)
}
