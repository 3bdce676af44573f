// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Route slug is empty or contains whitespace.
    InvalidSlug(String),
    /// A label or title is empty.
    InvalidLabel {
        /// The field that failed validation.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// Username is empty or contains whitespace.
    InvalidUsername(String),
    /// Email address is not of the form `local@domain`.
    InvalidEmail(String),
    /// Role name is not one of the known roles.
    InvalidRole(String),
    /// Password does not meet the minimum requirements.
    InvalidPassword(String),
    /// A media dimension or size is negative.
    InvalidDimension {
        /// The field that failed validation.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },
    /// A stored timestamp could not be parsed or rendered.
    InvalidTimestamp {
        /// The offending value.
        value: String,
        /// The parse or format error.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSlug(slug) => write!(f, "Invalid slug: '{slug}'"),
            Self::InvalidLabel { field, reason } => write!(f, "Invalid {field}: {reason}"),
            Self::InvalidUsername(name) => write!(f, "Invalid username: '{name}'"),
            Self::InvalidEmail(email) => write!(f, "Invalid email: '{email}'"),
            Self::InvalidRole(role) => write!(f, "Invalid role: '{role}'"),
            Self::InvalidPassword(reason) => write!(f, "Invalid password: {reason}"),
            Self::InvalidDimension { field, value } => {
                write!(f, "Invalid {field}: {value} must not be negative")
            }
            Self::InvalidTimestamp { value, reason } => {
                write!(f, "Invalid timestamp '{value}': {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
