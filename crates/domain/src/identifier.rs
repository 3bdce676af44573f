// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Canonical record identifiers.
//!
//! Every persisted entity and every change event is keyed by a canonical
//! identifier: a 26-character ULID rendered in Crockford base32. The same
//! text is stored by all backends, so identifiers are never reinterpreted as
//! integers and need no width normalization, only validation.
//!
//! Generated identifiers are monotonic within the process: an identifier
//! always sorts after every identifier generated before it, even when both
//! fall in the same millisecond.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, PoisonError};
use thiserror::Error;
use ulid::{Generator, Ulid};

/// Process-wide generator; shared so identifiers from every thread are ordered.
static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Length, in characters, of every canonical identifier.
pub const CANONICAL_ID_LEN: usize = 26;

/// Errors produced when text does not conform to the canonical identifier format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier does not have exactly [`CANONICAL_ID_LEN`] characters.
    #[error(
        "identifier '{value}' has {length} characters, expected {}",
        CANONICAL_ID_LEN
    )]
    InvalidLength { value: String, length: usize },

    /// The identifier has the right length but is not a valid ULID.
    #[error("identifier '{value}' is not a valid ULID: {reason}")]
    InvalidEncoding { value: String, reason: String },
}

/// A validated 26-character canonical identifier.
///
/// The original text is kept as given; parsing never trims or re-cases it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Generates a fresh identifier that sorts after every identifier this
    /// process generated before it.
    #[must_use]
    pub fn generate() -> Self {
        let mut generator = GENERATOR.lock().unwrap_or_else(PoisonError::into_inner);
        // The random part only overflows after 2^80 ids in one millisecond.
        let ulid: Ulid = generator.generate().unwrap_or_else(|_| Ulid::new());
        Self(ulid.to_string())
    }

    /// Parses and validates an identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not exactly 26 characters long or is not
    /// a valid ULID.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let length: usize = value.chars().count();
        if length != CANONICAL_ID_LEN {
            return Err(IdentifierError::InvalidLength {
                value: value.to_string(),
                length,
            });
        }

        Ulid::from_string(value).map_err(|e| IdentifierError::InvalidEncoding {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(value.to_string()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for CanonicalId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CanonicalId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalId> for String {
    fn from(id: CanonicalId) -> Self {
        id.0
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
