// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::DomainError;

/// Fixed-width UTC text form used wherever a backend stores timestamps as text.
///
/// Six fractional digits keep the text lexically sortable.
const STORAGE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// A UTC instant truncated to microsecond precision.
///
/// Microseconds are the finest precision every supported backend keeps, so
/// values survive a round trip through any of them unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Normalizes a datetime to UTC with microsecond precision.
    #[must_use]
    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        let utc: OffsetDateTime = datetime.to_offset(UtcOffset::UTC);
        let excess_nanos: u32 = utc.nanosecond() % 1_000;
        Self(utc - Duration::nanoseconds(i64::from(excess_nanos)))
    }

    /// Interprets a timezone-less datetime as UTC.
    #[must_use]
    pub fn from_primitive_utc(datetime: PrimitiveDateTime) -> Self {
        Self::from_datetime(datetime.assume_utc())
    }

    /// Parses the fixed-width storage text form.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not in the storage format.
    pub fn parse_storage(value: &str) -> Result<Self, DomainError> {
        PrimitiveDateTime::parse(value, STORAGE_FORMAT)
            .map(Self::from_primitive_utc)
            .map_err(|e| DomainError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    /// Renders the fixed-width storage text form.
    ///
    /// # Errors
    ///
    /// Returns an error if the year cannot be rendered with four digits.
    pub fn to_storage_string(&self) -> Result<String, DomainError> {
        self.0
            .format(STORAGE_FORMAT)
            .map_err(|e| DomainError::InvalidTimestamp {
                value: self.0.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the underlying UTC datetime.
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the UTC wall-clock time without an offset.
    #[must_use]
    pub const fn to_primitive_utc(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.0.date(), self.0.time())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_storage_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text: String = self
            .to_storage_string()
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text: String = String::deserialize(deserializer)?;
        Self::parse_storage(&text).map_err(serde::de::Error::custom)
    }
}
