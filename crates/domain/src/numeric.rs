// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Integer width normalization between backends.
//!
//! `SQLite` stores counters and sizes as 64-bit integers while `MySQL` and
//! `PostgreSQL` store them as 32-bit integers. Domain types always carry
//! `i64`. Every conversion across that boundary goes through this module.
//!
//! - Widening (`i32` to `i64`) is lossless for the whole `i32` range.
//! - Narrowing (`i64` to `i32`) is checked. Callers must only narrow values
//!   whose domain guarantees they fit and should say so at the call site.
//! - [`narrow_truncating`] exists for the rare caller that wants the raw
//!   low 32 bits; its behavior is fixed and covered by tests.

use num_traits::ToPrimitive;
use thiserror::Error;

/// Errors produced by checked narrowing.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum NumericError {
    /// The value does not fit in a 32-bit signed integer.
    #[error("value {value} does not fit in a 32-bit integer")]
    OutOfRange { value: i64 },
}

/// Widens a 32-bit value to 64 bits.
#[must_use]
pub fn widen(value: i32) -> i64 {
    i64::from(value)
}

/// Widens an optional 32-bit value to 64 bits.
#[must_use]
pub fn widen_opt(value: Option<i32>) -> Option<i64> {
    value.map(widen)
}

/// Narrows a 64-bit value to 32 bits.
///
/// # Errors
///
/// Returns [`NumericError::OutOfRange`] if the value is outside the `i32` range.
pub fn narrow(value: i64) -> Result<i32, NumericError> {
    value.to_i32().ok_or(NumericError::OutOfRange { value })
}

/// Narrows an optional 64-bit value to 32 bits.
///
/// `None` stays `None`.
///
/// # Errors
///
/// Returns [`NumericError::OutOfRange`] if a present value is outside the `i32` range.
pub fn narrow_opt(value: Option<i64>) -> Result<Option<i32>, NumericError> {
    value.map(narrow).transpose()
}

/// Narrows a 64-bit value to 32 bits by keeping its low 32 bits.
///
/// The result is the two's complement reinterpretation of the low word:
/// `2^31` becomes `i32::MIN`, `2^32` becomes `0`, `-1` stays `-1`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn narrow_truncating(value: i64) -> i32 {
    value as i32
}
