// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity rows for backends that store counters as 32-bit integers.
//!
//! Counters are status codes, sort positions and media sizes/dimensions.
//! Values written through the stores are checked to fit; a value that does
//! not is rejected with `ValueOutOfRange` rather than truncated.

use cmsdb_domain::numeric;

use crate::error::PersistenceError;

fn narrow_checked(value: i64) -> Result<i32, PersistenceError> {
    Ok(numeric::narrow(value)?)
}

super::entity_rows!(int = i32, widen = numeric::widen, store = narrow_checked);
