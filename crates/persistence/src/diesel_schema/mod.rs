// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel table definitions, one module per backend.
//!
//! The modules declare the same tables and columns. They differ only where
//! the migrations do:
//!
//! - counters and sizes are `BigInt` on `SQLite` and `Integer` elsewhere
//! - change-log snapshots are `Text` except on `PostgreSQL` (`Jsonb`)
//! - the change-log timestamp is `Text` on `SQLite`, `Datetime` on `MySQL`
//!   and `Timestamptz` on `PostgreSQL`

pub mod mysql;
pub mod postgres;
pub mod sqlite;
