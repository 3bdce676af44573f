// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity operation tests against in-memory `SQLite`.

mod content_tests;
mod datatype_tests;
mod field_tests;
mod media_tests;
mod route_tests;
mod user_tests;
